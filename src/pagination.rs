//! Splitting long lists into pages and rendering the page links.

use maud::{Markup, html};
use serde::Deserialize;

use crate::html::LINK_STYLE;

/// The largest page size a request may ask for.
const MAX_PAGE_SIZE: u64 = 100;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
        }
    }
}

/// The page requested in the query string.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// The page number to display. Starts from 1.
    pub page: Option<u64>,
    /// The maximum number of rows to display per page.
    pub per_page: Option<u64>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    /// Fill in missing values from `config` and clamp the page size to
    /// `1..=100` and the page number to at least 1.
    pub fn from_query(query: PageQuery, config: &PaginationConfig) -> Self {
        Self {
            number: query.page.unwrap_or(config.default_page).max(1),
            size: query
                .per_page
                .unwrap_or(config.default_page_size)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The number of rows to skip to reach this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    /// The number of pages needed to show `row_count` rows, at least one.
    pub fn count(&self, row_count: u64) -> u64 {
        row_count.div_ceil(self.size).max(1)
    }
}

/// One entry of the pagination links.
#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// Choose which page links to show around `curr_page`.
///
/// A window of about `max_pages` numbered pages is centred on the current
/// page, the first and last pages are added with an ellipsis when the window
/// does not reach them, and "Back" and "Next" buttons are added when there is
/// a page to go to.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let half = max_pages / 2;
    let is_windowed = page_count > max_pages;

    let window = if !is_windowed {
        1..=page_count
    } else if curr_page <= half {
        1..=max_pages
    } else if curr_page > page_count - half {
        (page_count - max_pages + 1)..=page_count
    } else {
        (curr_page - half)..=(curr_page + half)
    };

    let mut indicators = Vec::new();

    if curr_page > 1 {
        indicators.push(PaginationIndicator::BackButton(curr_page - 1));
    }

    if is_windowed && curr_page > half + 1 {
        indicators.push(PaginationIndicator::Page(1));
        indicators.push(PaginationIndicator::Ellipsis);
    }

    indicators.extend(window.map(|page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    }));

    if is_windowed && curr_page < page_count - half {
        indicators.push(PaginationIndicator::Ellipsis);
        indicators.push(PaginationIndicator::Page(page_count));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render the pagination links, `page_url` gives the link for a page number.
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    html! {
        nav aria-label="Pagination" class="flex justify-center w-full mt-4"
        {
            ul class="flex items-center gap-3 text-sm" data-pagination="true"
            {
                @for indicator in indicators {
                    li
                    {
                        @match indicator {
                            PaginationIndicator::Page(page) => {
                                a href=(page_url(*page)) class=(LINK_STYLE) { (page) }
                            }
                            PaginationIndicator::CurrPage(page) => {
                                span aria-current="page" class="font-bold" { (page) }
                            }
                            PaginationIndicator::Ellipsis => {
                                span { "..." }
                            }
                            PaginationIndicator::BackButton(page) => {
                                a href=(page_url(*page)) class=(LINK_STYLE) { "Back" }
                            }
                            PaginationIndicator::NextButton(page) => {
                                a href=(page_url(*page)) class=(LINK_STYLE) { "Next" }
                            }
                        }
                    }
                }
            }
        }
    }
}
