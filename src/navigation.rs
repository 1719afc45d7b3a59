//! The navigation bar shown at the top of every page, and along the bottom on small screens.

use maud::{Markup, html};

use crate::endpoints;

/// Whether a page is part of day-to-day tracking or of the app's settings.
///
/// Settings pages sit behind the "More" menu on small screens.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Tracking,
    Settings,
}

struct Link<'a> {
    url: &'a str,
    title: &'a str,
    section: Section,
    is_current: bool,
}

const DESKTOP_LINK_STYLE: &str = "block py-2 px-3 rounded-sm lg:p-0 text-gray-900 \
    hover:bg-gray-100 lg:hover:bg-transparent lg:hover:text-amber-600 \
    dark:text-white dark:hover:bg-gray-700 lg:dark:hover:text-amber-400";
const DESKTOP_CURRENT_STYLE: &str = "block py-2 px-3 rounded-sm lg:p-0 text-white \
    bg-amber-600 lg:bg-transparent lg:text-amber-600 lg:dark:text-amber-400";
const TAB_STYLE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2 py-2 text-xs font-semibold text-gray-600 sm:text-sm \
    hover:text-amber-700 dark:text-gray-300 dark:hover:text-amber-300";
const TAB_CURRENT_STYLE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2 py-2 text-xs font-semibold sm:text-sm bg-amber-50 text-amber-700 \
    dark:bg-amber-900/30 dark:text-amber-200";
const MENU_ITEM_STYLE: &str = "block rounded-lg px-3 py-2 text-gray-700 hover:bg-gray-100 \
    dark:text-gray-200 dark:hover:bg-gray-800";
const MENU_ITEM_CURRENT_STYLE: &str = "block rounded-lg px-3 py-2 bg-amber-50 text-amber-700 \
    dark:bg-amber-900/30 dark:text-amber-200";

/// The app's navigation links with the current page highlighted.
pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Create the navigation bar for the page at `active_endpoint`.
    ///
    /// Only the link whose URL equals `active_endpoint` is marked as current.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let link = |url, title, section| Link {
            url,
            title,
            section,
            is_current: active_endpoint == url,
        };

        NavBar {
            links: vec![
                link(endpoints::HOME_VIEW, "Home", Section::Tracking),
                link(endpoints::PETS_VIEW, "Pets", Section::Tracking),
                link(endpoints::EXPENSES_VIEW, "Expenses", Section::Tracking),
                link(endpoints::ANALYTICS_VIEW, "Analytics", Section::Settings),
                link(endpoints::CATEGORIES_VIEW, "Categories", Section::Settings),
                link(endpoints::RATES_VIEW, "Rates", Section::Settings),
                Link {
                    url: endpoints::LOG_OUT,
                    title: "Log out",
                    section: Section::Settings,
                    is_current: false,
                },
            ],
        }
    }

    /// Render the desktop bar and the mobile tab bar.
    pub fn into_html(self) -> Markup {
        let in_section = |section| self.links.iter().filter(move |link| link.section == section);
        let settings_is_current = in_section(Section::Settings).any(|link| link.is_current);

        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900" {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4" {
                    a
                        href=(endpoints::HOME_VIEW)
                        class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                    {
                        "Pet Cost Tracker"
                    }

                    ul
                        class="hidden lg:flex font-medium flex-row space-x-8
                        rtl:space-x-reverse dark:bg-gray-900"
                    {
                        @for link in &self.links {
                            li {
                                a
                                    href=(link.url)
                                    class=(if link.is_current { DESKTOP_CURRENT_STYLE } else { DESKTOP_LINK_STYLE })
                                    aria-current=[link.is_current.then_some("page")]
                                {
                                    (link.title)
                                }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden" {
                ul
                    class="mx-4 mb-4 grid grid-cols-4 gap-2 px-3 py-3 rounded-xl border
                    border-gray-200 bg-white/95 shadow-lg backdrop-blur
                    dark:border-gray-700 dark:bg-gray-900/95"
                    aria-label="Primary"
                {
                    @for link in in_section(Section::Tracking) {
                        li class="min-w-0" {
                            a
                                href=(link.url)
                                class=(if link.is_current { TAB_CURRENT_STYLE } else { TAB_STYLE })
                                aria-current=[link.is_current.then_some("page")]
                            {
                                span class="truncate" { (link.title) }
                            }
                        }
                    }

                    li class="min-w-0" {
                        details class="relative" {
                            summary
                                class=(format!(
                                    "list-none cursor-pointer {}",
                                    if settings_is_current { TAB_CURRENT_STYLE } else { TAB_STYLE }
                                ))
                                aria-current=[settings_is_current.then_some("page")]
                            {
                                span class="truncate" { "More" }
                            }

                            ul
                                class="absolute bottom-full right-0 mb-3 w-40 p-2 flex flex-col
                                gap-1 text-sm font-medium rounded-xl border border-gray-200
                                bg-white shadow-xl dark:border-gray-700 dark:bg-gray-900"
                            {
                                @for link in in_section(Section::Settings) {
                                    li {
                                        a
                                            href=(link.url)
                                            class=(if link.is_current { MENU_ITEM_CURRENT_STYLE } else { MENU_ITEM_STYLE })
                                            aria-current=[link.is_current.then_some("page")]
                                        {
                                            (link.title)
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn marks_only_the_active_page() {
        let pages = [
            endpoints::HOME_VIEW,
            endpoints::PETS_VIEW,
            endpoints::EXPENSES_VIEW,
            endpoints::ANALYTICS_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::RATES_VIEW,
        ];

        for page in pages {
            let nav_bar = NavBar::new(page);

            for link in &nav_bar.links {
                assert_eq!(
                    link.is_current,
                    link.url == page,
                    "link for {} on page {page}",
                    link.url
                );
            }
        }
    }

    #[test]
    fn pages_outside_the_bar_mark_nothing() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::LOG_IN_VIEW,
            endpoints::LOG_OUT,
            endpoints::REGISTER_VIEW,
            endpoints::PETS_API,
        ] {
            let nav_bar = NavBar::new(endpoint);

            assert!(
                nav_bar.links.iter().all(|link| !link.is_current),
                "no link should be current on {endpoint}"
            );
        }
    }

    #[test]
    fn settings_page_highlights_more_menu() {
        let markup = NavBar::new(endpoints::RATES_VIEW).into_html().into_string();
        let html = Html::parse_fragment(&markup);

        let summary = html
            .select(&Selector::parse("summary").unwrap())
            .next()
            .expect("mobile menu should have a More summary");
        assert_eq!(summary.value().attr("aria-current"), Some("page"));
    }
}
