//! Where to send the user after they log in.
//!
//! Only same-origin paths are accepted so that the log-in form cannot be
//! abused as an open redirect.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

fn is_local_path(target: &str) -> bool {
    if !target.starts_with('/') || target.starts_with("//") || target.contains('\\') {
        return false;
    }

    let path = target.split_once('?').map_or(target, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && path != endpoints::LOG_OUT
}

/// Reduce `raw_url` to a path and query if it is a safe place to redirect to.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let target = uri.path_and_query()?.as_str();
    is_local_path(target).then(|| target.to_owned())
}

/// The log-in page URL that will send the user back to `target` afterwards.
pub(super) fn build_log_in_redirect_url_from_target(target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", target)]) {
        Ok(query) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, query)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            None
        }
    }
}

/// The log-in page URL for an unauthenticated `request`.
///
/// Page requests come back to the requested page. API requests are made by
/// HTMX from some page, so they come back to the page in `HX-Current-URL`.
pub(super) fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let target = if request.uri().path().starts_with("/api") {
        target_from_htmx_headers(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&target)
}

fn target_from_htmx_headers(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_htmx = headers
        .get("hx-request")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));

    if !is_htmx {
        tracing::warn!("API request to {} without HX-Request", request.uri());
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|value| value.to_str().ok())?;

    // HX-Current-URL is absolute, so keep only the path and query.
    let target = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
        .filter(|target| is_local_path(target));

    if target.is_none() {
        tracing::warn!("Ignoring HX-Current-URL {current_url}");
    }

    target
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn keeps_local_path_and_query() {
        assert_eq!(
            normalize_redirect_url("/expenses?page=2"),
            Some("/expenses?page=2".to_owned())
        );
    }

    #[test]
    fn rejects_other_origins() {
        assert_eq!(normalize_redirect_url("https://evil.example/pets"), None);
        assert_eq!(normalize_redirect_url("//evil.example/pets"), None);
        assert_eq!(normalize_redirect_url("pets"), None);
    }

    #[test]
    fn rejects_log_in_loop() {
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
        assert_eq!(normalize_redirect_url(endpoints::LOG_OUT), None);
    }

    #[test]
    fn api_request_uses_current_page() {
        let request = Request::builder()
            .uri("/api/pets/1")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/pets/1")
            .body(Body::empty())
            .unwrap();

        let url = build_log_in_redirect_url(&request).unwrap();

        assert_eq!(url, format!("{}?redirect_url=%2Fpets%2F1", endpoints::LOG_IN_VIEW));
    }
}
