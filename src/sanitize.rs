use tracing::debug;
use url::Url;

use crate::config::PathsConfig;

/// Markers whose presence in a query or fragment means the address is
/// leaking provider tokens.
const SENSITIVE_MARKERS: [&str; 2] = ["access_token", "refresh_token"];

fn has_sensitive_marker(part: Option<&str>) -> bool {
    part.map(|p| SENSITIVE_MARKERS.iter().any(|marker| p.contains(marker)))
        .unwrap_or(false)
}

fn is_callback_path(path: &str, callback_path: &str) -> bool {
    path == callback_path || path.starts_with(&format!("{}/", callback_path))
}

/// Inspect the current address for leaked token fragments.
///
/// Returns the replacement address when a rewrite is needed, `None` when
/// the address is already clean. On the callback path the whole address is
/// replaced with the landing path; anywhere else the query and fragment
/// are stripped and the path preserved. The result never contains a
/// marker, so applying this twice equals applying it once. Callers hand
/// the result to `Navigator::replace_address`, an in-place history
/// replacement; no navigation or reload happens here.
pub fn sanitize_if_needed(current: &str, paths: &PathsConfig) -> Option<String> {
    // Relative addresses are resolved against a fixed dummy origin; only
    // path, query and fragment matter here.
    let base = Url::parse("http://localhost/").expect("static base URL is valid");
    let parsed = match base.join(current) {
        Ok(parsed) => parsed,
        Err(_) => return None,
    };

    let leaking =
        has_sensitive_marker(parsed.query()) || has_sensitive_marker(parsed.fragment());
    if !leaking {
        return None;
    }

    let clean = if is_callback_path(parsed.path(), &paths.callback_path) {
        paths.landing_path.clone()
    } else {
        parsed.path().to_string()
    };

    debug!("Address leaks a token marker, rewriting to '{}'", clean);
    Some(clean)
}
