//! Synthesized responses for when neither network nor cache can answer.

use serde_json::json;
use url::Url;

use crate::request::Response;

/// Machine-readable error kind in the offline API body.
pub const OFFLINE_ERROR_KIND: &str = "offline";

fn no_store(mut response: Response) -> Response {
    response.headers.push(("cache-control".into(), "no-store".into()));
    response
}

/// 503 JSON answer for an API read that could not reach the network.
///
/// Lets the application tell "no live data" apart from stale data.
pub fn offline_api_error(url: &Url) -> Response {
    no_store(Response::json(
        503,
        &json!({
            "error": OFFLINE_ERROR_KIND,
            "message": "Keine Internetverbindung: aktuelle Daten sind gerade nicht abrufbar.",
            "path": url.path(),
        }),
    ))
}

/// Minimal page for a failed navigation when not even the offline page exists.
pub fn offline_navigation() -> Response {
    no_store(Response::text(503, "Offline: diese Seite ist ohne Internetverbindung nicht verfügbar."))
}

/// Empty 503 for a static asset that is neither cached nor reachable.
pub fn asset_unavailable() -> Response {
    no_store(Response::empty(503))
}

/// Empty 200 for an excluded host, so tile loads fail quietly.
pub fn suppressed() -> Response {
    no_store(Response::empty(200))
}
