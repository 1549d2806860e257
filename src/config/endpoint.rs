//! Push endpoint resolution.
//!
//! Resolution order: explicit config value, `NEXT_PUBLIC_WS_URL`,
//! `NEXT_PUBLIC_API_URL` with its `/api` suffix stripped, then the local
//! development server.

/// Dedicated push endpoint variable.
pub const WS_URL_VAR: &str = "NEXT_PUBLIC_WS_URL";
/// REST API base variable; the push server shares its origin.
pub const API_URL_VAR: &str = "NEXT_PUBLIC_API_URL";
/// Fallback for local development.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001";

/// Resolve the push endpoint.
///
/// `lookup` reads a variable (normally `std::env::var(..).ok()`); blank
/// values are treated as unset.
pub fn resolve_endpoint<F>(configured: Option<&str>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    if let Some(url) = configured.filter(|u| !u.trim().is_empty()) {
        return url.trim().to_string();
    }
    if let Some(url) = non_blank(lookup(WS_URL_VAR)) {
        return url.trim().to_string();
    }
    if let Some(api) = non_blank(lookup(API_URL_VAR)) {
        return strip_api_suffix(api.trim());
    }
    DEFAULT_ENDPOINT.to_string()
}

/// Resolve the push endpoint from the process environment.
pub fn resolve_endpoint_from_env(configured: Option<&str>) -> String {
    resolve_endpoint(configured, |var| std::env::var(var).ok())
}

fn strip_api_suffix(api: &str) -> String {
    let trimmed = api.trim_end_matches('/');
    trimmed
        .strip_suffix("/api")
        .unwrap_or(trimmed)
        .to_string()
}
