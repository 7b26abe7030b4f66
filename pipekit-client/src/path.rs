//! Request path construction
//!
//! An [`ApiPath`] pairs a [`Route`] with a logical path whose leading segment
//! is the route's prefix. Placeholder values are percent-escaped one segment
//! at a time before substitution, so identifiers can never introduce extra
//! path segments. Values of `.` and `..` are rejected outright: URL parsing
//! resolves them, and their percent-encoded forms, as dot segments.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use pipekit_core::Route;

use crate::error::{ClientError, Result};

/// Everything except RFC 3986 unreserved characters
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A routed logical path, relative to the route's base URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    route: Route,
    path: String,
}

impl ApiPath {
    /// Expands `template` under `route`'s prefix
    ///
    /// Placeholders are written `{name}` and looked up in `values`. Every
    /// value must be non-empty and must not be a dot segment. Unknown
    /// placeholders are an error.
    ///
    /// ```
    /// use pipekit_client::ApiPath;
    /// use pipekit_core::Route;
    ///
    /// let path = ApiPath::new(
    ///     Route::InCluster,
    ///     "v1/users/{user}/pipes/{pipe}/runs",
    ///     &[("user", "a b"), ("pipe", "c/d")],
    /// )
    /// .unwrap();
    /// assert_eq!(path.as_str(), "plumbing/v1/users/a%20b/pipes/c%2Fd/runs");
    /// ```
    pub fn new(route: Route, template: &str, values: &[(&str, &str)]) -> Result<Self> {
        let expanded = expand_template(template, values)?;
        let path = format!("{}/{}", route.prefix(), expanded.trim_start_matches('/'));
        Ok(Self { route, path })
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Display for ApiPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Percent-escapes a single path segment value
///
/// Unreserved characters, `.` included, pass through unchanged.
pub fn escape_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

fn expand_template(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| ClientError::InvalidPath(format!("unclosed placeholder in {}", template)))?;
        let name = &after[..end];

        let value = values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| ClientError::InvalidPath(format!("no value for {{{}}}", name)))?;

        match value {
            "" => {
                return Err(ClientError::InvalidPath(format!("{} must not be empty", name)));
            }
            "." | ".." => {
                return Err(ClientError::InvalidPath(format!(
                    "{} must not be a dot segment, got {:?}",
                    name, value
                )));
            }
            _ => {}
        }

        out.push_str(&escape_segment(value));
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::percent_decode_str;

    #[test]
    fn test_route_prefix_leads_path() {
        let hosted = ApiPath::new(Route::Hosted, "v1/users/{u}", &[("u", "x")]).unwrap();
        assert_eq!(hosted.as_str(), "events-handler/v1/users/x");
        assert_eq!(hosted.route(), Route::Hosted);

        let cluster = ApiPath::new(Route::InCluster, "/v1/users/{u}", &[("u", "x")]).unwrap();
        assert_eq!(cluster.as_str(), "plumbing/v1/users/x");
    }

    #[test]
    fn test_escaping_round_trips() {
        for raw in ["a b", "c/d", "ü?#%", "plumbing", "name.with-dots_~"] {
            let escaped = escape_segment(raw);
            assert!(!escaped.contains('/'));
            let decoded = percent_decode_str(&escaped).decode_utf8().unwrap();
            assert_eq!(decoded, raw);
        }
        assert_eq!(escape_segment("a b"), "a%20b");
        assert_eq!(escape_segment("c/d"), "c%2Fd");
    }

    #[test]
    fn test_dot_segment_values_rejected() {
        for dots in [".", ".."] {
            let err = ApiPath::new(Route::InCluster, "v1/runs/{run}", &[("run", dots)]).unwrap_err();
            assert!(matches!(err, ClientError::InvalidPath(msg) if msg.contains("run")));
        }

        let path = ApiPath::new(Route::InCluster, "v1/runs/{run}", &[("run", "..a")]).unwrap();
        assert_eq!(path.as_str(), "plumbing/v1/runs/..a");
    }

    #[test]
    fn test_marker_in_identifier_does_not_change_route() {
        let path = ApiPath::new(Route::Hosted, "v1/users/{u}", &[("u", "plumbing")]).unwrap();
        assert_eq!(path.route(), Route::Hosted);
        assert!(path.as_str().starts_with("events-handler/"));
    }

    #[test]
    fn test_empty_value_rejected() {
        let err = ApiPath::new(Route::Hosted, "v1/users/{user}", &[("user", "")]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidPath(msg) if msg.contains("user")));
    }

    #[test]
    fn test_unbound_and_unclosed_placeholders_rejected() {
        assert!(ApiPath::new(Route::Hosted, "v1/{missing}", &[]).is_err());
        assert!(ApiPath::new(Route::Hosted, "v1/{open", &[("open", "x")]).is_err());
    }
}
