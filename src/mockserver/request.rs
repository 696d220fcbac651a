//! Requests recorded by a mock endpoint.

use crate::utils::error::MockServerError;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

/// One inbound request, as received
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedRequest {
    pub method: String,

    /// Path without the query string
    pub path: String,

    /// Raw query string, without the leading `?`
    pub query: String,

    pub body: String,
}

impl RecordedRequest {
    /// Split a request target (`/path?query`) into its parts
    pub fn new(method: impl Into<String>, target: &str, body: impl Into<String>) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        Self {
            method: method.into(),
            path: path.to_string(),
            query: query.to_string(),
            body: body.into(),
        }
    }

    /// Decoded query parameters, in order
    pub fn query_params(&self) -> Vec<(String, String)> {
        form_urlencoded::parse(self.query.as_bytes())
            .into_owned()
            .collect()
    }

    /// First value of a parameter
    ///
    /// Looks in the query string, then in a form-encoded body.
    pub fn first_param(&self, name: &str) -> Option<String> {
        let lookup = |raw: &str| {
            form_urlencoded::parse(raw.as_bytes())
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        lookup(&self.query).or_else(|| lookup(&self.body))
    }

    /// First value of a parameter, decoded as JSON
    ///
    /// **Public** - reports carry their signals as a JSON-encoded parameter
    ///
    /// # Errors
    /// * `MockServerError::MissingParam` - No such parameter
    /// * `MockServerError::InvalidJson` - Value is not valid JSON
    pub fn get_first_json_param(&self, name: &str) -> Result<Value, MockServerError> {
        let raw = self
            .first_param(name)
            .ok_or_else(|| MockServerError::MissingParam(name.to_string()))?;

        serde_json::from_str(&raw).map_err(|source| MockServerError::InvalidJson {
            name: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_target() {
        let request = RecordedRequest::new("GET", "/reportWin?a=1&b=2", "");
        assert_eq!(request.path, "/reportWin");
        assert_eq!(request.query, "a=1&b=2");

        let bare = RecordedRequest::new("GET", "/", "");
        assert_eq!(bare.path, "/");
        assert_eq!(bare.query, "");
    }

    #[test]
    fn test_first_param_prefers_query() {
        let request = RecordedRequest::new("POST", "/r?x=query", "x=body&y=only-body");
        assert_eq!(request.first_param("x").as_deref(), Some("query"));
        assert_eq!(request.first_param("y").as_deref(), Some("only-body"));
        assert_eq!(request.first_param("z"), None);
    }

    #[test]
    fn test_get_first_json_param() {
        let request = RecordedRequest::new(
            "GET",
            "/reportWin?signals=%7B%22browserSignals%22%3A%7B%22bid%22%3A101%7D%7D&signals=%7B%7D",
            "",
        );
        let signals = request.get_first_json_param("signals").unwrap();
        assert_eq!(signals["browserSignals"]["bid"], 101);
    }

    #[test]
    fn test_get_first_json_param_errors() {
        let request = RecordedRequest::new("GET", "/reportWin?signals=not-json", "");
        assert!(matches!(
            request.get_first_json_param("signals"),
            Err(MockServerError::InvalidJson { .. })
        ));
        assert!(matches!(
            request.get_first_json_param("other"),
            Err(MockServerError::MissingParam(_))
        ));
    }
}
