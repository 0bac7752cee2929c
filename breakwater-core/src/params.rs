//! Request parameter access shared by the URL builder and HTTP handlers.

use std::collections::HashMap;

/// Read-only view over a request's query parameters and headers.
///
/// Empty values count as absent, mirroring how the HTTP surface treats
/// blank query parameters.
pub trait ParamSource: Send + Sync {
    /// Query parameter by name.
    fn query(&self, name: &str) -> Option<&str>;
    /// Header by name, case-insensitive.
    fn header(&self, name: &str) -> Option<&str>;
}

/// Owned parameter bag built from parsed query and header maps.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl RequestParams {
    /// Builds a parameter bag; header names are lowercased for lookup.
    pub fn new(query: HashMap<String, String>, headers: HashMap<String, String>) -> Self {
        Self {
            query,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
        }
    }

    /// Adds one query parameter; test convenience.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds one header; test convenience.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

impl ParamSource for RequestParams {
    fn query(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}
