//! Page URL construction

use url::Url;

/// Default query parameter carrying the continuation token
pub const DEFAULT_CURSOR_PARAM: &str = "cursor";

/// Fixed endpoint plus the query parameters every page request carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    endpoint: Url,
    params: Vec<(String, String)>,
    cursor_param: String,
}

impl PageRequest {
    /// Create a request template for an endpoint.
    ///
    /// Query parameters already present on the endpoint are kept.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
            cursor_param: DEFAULT_CURSOR_PARAM.to_string(),
        }
    }

    /// Add a fixed query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Set the name of the cursor query parameter
    #[must_use]
    pub fn cursor_param(mut self, name: impl Into<String>) -> Self {
        self.cursor_param = name.into();
        self
    }

    /// Build the URL for a page; an empty cursor requests the first page
    pub fn url_for(&self, cursor: &str) -> Url {
        let mut url = self.endpoint.clone();
        if self.params.is_empty() && cursor.is_empty() {
            return url;
        }

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &self.params {
                query.append_pair(key, value);
            }
            if !cursor.is_empty() {
                query.append_pair(&self.cursor_param, cursor);
            }
        }
        url
    }
}
