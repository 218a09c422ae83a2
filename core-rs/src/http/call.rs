//! Outbound call specification handed to the transport verbatim

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSpec {
    pub base_url: String,
    pub method: String,
    pub path: Option<String>,
    /// Serialized query string without the leading `?`; `None` means omit
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub content_type: Option<String>,
}

impl CallSpec {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method: "GET".to_string(),
            path: None,
            query: None,
            headers: BTreeMap::new(),
            body: None,
            content_type: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Full request url: base url, path and query string
    pub fn url(&self) -> String {
        let mut url = self.base_url.clone();
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            match (url.ends_with('/'), path.starts_with('/')) {
                (true, true) => url.push_str(&path[1..]),
                (false, false) => {
                    url.push('/');
                    url.push_str(path);
                }
                _ => url.push_str(path),
            }
        }
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}
