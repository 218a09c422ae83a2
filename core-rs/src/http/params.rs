//! Insertion-ordered query parameter multimap
//!
//! Values are kept exactly as they appear on the wire; nothing is decoded
//! or re-encoded on the way through.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2&a=3`; a key without `=` gets an empty value
    pub fn parse(raw: &str) -> Self {
        let mut params = Self::new();
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.append(key, value);
        }
        params
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Append every value of `other` after the values already present
    pub fn merge(&mut self, other: QueryParams) {
        for (key, values) in other.entries {
            for value in values {
                self.append(key.clone(), value);
            }
        }
    }

    pub fn get(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).first().map(String::as_str)
    }

    pub fn count(&self, key: &str) -> usize {
        self.get(key).len()
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, values)| values.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
    }

    /// `k=v` pairs joined by `&`, or `None` when there are no parameters
    pub fn to_query_string(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join("&"),
        )
    }
}
