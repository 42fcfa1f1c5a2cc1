//! Query-string construction for Retail API requests
//!
//! The Retail API expects a few parameters in a non-standard shape, so they
//! are rendered by hand instead of going through a form encoder:
//!
//! - `load_relations` carries a JSON array and is sent unencoded
//! - `or` is passed through verbatim
//! - `timeStamp` becomes `timeStamp=>,<value>`
//! - operator-comma values (`<,5`, `>=,10`) only have the operator prefix
//!   encoded

use serde::Serialize;

const LOAD_RELATIONS: &str = "load_relations";

/// Ordered set of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
    raw: Vec<String>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value for the same key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key` to `value` in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Relations to eager-load, rendered as a JSON array.
    #[must_use]
    pub fn load_relations<I, S>(self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let relations: Vec<String> = relations.into_iter().map(Into::into).collect();
        let rendered = serde_json::to_string(&relations).unwrap_or_else(|_| "[]".to_string());
        self.with(LOAD_RELATIONS, rendered)
    }

    /// Page size for a single request (server maximum is 100).
    #[must_use]
    pub fn limit(self, limit: u32) -> Self {
        self.with("limit", limit)
    }

    /// Append a raw query fragment.
    ///
    /// A leading `?` is stripped; a fragment starting with `[` is treated as a
    /// `load_relations` array.
    #[must_use]
    pub fn raw(mut self, fragment: &str) -> Self {
        let fragment = fragment.trim_start_matches('?');
        if fragment.is_empty() {
            return self;
        }
        if fragment.starts_with('[') {
            self.raw.push(format!("{LOAD_RELATIONS}={fragment}"));
        } else {
            self.raw.push(fragment.to_string());
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Client-side result cap implied by a `limit` parameter.
    #[must_use]
    pub fn limit_value(&self) -> Option<usize> {
        self.get("limit").and_then(|v| v.parse().ok())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.raw.is_empty()
    }

    /// Render the query string, without a leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| render_pair(key, value))
            .chain(self.raw.iter().cloned())
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn render_pair(key: &str, value: &str) -> String {
    match key {
        "relations" | LOAD_RELATIONS => format!("{LOAD_RELATIONS}={value}"),
        "or" => format!("or={value}"),
        "timeStamp" => format!("timeStamp=>,{value}"),
        _ => match split_operator(value) {
            Some((operator, rest)) => format!("{key}={}{rest}", urlencoding::encode(operator)),
            None => format!("{key}={}", urlencoding::encode(value)),
        },
    }
}

/// Split `<,5` / `>=,10` style values into `("<,", "5")`.
fn split_operator(value: &str) -> Option<(&str, &str)> {
    let bytes = value.as_bytes();
    if !matches!(bytes.first(), Some(b'<' | b'>')) {
        return None;
    }
    let comma = if bytes.get(1) == Some(&b'=') { 2 } else { 1 };
    (bytes.get(comma) == Some(&b',')).then(|| value.split_at(comma + 1))
}

/// Append a rendered query string to `url`, using `?` or `&` as needed.
#[must_use]
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let base = url.trim_end_matches(['?', '&']);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}
