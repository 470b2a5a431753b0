//! Structured construction of API URLs.

use crate::error::{PublishError, Result};
use url::Url;

/// A query parameter value. Lists are joined with unescaped commas, which
/// is how the API expects multi-valued filters such as `affiliation`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryValue {
    Single(String),
    List(Vec<String>),
}

/// Path segments and query parameters relative to the API base URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, QueryValue)>,
}

impl Endpoint {
    /// Start an endpoint from literal segments, e.g. `["repos", owner, repo]`.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    /// Append a single path segment. Slashes inside it are escaped.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a slash-separated path, one segment per component.
    pub fn path(mut self, path: &str) -> Self {
        self.segments.extend(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Append an optional path; `None` or an empty path adds nothing.
    pub fn optional_path(self, path: Option<&str>) -> Self {
        match path {
            Some(p) => self.path(p),
            None => self,
        }
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query
            .push((key.into(), QueryValue::Single(value.to_string())));
        self
    }

    /// Add a comma-separated list query parameter.
    pub fn query_list<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.push((
            key.into(),
            QueryValue::List(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    fn render_query(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .query
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    QueryValue::Single(v) => urlencoding::encode(v).into_owned(),
                    QueryValue::List(vs) => vs
                        .iter()
                        .map(|v| urlencoding::encode(v).into_owned())
                        .collect::<Vec<_>>()
                        .join(","),
                };
                format!("{}={}", urlencoding::encode(key), value)
            })
            .collect();
        Some(pairs.join("&"))
    }

    /// Resolve against a base URL such as `https://api.github.com`.
    pub fn resolve(&self, base: &str) -> Result<Url> {
        let mut url = Url::parse(base)?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                PublishError::InvalidConfig(format!("Base URL cannot have a path: {}", base))
            })?;
            path.pop_if_empty();
            path.extend(&self.segments);
        }
        url.set_query(self.render_query().as_deref());
        Ok(url)
    }
}
