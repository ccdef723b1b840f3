//! Simple `HttpRequest` for testing, fixtures and the CLI.
//!
//! A lightweight owned request for when there is no `http::Request` at hand.

use crate::view::split_path_and_query;
use std::collections::HashMap;

/// Simple HTTP request for exception evaluation.
///
/// For live traffic, evaluate `http::Request` or `http::request::Parts`
/// directly (see [`ExceptLayer`](crate::ExceptLayer)).
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a builder for `HttpRequest`.
    #[must_use]
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Get the HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the request path (no query string).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Get a query parameter by name.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

/// Builder for `HttpRequest`.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            request: HttpRequest {
                method: "GET".to_owned(),
                path: "/".to_owned(),
                ..HttpRequest::default()
            },
        }
    }
}

impl HttpRequestBuilder {
    /// Set the HTTP method (default `GET`).
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.request.method = method.into();
        self
    }

    /// Set the request path (default `/`).
    ///
    /// A `?query` suffix is split off and its `key=value` pairs are added as
    /// query parameters.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let target = path.into();
        let (path, query) = split_path_and_query(&target);
        self.request.path = path.to_owned();
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.request
                .query_params
                .entry(key.to_owned())
                .or_insert_with(|| value.to_owned());
        }
        self
    }

    /// Add a header (name is lowercased for case-insensitive lookup).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .headers
            .insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query_params.insert(name.into(), value.into());
        self
    }

    /// Build the `HttpRequest`.
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.request
    }
}
