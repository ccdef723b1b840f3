//! Request views over `http` types.
//!
//! [`RequestView`] gives path rules the method and path; `except-core`
//! implements it for `http::Request<B>` and `Parts` behind its `http`
//! feature. [`HttpView`] adds header and query lookups for the built-in
//! predicates.

use crate::HttpRequest;
use except::RequestView;
use http::request::Parts;
use http::Request;

/// Header and query-parameter access for HTTP request types.
///
/// Header names are matched case-insensitively. Query values are returned
/// raw, without percent-decoding.
pub trait HttpView: RequestView {
    /// Get a header value by name. Non-UTF-8 values read as absent.
    fn header(&self, name: &str) -> Option<&str>;

    /// Get the first value of a query parameter.
    fn query_param(&self, name: &str) -> Option<&str>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// http::Request and http::request::Parts
// ═══════════════════════════════════════════════════════════════════════════════

impl<B> HttpView for Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.uri().query().and_then(|q| get_query_param(q, name))
    }
}

impl HttpView for Parts {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.uri.query().and_then(|q| get_query_param(q, name))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HttpRequest
// ═══════════════════════════════════════════════════════════════════════════════

impl RequestView for HttpRequest {
    fn method(&self) -> &str {
        HttpRequest::method(self)
    }

    fn path(&self) -> &str {
        HttpRequest::path(self)
    }
}

impl HttpView for HttpRequest {
    fn header(&self, name: &str) -> Option<&str> {
        HttpRequest::header(self, name)
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        HttpRequest::query_param(self, name)
    }
}

#[diagnostic::do_not_recommend]
impl<T: HttpView + ?Sized> HttpView for &T {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        (**self).query_param(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Query string helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Split a raw request target into path and query string.
///
/// `"/users?page=1"` → `("/users", Some("page=1"))`.
#[must_use]
pub fn split_path_and_query(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Get the first value of a parameter from a query string.
///
/// A key without `=` has the empty value.
#[must_use]
pub fn get_query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then_some(value)
    })
}
