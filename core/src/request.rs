//! `RequestView` — the slice of a request that path rules read
//!
//! The engine never names a concrete request type. Path and method+path rules
//! only need a method and a path; predicate rules receive the full request.

/// Minimal structural view of an incoming request.
///
/// Implement this for your pipeline's request type. `path` must be the
/// request path only, without query string or fragment.
///
/// # Example
///
/// ```
/// use except::RequestView;
///
/// struct Request { method: String, path: String }
///
/// impl RequestView for Request {
///     fn method(&self) -> &str { &self.method }
///     fn path(&self) -> &str { &self.path }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `RequestView`",
    label = "path rules cannot read the method and path of this type",
    note = "implement `method(&self) -> &str` and `path(&self) -> &str` for your request type"
)]
pub trait RequestView {
    /// HTTP method, in any case.
    fn method(&self) -> &str;

    /// Request path, without query string.
    fn path(&self) -> &str;
}

#[diagnostic::do_not_recommend]
impl<T: RequestView + ?Sized> RequestView for &T {
    fn method(&self) -> &str {
        (**self).method()
    }

    fn path(&self) -> &str {
        (**self).path()
    }
}

#[diagnostic::do_not_recommend]
impl<T: RequestView + ?Sized> RequestView for Box<T> {
    fn method(&self) -> &str {
        (**self).method()
    }

    fn path(&self) -> &str {
        (**self).path()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// http types (feature-gated)
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "http")]
impl<B> RequestView for http::Request<B> {
    fn method(&self) -> &str {
        self.method().as_str()
    }

    fn path(&self) -> &str {
        self.uri().path()
    }
}

#[cfg(feature = "http")]
impl RequestView for http::request::Parts {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn path(&self) -> &str {
        self.uri.path()
    }
}
