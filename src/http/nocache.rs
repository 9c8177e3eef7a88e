//! No-cache response decoration
//!
//! Every response leaving the server carries the same three headers so
//! browsers and proxies never reuse a stored copy. The headers are
//! appended after the file server has finished the response; nothing the
//! file server set is removed or rewritten, and status and body are left
//! alone.

use hyper::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// The header triple appended to every response
pub const NO_CACHE_HEADERS: [(HeaderName, &str); 3] = [
    (CACHE_CONTROL, "no-store, no-cache, must-revalidate, max-age=0"),
    (PRAGMA, "no-cache"),
    (EXPIRES, "0"),
];

/// Append the no-cache headers to a finished header map
pub fn apply(headers: &mut HeaderMap) {
    for (name, value) in NO_CACHE_HEADERS {
        headers.append(name, HeaderValue::from_static(value));
    }
}

/// Service wrapper that runs [`apply`] on every successful response of
/// the inner service, whatever its status.
#[derive(Debug, Clone)]
pub struct NoCache<S> {
    inner: S,
}

impl<S> NoCache<S> {
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for NoCache<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let response = self.inner.call(req);
        Box::pin(async move {
            let mut response = response.await?;
            apply(response.headers_mut());
            Ok(response)
        })
    }
}
