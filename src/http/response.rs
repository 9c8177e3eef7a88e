//! HTTP response building module
//!
//! Builders for every response the file server produces. None of them
//! set caching headers; those are added for all responses by
//! [`crate::http::nocache`].

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION};
use hyper::{Response, StatusCode};

/// Content type of generated HTML (error pages)
pub const ERROR_CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// Build 200 response carrying file content
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length);
    if let Some(modified) = last_modified {
        builder = builder.header(LAST_MODIFIED, modified);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        internal_error()
    })
}

/// Build 200 response with generated HTML (directory listings)
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    build_file_response(
        Bytes::from(content),
        "text/html; charset=utf-8",
        None,
        is_head,
    )
}

/// Build 301 redirect response, used to add the trailing slash to directories
pub fn build_redirect_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_LENGTH, 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            internal_error()
        })
}

/// Build 304 Not Modified response
pub fn build_not_modified_response(last_modified: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            internal_error()
        })
}

/// Build an HTML error page for `status`
pub fn build_error_response(status: StatusCode, is_head: bool) -> Response<Full<Bytes>> {
    let page = error_page(status);
    let content_length = page.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(page)
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, ERROR_CONTENT_TYPE)
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            internal_error()
        })
}

/// Message and explanation shown on the error page
fn error_text(status: StatusCode) -> (&'static str, &'static str) {
    match status {
        StatusCode::BAD_REQUEST => ("Bad request", "Bad request syntax or unsupported method"),
        StatusCode::FORBIDDEN => ("Forbidden", "Request forbidden -- authorization will not help"),
        StatusCode::NOT_FOUND => ("File not found", "Nothing matches the given URI"),
        StatusCode::NOT_IMPLEMENTED => ("Unsupported method", "Server does not support this operation"),
        StatusCode::INTERNAL_SERVER_ERROR => ("Internal Server Error", "Server got itself in trouble"),
        _ => {
            let reason = status.canonical_reason().unwrap_or("Unknown Error");
            (reason, reason)
        }
    }
}

fn error_page(status: StatusCode) -> String {
    let (message, explanation) = error_text(status);
    let code = status.as_u16();
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Error response</title>\n\
         </head>\n\
         <body>\n\
         <h1>Error response</h1>\n\
         <p>Error code: {code}</p>\n\
         <p>Message: {message}.</p>\n\
         <p>Error code explanation: {code} - {explanation}.</p>\n\
         </body>\n\
         </html>\n"
    )
}

/// Bare 500 used when a builder rejects its input
fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_error_page_names_code_and_reason() {
        let response = build_error_response(StatusCode::NOT_FOUND, false);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], ERROR_CONTENT_TYPE);

        let body = body_of(response).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("Error code: 404"));
        assert!(text.contains("Message: File not found."));
        assert!(text.contains("Error code explanation: 404 - Nothing matches the given URI."));
    }

    #[tokio::test]
    async fn test_error_page_for_unlisted_status_uses_reason() {
        let body = body_of(build_error_response(StatusCode::REQUEST_TIMEOUT, false)).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("Error code: 408"));
        assert!(text.contains("Message: Request Timeout."));
    }

    #[tokio::test]
    async fn test_head_keeps_length_but_drops_body() {
        let response = build_file_response(Bytes::from_static(b"hello"), "text/plain", None, true);
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
        assert!(body_of(response).await.is_empty());
    }

    #[test]
    fn test_redirect_has_location() {
        let response = build_redirect_response("/docs/?x=1");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/docs/?x=1");
        assert_eq!(response.headers()[CONTENT_LENGTH], "0");
    }

    #[test]
    fn test_invalid_header_value_falls_back_to_500() {
        let response = build_redirect_response("/bad\nlocation");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
