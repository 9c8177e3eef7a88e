//! Static file serving module
//!
//! Resolves a request against the root directory and produces the file,
//! a trailing-slash redirect, an index page, a directory listing, or an
//! error page. Content is read from disk on every request.

use crate::config::ServeState;
use crate::handler::listing;
use crate::handler::path::{translate_path, ResolvedPath};
use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Serve the request path from the root directory
pub async fn serve(ctx: &RequestContext<'_>, state: &ServeState) -> Response<Full<Bytes>> {
    let Ok(resolved) = translate_path(&state.root, ctx.path) else {
        return http::build_error_response(StatusCode::BAD_REQUEST, ctx.is_head);
    };

    let target = match fs::canonicalize(&resolved.fs_path).await {
        Ok(p) => p,
        Err(e) => return error_for_io(&e, ctx.is_head),
    };
    if !within_root(ctx, state, &target) {
        return http::build_error_response(StatusCode::NOT_FOUND, ctx.is_head);
    }

    let metadata = match fs::metadata(&target).await {
        Ok(m) => m,
        Err(e) => return error_for_io(&e, ctx.is_head),
    };

    if metadata.is_dir() {
        serve_directory(ctx, state, &resolved, &target).await
    } else if resolved.trailing_slash {
        http::build_error_response(StatusCode::NOT_FOUND, ctx.is_head)
    } else {
        serve_file(ctx, &target).await
    }
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &ServeState,
    resolved: &ResolvedPath,
    dir: &Path,
) -> Response<Full<Bytes>> {
    if !resolved.trailing_slash {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_redirect_response(&location);
    }

    for index in &state.index_files {
        let Ok(candidate) = fs::canonicalize(dir.join(index)).await else {
            continue;
        };
        if !fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            continue;
        }
        if !within_root(ctx, state, &candidate) {
            return http::build_error_response(StatusCode::NOT_FOUND, ctx.is_head);
        }
        return serve_file(ctx, &candidate).await;
    }

    match listing::render_directory_listing(dir, &resolved.display).await {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "Cannot list directory '{}': {e}",
                dir.display()
            ));
            error_for_io(&e, ctx.is_head)
        }
    }
}

async fn serve_file(ctx: &RequestContext<'_>, file: &Path) -> Response<Full<Bytes>> {
    let metadata = match fs::metadata(file).await {
        Ok(m) => m,
        Err(e) => return error_for_io(&e, ctx.is_head),
    };
    let modified = metadata.modified().ok();
    let last_modified = modified.map(httpdate::fmt_http_date);

    if ctx.if_none_match.is_none() {
        if let (Some(mtime), Some(since)) = (modified, ctx.if_modified_since.as_deref()) {
            if not_modified_since(mtime, since) {
                let stamp = last_modified.unwrap_or_default();
                return http::build_not_modified_response(&stamp);
            }
        }
    }

    let content = match fs::read(file).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", file.display()));
            return error_for_io(&e, ctx.is_head);
        }
    };

    http::build_file_response(
        Bytes::from(content),
        mime::content_type_for(file),
        last_modified.as_deref(),
        ctx.is_head,
    )
}

/// Symlinks may point anywhere; only canonical paths under the root are served
fn within_root(ctx: &RequestContext<'_>, state: &ServeState, canonical: &Path) -> bool {
    let inside = canonical.starts_with(&state.root);
    if !inside {
        logger::log_warning(&format!(
            "Path escapes root, refusing: {} -> {}",
            ctx.path,
            canonical.display()
        ));
    }
    inside
}

/// `If-Modified-Since` check at one-second resolution. Unparseable dates
/// never match, so the full body is sent.
fn not_modified_since(mtime: SystemTime, header: &str) -> bool {
    let Ok(since) = httpdate::parse_http_date(header.trim()) else {
        return false;
    };
    match (mtime.duration_since(UNIX_EPOCH), since.duration_since(UNIX_EPOCH)) {
        (Ok(modified), Ok(since)) => modified.as_secs() <= since.as_secs(),
        _ => false,
    }
}

fn error_for_io(e: &io::Error, is_head: bool) -> Response<Full<Bytes>> {
    let status = match e.kind() {
        io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::NOT_FOUND,
    };
    http::build_error_response(status, is_head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_not_modified_since() {
        let mtime = UNIX_EPOCH + Duration::from_millis(784_111_777_400);
        // 784111777 == Sun, 06 Nov 1994 08:49:37 GMT
        assert!(not_modified_since(mtime, "Sun, 06 Nov 1994 08:49:37 GMT"));
        assert!(not_modified_since(mtime, "Sun, 06 Nov 1994 09:00:00 GMT"));
        assert!(!not_modified_since(mtime, "Sun, 06 Nov 1994 08:49:36 GMT"));
    }

    #[test]
    fn test_unparseable_date_is_modified() {
        assert!(!not_modified_since(SystemTime::now(), "yesterday"));
    }

    #[test]
    fn test_io_error_mapping() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(error_for_io(&denied, false).status(), StatusCode::FORBIDDEN);
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(error_for_io(&missing, false).status(), StatusCode::NOT_FOUND);
    }
}
