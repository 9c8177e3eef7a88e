//! HTTP protocol layer module
//!
//! Protocol helpers shared by the file server: content types, response
//! builders and the no-cache decoration applied to every response.

pub mod mime;
pub mod nocache;
pub mod response;

// Re-export commonly used items
pub use nocache::{NoCache, NO_CACHE_HEADERS};
pub use response::{
    build_error_response, build_file_response, build_html_response, build_not_modified_response,
    build_redirect_response,
};
