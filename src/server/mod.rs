// Server module entry point
// Binds the listener, accepts connections and handles shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;
pub mod transport;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used types
pub use listener::create_listener;
pub use server_loop::Server;
