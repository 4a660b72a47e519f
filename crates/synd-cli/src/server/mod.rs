//! HTTP server lifecycle.

mod http_server;
mod shutdown;

pub use http_server::serve_http;
pub use shutdown::shutdown_signal;
