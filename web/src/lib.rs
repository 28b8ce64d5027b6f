pub mod config;
pub mod frontend;
pub mod http_server;
pub mod session;
