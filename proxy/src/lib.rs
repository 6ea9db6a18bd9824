pub mod chat_proxy;
pub mod config;
pub mod http_server;
pub mod probe;

pub use chat_proxy::{ChatProxy, ProxyError};
pub use config::ProxyConfig;
