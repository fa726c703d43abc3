pub mod aggregate;
pub mod config;
pub mod display;
pub mod fallback;
pub mod http_client;
pub mod records;
pub mod source;
pub mod views;
