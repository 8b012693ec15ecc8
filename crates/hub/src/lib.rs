pub mod config;
pub mod db;
pub mod logging;
mod request_logging;
pub mod secrets;
pub mod server;
