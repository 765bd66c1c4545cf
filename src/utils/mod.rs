pub mod error;
pub mod http;
pub mod slow_warn;
