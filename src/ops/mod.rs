pub mod interface;
pub mod log_sink;
pub mod snapshot;
pub mod soap;
