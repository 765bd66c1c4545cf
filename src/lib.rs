pub mod base;
pub mod execution;
pub mod ops;
pub mod reconcile;
pub mod settings;
pub mod utils;

pub mod prelude;
