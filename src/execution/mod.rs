pub mod export;
pub mod import;
pub mod report;
pub mod runner;
pub mod stats;
