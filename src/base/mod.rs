pub mod attributes;
pub mod model;
