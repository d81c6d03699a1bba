pub mod plan;
pub mod quote;
pub mod route;
pub mod supplier;
