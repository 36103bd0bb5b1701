pub mod extract;
pub mod metrics;
pub mod news;
