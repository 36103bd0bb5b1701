pub mod metrics;
pub mod news;
pub mod recommendation;
pub mod report;
