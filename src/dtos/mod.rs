pub mod analytics;
pub mod trip;
