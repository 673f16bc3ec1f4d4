pub mod analytics;
pub mod trip;
pub mod truck;
