pub mod generator;
pub mod interfaces;
pub mod models;
pub mod parser;
pub mod settings;
pub mod sources;
pub mod utils;

// Re-export the node model for easier access
pub use models::{NodeRecord, Scheme};

// Re-export the run entry point and configuration
pub use interfaces::{harvest, HarvestError, HarvestReport};
pub use settings::Settings;
