pub mod harvest;

pub use harvest::{harvest, HarvestError, HarvestReport};
