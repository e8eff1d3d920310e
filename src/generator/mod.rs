pub mod json;
pub mod single;

// Re-export format converters
pub use json::proxy_to_json;
pub use single::{proxy_to_single, proxy_to_uri};
