pub mod base64;
pub mod file;
pub mod http;
pub mod node_manip;
pub mod url;

// Re-export common utilities
pub use http::{FetchError, Fetcher};
pub use node_manip::{dedup_nodes, number_duplicates, rename_nodes};
