//! Core data models for the application
//!
//! This module contains the node record produced by the parsers and consumed
//! by the renamer and the generators, separated from the logic that operates
//! on them.
//!
//! # Usage
//!
//! ```rust
//! use nodesub::models::{NodeRecord, Scheme};
//!
//! let node = NodeRecord::new(Scheme::Trojan, "1.2.3.4", 443, "password", "MyNode");
//! assert_eq!(node.key(), (Scheme::Trojan, "1.2.3.4", 443));
//! ```

mod node;

pub use node::*;
