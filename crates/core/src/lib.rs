//! Mibeko domain logic.
//!
//! Pure functions and types shared by the repository layer, the API server
//! and the embedding worker. Nothing in here touches the database or the
//! network.

pub mod article;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod search;
pub mod slug;
pub mod structure;
pub mod sync;
pub mod tagging;
pub mod types;
pub mod versioning;
