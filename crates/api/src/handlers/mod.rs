pub mod admin;
pub mod articles;
pub mod documents;
pub mod search;
pub mod structure;
pub mod sync;
pub mod tags;
