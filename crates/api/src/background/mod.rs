//! Background work spawned from request handlers.
//!
//! Tasks are spawned on the state's `TaskTracker` so the binary can wait
//! for them during graceful shutdown. They never fail the request that
//! spawned them.

pub mod embedding;
