//! Antibot contract indexer.
//!
//! Reconciles the Antibot contract's event stream into flat token, user and
//! relation records behind a pluggable [`store::EntityStore`]. The binary in
//! `src/main.rs` tails the chain over JSON-RPC and drives the
//! [`reconciler::Reconciler`] against the sqlite-backed store.

pub mod config;
pub mod entities;
pub mod env;
pub mod error;
pub mod events;
pub mod reconciler;
pub mod store;
