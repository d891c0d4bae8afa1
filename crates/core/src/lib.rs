//! Core library: file-metadata models, the local store, and remote/local
//! reconciliation.

pub mod config;
pub mod models;
pub mod reconcile;
pub mod store;
pub mod sync;
