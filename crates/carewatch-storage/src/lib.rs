// Realtime store layer
//
// This crate provides store implementations for core traits:
// - FirebaseStore: implements ReadingSource and AlertLog over the Firebase
//   Realtime Database REST API, with SSE streaming subscriptions

pub mod config;
pub mod firebase;
pub mod models;
pub mod tree;

pub use config::FirebaseConfig;
pub use firebase::{FirebaseStore, ALERTS_PATH, HOUSE_PATH};
