//! Router Module
//!
//! Picks the model a conversation is sent to.

pub mod model;

pub use model::ModelSelector;
