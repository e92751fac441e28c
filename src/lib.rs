//! Shopping-list API with rule-mined item suggestions.
//!
//! Lists and items are plain CRUD; the interesting part is the suggestion
//! engine in [`services::suggestions`], which ranks candidate items for a
//! list by combining association rules mined from recent add events with a
//! global-popularity fallback.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
