//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Directory and raw text ingestion handlers.
pub mod documents;
/// Question answering handler.
pub mod query;
/// Collection clear and statistics handlers.
pub mod store;
