#![deny(missing_docs)]
//! Itemdex - a Telegram bot for a remote game-item catalog
//!
//! Searches the catalog by ID or keyword and delivers rendered item
//! images in paginated batches, either over an inbound webhook or via
//! long polling.

/// Telegram bot implementation
pub mod bot;
/// Catalog loading and search
pub mod catalog;
/// Configuration management
pub mod config;
/// Shared HTTP client construction
pub mod http;
/// Image URL resolution and download
pub mod images;
/// Inbound webhook adapter
pub mod webhook;
