//! Stockroom - client-side state core for a spare-parts inventory manager
//!
//! This library provides the application state store, the action layer that
//! synchronizes it with a remote managed backend (documents, auth, blobs),
//! and the pure derived views screens render from.

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use config::Config;
pub use error::{AuthError, DataError, Result, StockroomError, StorageError};
pub use service::InventoryService;
pub use store::{InventoryState, Store, Transition};
pub use types::{
    Category, CategoryDraft, CategoryPatch, Filters, Part, PartDraft, PartPatch, Statistics, User,
};
pub use views::{compute_statistics, filter_parts, low_stock_parts};
