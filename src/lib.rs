//! Back-office Sales
//!
//! Sale generation for a small e-commerce back-office panel.
//!
//! ## Features
//! - Product option schemas (plain options and size/color matrices)
//! - Attribute selection validation against those schemas
//! - Line item pricing with per-item and order-level rounding
//! - Percentage discounts and surcharges
//! - Simulated payment outcomes driving order and payment status
//! - Manual sales and partial edits alongside generated ones
//! - Audit history for every sale mutation

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod dto;
pub mod infrastructure;
pub mod repository;
pub mod service;

pub use domain::aggregates::{HistoryEntry, LineItem, ManualSale, PaymentStatus, Product, Sale, SaleChanges, SaleStatus};
pub use domain::services::{generate_sale, GeneratedSale, ItemRequest, PaymentOutcome, PaymentResolver, PaymentSimulation, RandomPaymentResolver, SaleDefaults, SaleDraft};
pub use service::SalesService;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("At least one available product is required to generate a sale")]
    NoItems,

    #[error("Invalid quantity {0}: must be between 1 and 2147483647")]
    InvalidQuantity(u32),

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Select {} for {product}", .options.join(", "))]
    MissingOptions { product: String, options: Vec<String> },

    #[error("Attribute {option} does not match the options of product {product}")]
    InvalidAttribute { product: String, option: String },

    #[error("Sale {0} not found")]
    SaleNotFound(String),

    #[error("Category {0} not found")]
    CategoryNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SalesError {
    /// True for errors caused by the caller's input rather than missing records or storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NoItems | Self::InvalidQuantity(_) | Self::MissingOptions { .. } | Self::InvalidAttribute { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProductNotFound(_) | Self::SaleNotFound(_) | Self::CategoryNotFound(_))
    }
}

impl From<sqlx::Error> for SalesError {
    fn from(e: sqlx::Error) -> Self { Self::Storage(e.to_string()) }
}

impl From<validator::ValidationErrors> for SalesError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, SalesError>;
