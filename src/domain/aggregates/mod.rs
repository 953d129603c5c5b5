//! Aggregates module
pub mod product;
pub mod sale;

pub use product::Product;
pub use sale::{AdjustmentType, HistoryEntry, LineItem, ManualSale, PaymentStatus, Sale, SaleChanges, SaleStatus, UnknownVariant, SYSTEM_ACTOR};
