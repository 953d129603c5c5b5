//! Storage ports used by [`crate::SalesService`]

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::aggregates::{HistoryEntry, Product, Sale};
use crate::Result;

/// Read-only product lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// One round trip for the whole id set. Ids without a product are simply
    /// absent from the returned map.
    async fn lookup_products(&self, ids: &[String]) -> Result<HashMap<String, Product>>;
}

#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Stores a new sale, its items and its first history row atomically.
    async fn persist_sale(&self, sale: &Sale, history: &HistoryEntry) -> Result<()>;

    async fn find_sale(&self, id: &str) -> Result<Option<SaleRecord>>;

    /// Newest first. Listed sales carry no items.
    async fn list_sales(&self, search: Option<&str>) -> Result<Vec<Sale>>;

    /// Stores the sale's header fields together with a history row atomically.
    /// Items are never rewritten.
    async fn update_sale(&self, sale: &Sale, history: &HistoryEntry) -> Result<()>;

    /// Removes the sale with its items and history. False when nothing matched.
    async fn delete_sale(&self, id: &str) -> Result<bool>;
}

/// A sale with its audit trail, newest entry first.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    #[serde(flatten)]
    pub sale: Sale,
    pub histories: Vec<HistoryEntry>,
}
