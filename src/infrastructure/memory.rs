//! In-process store for tests and local runs without Postgres

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::aggregates::{HistoryEntry, Product, Sale};
use crate::repository::{ProductCatalog, SaleRecord, SaleStore};
use crate::{Result, SalesError};

#[derive(Default)]
pub struct InMemoryStore {
    products: RwLock<HashMap<String, Product>>,
    sales: RwLock<Vec<Sale>>,
    histories: RwLock<Vec<HistoryEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn insert_product(&self, product: Product) {
        self.products.write().await.insert(product.id.clone(), product);
    }

    pub async fn history_for(&self, sale_id: &str) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = self.histories.read().await.iter().filter(|h| h.sale_id == sale_id).cloned().collect();
        entries.reverse();
        entries
    }

    pub async fn sale_count(&self) -> usize { self.sales.read().await.len() }
}

#[async_trait]
impl ProductCatalog for InMemoryStore {
    async fn lookup_products(&self, ids: &[String]) -> Result<HashMap<String, Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).map(|p| (id.clone(), p.clone()))).collect())
    }
}

#[async_trait]
impl SaleStore for InMemoryStore {
    async fn persist_sale(&self, sale: &Sale, history: &HistoryEntry) -> Result<()> {
        let mut sales = self.sales.write().await;
        let mut histories = self.histories.write().await;
        sales.push(sale.clone());
        histories.push(history.clone());
        Ok(())
    }

    async fn find_sale(&self, id: &str) -> Result<Option<SaleRecord>> {
        let sale = self.sales.read().await.iter().find(|s| s.id == id).cloned();
        match sale {
            Some(sale) => Ok(Some(SaleRecord { histories: self.history_for(id).await, sale })),
            None => Ok(None),
        }
    }

    async fn list_sales(&self, search: Option<&str>) -> Result<Vec<Sale>> {
        let needle = search.map(str::to_lowercase);
        let mut sales: Vec<Sale> = self
            .sales
            .read()
            .await
            .iter()
            .filter(|s| match &needle {
                Some(n) => [s.customer_name.as_str(), s.customer_email.as_str(), s.order_number.as_str()]
                    .iter()
                    .any(|field| field.to_lowercase().contains(n.as_str())),
                None => true,
            })
            .cloned()
            .map(|mut s| { s.items.clear(); s })
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn update_sale(&self, sale: &Sale, history: &HistoryEntry) -> Result<()> {
        let mut sales = self.sales.write().await;
        let mut histories = self.histories.write().await;
        let stored = sales.iter_mut().find(|s| s.id == sale.id).ok_or_else(|| SalesError::SaleNotFound(sale.id.clone()))?;
        let items = std::mem::take(&mut stored.items);
        *stored = Sale { items, events: vec![], ..sale.clone() };
        histories.push(history.clone());
        Ok(())
    }

    async fn delete_sale(&self, id: &str) -> Result<bool> {
        let mut sales = self.sales.write().await;
        let before = sales.len();
        sales.retain(|s| s.id != id);
        if sales.len() == before { return Ok(false); }
        self.histories.write().await.retain(|h| h.sale_id != id);
        Ok(true)
    }
}
