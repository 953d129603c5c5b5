//! Postgres-backed catalog lookup and sale store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{HistoryEntry, LineItem, Product, Sale};
use crate::domain::value_objects::{OrderNumber, TrackingNumber};
use crate::repository::{ProductCatalog, SaleRecord, SaleStore};
use crate::{Result, SalesError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

/// `%text%` for `ILIKE`, with `\`, `%` and `_` in the text matched literally.
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') { pattern.push('\\'); }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(sqlx::FromRow)]
struct ProductRow { id: String, name: String, price: Decimal, options: serde_json::Value }

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: String, order_number: String, customer_name: String, customer_email: String,
    subtotal: Decimal, adjustment_type: String, adjustment_percent: Decimal, adjustment_amount: Decimal, total: Decimal,
    status: String, payment_status: String, payment_method: String, shipping_address: String,
    tracking_number: Option<String>, notes: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SaleItemRow { product_id: String, product_label: String, unit_price: Decimal, quantity: i32, subtotal: Decimal }

#[derive(sqlx::FromRow)]
struct HistoryRow { id: String, sale_id: String, status: String, note: String, changed_by: String, created_at: DateTime<Utc> }

fn corrupt(e: impl std::fmt::Display) -> SalesError { SalesError::Storage(format!("corrupt row: {}", e)) }

impl TryFrom<SaleRow> for Sale {
    type Error = SalesError;
    fn try_from(r: SaleRow) -> Result<Self> {
        Ok(Sale {
            id: r.id,
            order_number: OrderNumber::from_stored(r.order_number),
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            items: vec![],
            subtotal: r.subtotal,
            adjustment_type: r.adjustment_type.parse().map_err(corrupt)?,
            adjustment_percent: r.adjustment_percent,
            adjustment_amount: r.adjustment_amount,
            total: r.total,
            status: r.status.parse().map_err(corrupt)?,
            payment_status: r.payment_status.parse().map_err(corrupt)?,
            payment_method: r.payment_method,
            shipping_address: r.shipping_address,
            tracking_number: r.tracking_number.map(TrackingNumber::new),
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
            events: vec![],
        })
    }
}

impl From<SaleItemRow> for LineItem {
    fn from(r: SaleItemRow) -> Self {
        LineItem { product_id: r.product_id, product_label: r.product_label, unit_price: r.unit_price, quantity: r.quantity.max(0) as u32, subtotal: r.subtotal }
    }
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = SalesError;
    fn try_from(r: HistoryRow) -> Result<Self> {
        Ok(HistoryEntry { id: r.id, sale_id: r.sale_id, status: r.status.parse().map_err(corrupt)?, note: r.note, changed_by: r.changed_by, created_at: r.created_at })
    }
}

#[async_trait]
impl ProductCatalog for PgStore {
    async fn lookup_products(&self, ids: &[String]) -> Result<HashMap<String, Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT id, name, price, options FROM products WHERE id = ANY($1)")
            .bind(ids).fetch_all(&self.pool).await?;
        tracing::debug!(requested = ids.len(), found = rows.len(), "product lookup");
        Ok(rows.into_iter().map(|r| (r.id.clone(), Product::new(r.id, r.name, r.price).with_options(r.options))).collect())
    }
}

#[async_trait]
impl SaleStore for PgStore {
    async fn persist_sale(&self, sale: &Sale, history: &HistoryEntry) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO sales (id, order_number, customer_name, customer_email, subtotal, adjustment_type, adjustment_percent, adjustment_amount, total, status, payment_status, payment_method, shipping_address, tracking_number, notes, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)")
            .bind(&sale.id).bind(sale.order_number.as_str()).bind(&sale.customer_name).bind(&sale.customer_email)
            .bind(sale.subtotal).bind(sale.adjustment_type.as_str()).bind(sale.adjustment_percent).bind(sale.adjustment_amount).bind(sale.total)
            .bind(sale.status.as_str()).bind(sale.payment_status.as_str()).bind(&sale.payment_method).bind(&sale.shipping_address)
            .bind(sale.tracking_number.as_ref().map(|t| t.as_str())).bind(&sale.notes).bind(sale.created_at).bind(sale.updated_at)
            .execute(&mut *tx).await?;
        for (position, item) in sale.items.iter().enumerate() {
            let quantity = i32::try_from(item.quantity).map_err(|_| SalesError::InvalidQuantity(item.quantity))?;
            sqlx::query("INSERT INTO sale_items (id, sale_id, position, product_id, product_label, unit_price, quantity, subtotal) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
                .bind(Uuid::now_v7().to_string()).bind(&sale.id).bind(position as i32).bind(&item.product_id).bind(&item.product_label)
                .bind(item.unit_price).bind(quantity).bind(item.subtotal)
                .execute(&mut *tx).await?;
        }
        insert_history(&mut tx, history).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_sale(&self, id: &str) -> Result<Option<SaleRecord>> {
        let Some(row) = sqlx::query_as::<_, SaleRow>("SELECT * FROM sales WHERE id = $1").bind(id).fetch_optional(&self.pool).await? else {
            return Ok(None);
        };
        let mut sale = Sale::try_from(row)?;
        sale.items = sqlx::query_as::<_, SaleItemRow>("SELECT product_id, product_label, unit_price, quantity, subtotal FROM sale_items WHERE sale_id = $1 ORDER BY position")
            .bind(id).fetch_all(&self.pool).await?.into_iter().map(LineItem::from).collect();
        let histories = sqlx::query_as::<_, HistoryRow>("SELECT * FROM sale_histories WHERE sale_id = $1 ORDER BY created_at DESC")
            .bind(id).fetch_all(&self.pool).await?.into_iter().map(HistoryEntry::try_from).collect::<Result<Vec<_>>>()?;
        Ok(Some(SaleRecord { sale, histories }))
    }

    async fn list_sales(&self, search: Option<&str>) -> Result<Vec<Sale>> {
        let pattern = search.map(contains_pattern);
        sqlx::query_as::<_, SaleRow>("SELECT * FROM sales WHERE $1::text IS NULL OR customer_name ILIKE $1 OR customer_email ILIKE $1 OR order_number ILIKE $1 ORDER BY created_at DESC")
            .bind(pattern).fetch_all(&self.pool).await?
            .into_iter().map(Sale::try_from).collect()
    }

    async fn update_sale(&self, sale: &Sale, history: &HistoryEntry) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query("UPDATE sales SET customer_name = $2, customer_email = $3, total = $4, status = $5, payment_status = $6, payment_method = $7, shipping_address = $8, tracking_number = $9, notes = $10, updated_at = $11 WHERE id = $1")
            .bind(&sale.id).bind(&sale.customer_name).bind(&sale.customer_email).bind(sale.total)
            .bind(sale.status.as_str()).bind(sale.payment_status.as_str()).bind(&sale.payment_method).bind(&sale.shipping_address)
            .bind(sale.tracking_number.as_ref().map(|t| t.as_str())).bind(&sale.notes).bind(sale.updated_at)
            .execute(&mut *tx).await?;
        if updated.rows_affected() == 0 { return Err(SalesError::SaleNotFound(sale.id.clone())); }
        insert_history(&mut tx, history).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_sale(&self, id: &str) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM sales WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(deleted.rows_affected() > 0)
    }
}

async fn insert_history(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, history: &HistoryEntry) -> Result<()> {
    sqlx::query("INSERT INTO sale_histories (id, sale_id, status, note, changed_by, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
        .bind(&history.id).bind(&history.sale_id).bind(history.status.as_str()).bind(&history.note).bind(&history.changed_by).bind(history.created_at)
        .execute(&mut **tx).await?;
    Ok(())
}
