//! Sale generation pipeline
//!
//! resolve items -> compute totals -> resolve payment -> assemble the sale
//! and its first history row. Nothing here touches storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use rust_decimal::Decimal;

use super::payment::{PaymentOutcome, PaymentResolver, PaymentSimulation};
use super::resolver::{resolve_items, ItemRequest};
use super::totals::{compute_totals, OrderTotals};
use crate::domain::aggregates::{AdjustmentType, HistoryEntry, Product, Sale};
use crate::domain::events::{DomainEvent, SaleEvent};
use crate::domain::value_objects::{has_currency_precision, OrderNumber};
use crate::{Result, SalesError};

pub const DEFAULT_PAYMENT_METHOD: &str = "Tarjeta de Crédito";
pub const DEFAULT_SHIPPING_ADDRESS: &str =
    "Av. Hacienda de sierra vieja n2 local H31 colonia hacienda de sierra vieja, Cuautitlán izcalli, Estado de mexico 54769";

/// Values used when the request leaves a field out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleDefaults {
    pub payment_method: String,
    pub shipping_address: String,
}

impl Default for SaleDefaults {
    fn default() -> Self {
        Self { payment_method: DEFAULT_PAYMENT_METHOD.to_string(), shipping_address: DEFAULT_SHIPPING_ADDRESS.to_string() }
    }
}

/// Everything a caller may specify when generating a sale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaleDraft {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<ItemRequest>,
    pub adjustment_type: Option<AdjustmentType>,
    pub adjustment_percent: Option<Decimal>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub payment_simulation: Option<PaymentSimulation>,
}

/// A fully assembled sale ready to be persisted together with its history row.
#[derive(Clone, Debug)]
pub struct GeneratedSale {
    pub sale: Sale,
    pub history: HistoryEntry,
    pub outcome: PaymentOutcome,
    pub totals: OrderTotals,
}

/// `"Generada desde panel (pago APPROVED) | Descuento 10%"`
pub fn audit_note(outcome: PaymentOutcome, totals: &OrderTotals) -> String {
    match totals.adjustment.as_ref().and_then(|a| a.label()) {
        Some(label) => format!("Generada desde panel (pago {}) | {}", outcome, label),
        None => format!("Generada desde panel (pago {})", outcome),
    }
}

pub fn generate_sale<P, R>(
    request: &SaleDraft,
    products: &HashMap<String, Product>,
    resolver: &mut P,
    rng: &mut R,
    defaults: &SaleDefaults,
    changed_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<GeneratedSale>
where
    P: PaymentResolver + ?Sized,
    R: Rng + ?Sized,
{
    if request.items.is_empty() { return Err(SalesError::NoItems); }
    if let Some(percent) = request.adjustment_percent.filter(|p| !has_currency_precision(*p)) {
        return Err(SalesError::Validation(format!("adjustment percent {} has more than two decimals", percent)));
    }
    let items = resolve_items(&request.items, products)?;
    if items.is_empty() { return Err(SalesError::NoItems); }

    let totals = compute_totals(&items, request.adjustment_type, request.adjustment_percent);
    let outcome = resolver.resolve(request.payment_simulation.unwrap_or_default());
    let note = request.notes.clone().unwrap_or_else(|| audit_note(outcome, &totals));
    let suffix = format!("{:06}", now.timestamp_millis().rem_euclid(1_000_000));

    let mut sale = Sale {
        id: Uuid::now_v7().to_string(),
        order_number: OrderNumber::generate(rng),
        customer_name: request.customer_name.clone().unwrap_or_else(|| format!("Cliente {}", suffix)),
        customer_email: request.customer_email.clone().unwrap_or_else(|| format!("cliente{}@mail.com", suffix)),
        items,
        subtotal: totals.subtotal,
        adjustment_type: totals.adjustment_type(),
        adjustment_percent: totals.adjustment_percent(),
        adjustment_amount: totals.adjustment_amount(),
        total: totals.total,
        status: outcome.sale_status(),
        payment_status: outcome.payment_status(),
        payment_method: request.payment_method.clone().unwrap_or_else(|| defaults.payment_method.clone()),
        shipping_address: request.shipping_address.clone().unwrap_or_else(|| defaults.shipping_address.clone()),
        tracking_number: outcome.tracking_number(request.tracking_number.as_deref(), rng),
        notes: Some(note.clone()),
        created_at: now,
        updated_at: now,
        events: vec![],
    };
    sale.raise_event(DomainEvent::Sale(SaleEvent::Generated {
        sale_id: sale.id.clone(),
        order_number: sale.order_number.to_string(),
        total: sale.total,
        status: sale.status,
        payment_status: sale.payment_status,
    }));
    let history = HistoryEntry::new(&sale.id, sale.status, note, changed_by, now);

    Ok(GeneratedSale { sale, history, outcome, totals })
}
