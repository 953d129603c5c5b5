//! Sale Aggregate

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::domain::events::{DomainEvent, SaleEvent};
use crate::domain::value_objects::{round_currency, OrderNumber, Quantity, TrackingNumber};

/// Actor recorded in history rows when the caller is anonymous.
pub const SYSTEM_ACTOR: &str = "Sistema";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub adjustment_type: AdjustmentType,
    pub adjustment_percent: Decimal,
    pub adjustment_amount: Decimal,
    pub total: Decimal,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub shipping_address: String,
    pub tracking_number: Option<TrackingNumber>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

/// Priced snapshot of one product within a sale. Later price changes on the
/// product never touch it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub product_label: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

impl LineItem {
    pub fn new(product_id: impl Into<String>, product_label: impl Into<String>, unit_price: Decimal, quantity: Quantity) -> Self {
        Self {
            product_id: product_id.into(),
            product_label: product_label.into(),
            unit_price,
            quantity: quantity.value(),
            subtotal: round_currency(unit_price * quantity.as_decimal()),
        }
    }
}

/// Audit row appended on every sale mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub sale_id: String,
    pub status: SaleStatus,
    pub note: String,
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(sale_id: impl Into<String>, status: SaleStatus, note: impl Into<String>, changed_by: Option<&str>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            sale_id: sale_id.into(),
            status,
            note: note.into(),
            changed_by: changed_by.unwrap_or(SYSTEM_ACTOR).to_string(),
            created_at: at,
        }
    }
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $wire),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s { $($wire => Ok(Self::$variant),)+ other => Err(UnknownVariant(other.to_string())) }
            }
        }
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus { #[default] Preparing, Sent, Cancelled, Completed }
wire_enum!(SaleStatus { Preparing => "PREPARING", Sent => "SENT", Cancelled => "CANCELLED", Completed => "COMPLETED" });

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed }
wire_enum!(PaymentStatus { Pending => "PENDING", Paid => "PAID", Failed => "FAILED" });

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType { #[default] None, Discount, Surcharge }
wire_enum!(AdjustmentType { None => "NONE", Discount => "DISCOUNT", Surcharge => "SURCHARGE" });

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownVariant(pub String);
impl std::error::Error for UnknownVariant {}
impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Unknown value {}", self.0) }
}

/// A sale typed in by hand instead of generated from catalog products.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManualSale {
    pub customer_name: String,
    pub customer_email: String,
    pub total: Decimal,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub shipping_address: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

/// Partial edit of a stored sale. `None` leaves a field untouched; a blank
/// tracking number clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaleChanges {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total: Option<Decimal>,
    pub status: Option<SaleStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

fn tracking(value: Option<String>) -> Option<TrackingNumber> {
    value.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).map(TrackingNumber::new)
}

impl Sale {
    /// Builds a sale without line items. Subtotal equals the entered total and
    /// no adjustment applies.
    pub fn record<R: Rng + ?Sized>(manual: ManualSale, rng: &mut R, changed_by: Option<&str>, at: DateTime<Utc>) -> (Sale, HistoryEntry) {
        let total = round_currency(manual.total);
        let mut sale = Sale {
            id: Uuid::now_v7().to_string(),
            order_number: OrderNumber::generate(rng),
            customer_name: manual.customer_name,
            customer_email: manual.customer_email,
            items: vec![],
            subtotal: total,
            adjustment_type: AdjustmentType::None,
            adjustment_percent: Decimal::ZERO,
            adjustment_amount: Decimal::ZERO,
            total,
            status: manual.status,
            payment_status: manual.payment_status,
            payment_method: manual.payment_method,
            shipping_address: manual.shipping_address,
            tracking_number: tracking(manual.tracking_number),
            notes: manual.notes,
            created_at: at,
            updated_at: at,
            events: vec![],
        };
        sale.raise_event(DomainEvent::Sale(SaleEvent::Created {
            sale_id: sale.id.clone(),
            order_number: sale.order_number.to_string(),
            total: sale.total,
            status: sale.status,
        }));
        let note = sale.notes.clone().unwrap_or_else(|| "Venta creada".to_string());
        let history = HistoryEntry::new(&sale.id, sale.status, note, changed_by, at);
        (sale, history)
    }

    /// Applies the given fields and returns the history row to store with them.
    pub fn apply_changes(&mut self, changes: SaleChanges, changed_by: Option<&str>, at: DateTime<Utc>) -> HistoryEntry {
        let note = changes.notes.clone().unwrap_or_else(|| "Venta actualizada desde el panel.".to_string());
        if let Some(v) = changes.customer_name { self.customer_name = v; }
        if let Some(v) = changes.customer_email { self.customer_email = v; }
        if let Some(v) = changes.total { self.total = round_currency(v); }
        if let Some(v) = changes.status { self.status = v; }
        if let Some(v) = changes.payment_status { self.payment_status = v; }
        if let Some(v) = changes.payment_method { self.payment_method = v; }
        if let Some(v) = changes.shipping_address { self.shipping_address = v; }
        if changes.tracking_number.is_some() { self.tracking_number = tracking(changes.tracking_number); }
        if changes.notes.is_some() { self.notes = changes.notes; }
        self.updated_at = at;
        self.raise_event(DomainEvent::Sale(SaleEvent::Updated { sale_id: self.id.clone(), status: self.status }));
        HistoryEntry::new(&self.id, self.status, note, changed_by, at)
    }

    /// Moves the sale to `status` and returns the history row to store with it.
    /// A given note also replaces the sale notes.
    pub fn change_status(&mut self, status: SaleStatus, note: Option<String>, changed_by: Option<&str>, at: DateTime<Utc>) -> HistoryEntry {
        let from = self.status;
        let history_note = note.clone().unwrap_or_else(|| format!("Cambio de estado a {}", status));
        if note.is_some() { self.notes = note; }
        self.status = status;
        self.updated_at = at;
        self.raise_event(DomainEvent::Sale(SaleEvent::StatusChanged { sale_id: self.id.clone(), from, to: status }));
        HistoryEntry::new(&self.id, status, history_note, changed_by, at)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    pub(crate) fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rust_decimal_macros::dec;

    fn sale() -> Sale {
        let now = Utc::now();
        Sale {
            id: "sale-1".into(),
            order_number: OrderNumber::from_stored("ABCD2345"),
            customer_name: "Ana".into(),
            customer_email: "ana@mail.com".into(),
            items: vec![LineItem::new("p1", "Remera", dec!(10), Quantity::new(2).unwrap())],
            subtotal: dec!(20),
            adjustment_type: AdjustmentType::None,
            adjustment_percent: dec!(0),
            adjustment_amount: dec!(0),
            total: dec!(20),
            status: SaleStatus::Preparing,
            payment_status: PaymentStatus::Pending,
            payment_method: "Efectivo".into(),
            shipping_address: "Calle 1".into(),
            tracking_number: None,
            notes: Some("inicial".into()),
            created_at: now,
            updated_at: now,
            events: vec![],
        }
    }

    #[test]
    fn test_line_item_subtotal_rounds() {
        let item = LineItem::new("p1", "Remera", dec!(50.005), Quantity::new(1).unwrap());
        assert_eq!(item.subtotal, dec!(50.01));
    }

    #[test]
    fn test_change_status_with_default_note() {
        let mut s = sale();
        let entry = s.change_status(SaleStatus::Sent, None, None, Utc::now());
        assert_eq!(s.status, SaleStatus::Sent);
        assert_eq!(s.notes.as_deref(), Some("inicial"));
        assert_eq!(entry.note, "Cambio de estado a SENT");
        assert_eq!(entry.changed_by, SYSTEM_ACTOR);
        assert_eq!(entry.sale_id, "sale-1");
        let events = s.take_events();
        assert_eq!(events, vec![DomainEvent::Sale(SaleEvent::StatusChanged { sale_id: "sale-1".into(), from: SaleStatus::Preparing, to: SaleStatus::Sent })]);
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn test_change_status_with_note_replaces_notes() {
        let mut s = sale();
        let entry = s.change_status(SaleStatus::Completed, Some("Entregado".into()), Some("admin"), Utc::now());
        assert_eq!(s.notes.as_deref(), Some("Entregado"));
        assert_eq!(entry.note, "Entregado");
        assert_eq!(entry.changed_by, "admin");
    }

    fn manual() -> ManualSale {
        ManualSale {
            customer_name: "Ana".into(),
            customer_email: "ana@mail.com".into(),
            total: dec!(99.999),
            status: SaleStatus::Completed,
            payment_status: PaymentStatus::Paid,
            payment_method: "Efectivo".into(),
            shipping_address: "Calle 1".into(),
            tracking_number: Some("  ".into()),
            notes: None,
        }
    }

    #[test]
    fn test_record_manual_sale() {
        let mut rng = StdRng::seed_from_u64(8);
        let (mut s, entry) = Sale::record(manual(), &mut rng, None, Utc::now());
        assert!(s.items.is_empty());
        assert_eq!(s.total, dec!(100.00));
        assert_eq!(s.subtotal, s.total);
        assert_eq!(s.adjustment_type, AdjustmentType::None);
        assert_eq!(s.order_number.as_str().len(), OrderNumber::LENGTH);
        assert!(s.tracking_number.is_none());
        assert_eq!(entry.note, "Venta creada");
        assert_eq!(entry.status, SaleStatus::Completed);
        assert_eq!(s.take_events()[0].subject(), "sales.created");

        let (_, entry) = Sale::record(ManualSale { notes: Some("Venta de mostrador".into()), ..manual() }, &mut rng, Some("admin"), Utc::now());
        assert_eq!(entry.note, "Venta de mostrador");
        assert_eq!(entry.changed_by, "admin");
    }

    #[test]
    fn test_apply_changes_touches_only_given_fields() {
        let mut s = sale();
        s.tracking_number = Some(TrackingNumber::new("AR1"));
        let changes = SaleChanges { customer_name: Some("Ana María".into()), payment_status: Some(PaymentStatus::Paid), ..Default::default() };
        let entry = s.apply_changes(changes, None, Utc::now());
        assert_eq!(s.customer_name, "Ana María");
        assert_eq!(s.payment_status, PaymentStatus::Paid);
        assert_eq!(s.customer_email, "ana@mail.com");
        assert_eq!(s.status, SaleStatus::Preparing);
        assert_eq!(s.notes.as_deref(), Some("inicial"));
        assert_eq!(s.tracking_number, Some(TrackingNumber::new("AR1")));
        assert_eq!(entry.note, "Venta actualizada desde el panel.");
        assert_eq!(s.take_events()[0].subject(), "sales.updated");

        let entry = s.apply_changes(SaleChanges { tracking_number: Some("".into()), notes: Some("Reenvío".into()), ..Default::default() }, None, Utc::now());
        assert!(s.tracking_number.is_none());
        assert_eq!(s.notes.as_deref(), Some("Reenvío"));
        assert_eq!(entry.note, "Reenvío");
    }

    #[test]
    fn test_wire_names() {
        assert_eq!("CANCELLED".parse::<SaleStatus>().unwrap(), SaleStatus::Cancelled);
        assert_eq!(PaymentStatus::Failed.to_string(), "FAILED");
        assert!("shipped".parse::<SaleStatus>().is_err());
        assert_eq!(serde_json::to_string(&AdjustmentType::Surcharge).unwrap(), "\"SURCHARGE\"");
    }
}
