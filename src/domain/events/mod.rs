//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{PaymentStatus, SaleStatus};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum DomainEvent {
    Sale(SaleEvent),
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Sale(SaleEvent::Generated { .. }) => "sales.generated",
            Self::Sale(SaleEvent::Created { .. }) => "sales.created",
            Self::Sale(SaleEvent::Updated { .. }) => "sales.updated",
            Self::Sale(SaleEvent::StatusChanged { .. }) => "sales.status_changed",
            Self::Sale(SaleEvent::Deleted { .. }) => "sales.deleted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SaleEvent {
    Generated { sale_id: String, order_number: String, total: Decimal, status: SaleStatus, payment_status: PaymentStatus },
    Created { sale_id: String, order_number: String, total: Decimal, status: SaleStatus },
    Updated { sale_id: String, status: SaleStatus },
    StatusChanged { sale_id: String, from: SaleStatus, to: SaleStatus },
    Deleted { sale_id: String },
}
