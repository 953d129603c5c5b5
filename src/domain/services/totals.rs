//! Order totals and percentage adjustments
//!
//! Rounding happens per line item and again on the summed subtotal, so a
//! total can differ by a cent from rounding once at the end. Issued sales
//! depend on this, keep it.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{AdjustmentType, LineItem};
use crate::domain::value_objects::{round_currency, AdjustmentPercent};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub adjustment: Option<AppliedAdjustment>,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAdjustment {
    pub kind: AdjustmentType,
    pub percent: AdjustmentPercent,
    pub amount: Decimal,
}

impl AppliedAdjustment {
    /// `"Descuento 10%"` / `"Recargo 10%"`, nothing for [`AdjustmentType::None`].
    pub fn label(&self) -> Option<String> {
        let word = match self.kind {
            AdjustmentType::Discount => "Descuento",
            AdjustmentType::Surcharge => "Recargo",
            AdjustmentType::None => return None,
        };
        Some(format!("{} {}%", word, self.percent))
    }
}

impl OrderTotals {
    pub fn adjustment_type(&self) -> AdjustmentType { self.adjustment.as_ref().map(|a| a.kind).unwrap_or_default() }
    pub fn adjustment_percent(&self) -> Decimal { self.adjustment.as_ref().map(|a| a.percent.value()).unwrap_or_default() }
    pub fn adjustment_amount(&self) -> Decimal { self.adjustment.as_ref().map(|a| a.amount).unwrap_or_default() }
}

/// An adjustment applies only with a discount/surcharge kind and a strictly
/// positive percent; the percent is clamped into [0, 100] and a discount
/// never takes the total below zero.
pub fn compute_totals(items: &[LineItem], kind: Option<AdjustmentType>, percent: Option<Decimal>) -> OrderTotals {
    let subtotal = round_currency(items.iter().map(|i| i.subtotal).sum());
    let percent = percent.map(AdjustmentPercent::clamped).unwrap_or_else(AdjustmentPercent::zero);

    let adjustment = match kind {
        Some(kind @ (AdjustmentType::Discount | AdjustmentType::Surcharge)) if percent.is_positive() => {
            Some(AppliedAdjustment { kind, percent, amount: percent.of(subtotal) })
        }
        _ => None,
    };

    let total = match &adjustment {
        Some(AppliedAdjustment { kind: AdjustmentType::Discount, amount, .. }) => round_currency((subtotal - amount).max(Decimal::ZERO)),
        Some(AppliedAdjustment { amount, .. }) => round_currency(subtotal + amount),
        None => subtotal,
    };

    OrderTotals { subtotal, adjustment, total }
}
