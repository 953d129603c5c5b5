//! Request payloads accepted by the HTTP surface

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{AdjustmentType, ManualSale, PaymentStatus, SaleChanges, SaleStatus};
use crate::domain::options::AttributeSelection;
use crate::domain::services::{ItemRequest, PaymentSimulation, SaleDraft};
use crate::domain::value_objects::has_currency_precision;
use crate::{Result, SalesError};

fn currency_precision(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if has_currency_precision(*value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("precision");
        err.message = Some("At most two decimal places are allowed".into());
        Err(err)
    }
}

fn non_negative_amount(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount must not be negative".into());
        return Err(err);
    }
    currency_precision(value)
}

/// Trimmed category name, at least two characters long.
pub fn category_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.chars().count() < 2 {
        return Err(SalesError::Validation("category name must have at least 2 characters".into()));
    }
    Ok(name.to_string())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSaleRequest {
    pub customer_name: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[serde(default)]
    #[validate]
    pub items: Vec<SaleItemRequest>,
    pub adjustment_type: Option<AdjustmentType>,
    #[validate(custom = "currency_precision")]
    pub adjustment_percent: Option<Decimal>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub payment_simulation: Option<PaymentSimulation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1, max = 2147483647))]
    pub quantity: u32,
    #[serde(default)]
    pub attributes: Vec<AttributeInput>,
}

impl SaleItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self { product_id: product_id.into(), quantity, attributes: vec![] }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(AttributeInput { name: Some(name.into()), value: Some(value.into()) });
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeInput {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl From<&SaleItemRequest> for ItemRequest {
    fn from(item: &SaleItemRequest) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            selection: AttributeSelection::from_pairs(item.attributes.iter().map(|a| (a.name.as_deref(), a.value.as_deref()))),
        }
    }
}

impl From<&GenerateSaleRequest> for SaleDraft {
    fn from(r: &GenerateSaleRequest) -> Self {
        Self {
            customer_name: r.customer_name.clone(),
            customer_email: r.customer_email.clone(),
            items: r.items.iter().map(ItemRequest::from).collect(),
            adjustment_type: r.adjustment_type,
            adjustment_percent: r.adjustment_percent,
            payment_method: r.payment_method.clone(),
            shipping_address: r.shipping_address.clone(),
            tracking_number: r.tracking_number.clone(),
            notes: r.notes.clone(),
            payment_simulation: r.payment_simulation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[validate(length(min = 1))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(custom = "non_negative_amount")]
    pub total: Decimal,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    #[validate(length(min = 1))]
    pub payment_method: String,
    #[validate(length(min = 1))]
    pub shipping_address: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateSaleRequest> for ManualSale {
    fn from(r: CreateSaleRequest) -> Self {
        Self {
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            total: r.total,
            status: r.status,
            payment_status: r.payment_status,
            payment_method: r.payment_method,
            shipping_address: r.shipping_address,
            tracking_number: r.tracking_number,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    #[validate(length(min = 1))]
    pub customer_name: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[validate(custom = "non_negative_amount")]
    pub total: Option<Decimal>,
    pub status: Option<SaleStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateSaleRequest> for SaleChanges {
    fn from(r: UpdateSaleRequest) -> Self {
        Self {
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            total: r.total,
            status: r.status,
            payment_status: r.payment_status,
            payment_method: r.payment_method,
            shipping_address: r.shipping_address,
            tracking_number: r.tracking_number,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleStatusRequest {
    pub status: SaleStatus,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    pub search: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category_id: String,
    #[validate(custom = "non_negative_amount")]
    pub price: Decimal,
    #[serde(default)]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category_id: Option<String>,
    #[validate(custom = "non_negative_amount")]
    pub price: Option<Decimal>,
    pub options: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 2))]
    pub name: String,
    #[validate(range(min = 0))]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 2))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub position: Option<i32>,
}
