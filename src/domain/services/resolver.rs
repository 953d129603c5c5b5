//! Line item resolution
//!
//! All-or-nothing: one unknown product or one rejected selection aborts the
//! whole batch.

use std::collections::HashMap;

use crate::domain::aggregates::{LineItem, Product};
use crate::domain::options::{render_label, validate_selection, AttributeSelection};
use crate::domain::value_objects::Quantity;
use crate::{Result, SalesError};

/// One requested line: a product reference, a quantity and the chosen attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemRequest {
    pub product_id: String,
    pub quantity: u32,
    pub selection: AttributeSelection,
}

impl ItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self { product_id: product_id.into(), quantity, selection: AttributeSelection::default() }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.selection = self.selection.with(name, value);
        self
    }
}

/// Distinct product ids in first-seen order, for a single batched lookup.
pub fn requested_product_ids(items: &[ItemRequest]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !ids.contains(&item.product_id) { ids.push(item.product_id.clone()); }
    }
    ids
}

pub fn resolve_items(items: &[ItemRequest], products: &HashMap<String, Product>) -> Result<Vec<LineItem>> {
    if let Some(missing) = requested_product_ids(items).into_iter().find(|id| !products.contains_key(id)) {
        return Err(SalesError::ProductNotFound(missing));
    }

    items
        .iter()
        .map(|item| {
            let product = products.get(&item.product_id).ok_or_else(|| SalesError::ProductNotFound(item.product_id.clone()))?;
            let quantity = Quantity::new(item.quantity).map_err(|_| SalesError::InvalidQuantity(item.quantity))?;
            let attributes = validate_selection(&product.name, &product.option_schema(), &item.selection)?;
            Ok(LineItem::new(&product.id, render_label(&product.name, &attributes), product.unit_price, quantity))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn catalog() -> HashMap<String, Product> {
        [
            Product::new("remera", "Remera", dec!(100.00))
                .with_options(json!([{ "name": "Talle y color", "values": ["S:Rojo", "L:Azul"] }])),
            Product::new("gorra", "Gorra", dec!(50.005)),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect()
    }

    #[test]
    fn test_requested_ids_are_deduplicated_in_order() {
        let items = [ItemRequest::new("b", 1), ItemRequest::new("a", 1), ItemRequest::new("b", 2)];
        assert_eq!(requested_product_ids(&items), ["b", "a"]);
    }

    #[test]
    fn test_resolves_in_input_order_with_labels() {
        let items = [
            ItemRequest::new("gorra", 1),
            ItemRequest::new("remera", 2).with_attribute("Talle y color", "S|Rojo"),
        ];
        let resolved = resolve_items(&items, &catalog()).unwrap();
        assert_eq!(resolved[0].product_label, "Gorra");
        assert_eq!(resolved[0].subtotal, dec!(50.01));
        assert_eq!(resolved[1].product_label, "Remera | Talle y color: S / Rojo");
        assert_eq!(resolved[1].subtotal, dec!(200.00));
    }

    #[test]
    fn test_missing_product_aborts_whole_batch() {
        let items = [ItemRequest::new("gorra", 1), ItemRequest::new("zapatilla", 1)];
        match resolve_items(&items, &catalog()) {
            Err(SalesError::ProductNotFound(id)) => assert_eq!(id, "zapatilla"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_attribute_names_option_and_product() {
        let err = resolve_items(&[ItemRequest::new("remera", 1)], &catalog()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Talle y color"));
        assert!(message.contains("Remera"));
    }

    #[test]
    fn test_out_of_range_quantity_rejected() {
        assert!(matches!(resolve_items(&[ItemRequest::new("gorra", 0)], &catalog()), Err(SalesError::InvalidQuantity(0))));
        let huge = u32::MAX;
        assert!(matches!(resolve_items(&[ItemRequest::new("gorra", huge)], &catalog()), Err(SalesError::InvalidQuantity(q)) if q == huge));
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        assert!(resolve_items(&[], &catalog()).unwrap().is_empty());
    }
}
