//! Product catalog view
//!
//! Sale generation only needs a read-only snapshot of each product: its
//! display name, current unit price and the raw option JSON as stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::options::{normalize_options, ProductOption};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub options: Value,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self { id: id.into(), name: name.into(), unit_price, options: Value::Array(vec![]) }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    pub fn option_schema(&self) -> Vec<ProductOption> { normalize_options(&self.options) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_option_schema_is_normalized() {
        let p = Product::new("p1", "Remera", dec!(19.99)).with_options(json!([{ "name": " Talle ", "values": ["S"] }, "bad"]));
        let schema = p.option_schema();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].name, "Talle");
    }
}
