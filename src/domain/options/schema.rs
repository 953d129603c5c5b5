//! Option schema normalization
//!
//! Products store their options as free-form JSON. Anything that does not
//! look like `{ "name": "...", "values": ["..."] }` is dropped rather than
//! rejected, so malformed data means "this option does not exist".

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

impl ProductOption {
    /// An option without values accepts any non-blank selection.
    pub fn is_unconstrained(&self) -> bool { self.values.is_empty() }
}

pub fn normalize_options(raw: &Value) -> Vec<ProductOption> {
    let Some(entries) = raw.as_array() else { return vec![] };
    entries.iter().filter_map(normalize_option).collect()
}

fn normalize_option(entry: &Value) -> Option<ProductOption> {
    let object = entry.as_object()?;
    let name = object.get("name").and_then(Value::as_str).map(str::trim).unwrap_or_default();
    if name.is_empty() { return None; }

    let values = object
        .get("values")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ProductOption { name: name.to_string(), values })
}
