//! Attribute selection validation
//!
//! Every option in a product's schema is required. Options whose name
//! mentions both "talle" and "color" take a compound `SIZE|COLOR` value
//! checked against the option's [`SizeColorMatrix`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::matrix::SizeColorMatrix;
use super::schema::ProductOption;
use crate::{Result, SalesError};

pub fn is_size_color_option(name: &str) -> bool {
    let normalized = name.to_lowercase();
    normalized.contains("talle") && normalized.contains("color")
}

/// Decoded value of a compound size/color option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizeColor {
    pub size: String,
    pub color: String,
}

impl SizeColor {
    pub fn new(size: impl Into<String>, color: impl Into<String>) -> Self {
        Self { size: size.into(), color: color.into() }
    }

    /// Anything after a second pipe is ignored; no pipe means no color.
    pub fn decode(value: &str) -> Self {
        let mut parts = value.split('|');
        let size = parts.next().unwrap_or_default().trim();
        let color = parts.next().unwrap_or_default().trim();
        Self::new(size, color)
    }

    pub fn encode(&self) -> String { format!("{}|{}", self.size, self.color) }

    pub fn is_complete(&self) -> bool { !self.size.is_empty() && !self.color.is_empty() }
}

/// Caller supplied `name -> value` pairs for one line item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeSelection(HashMap<String, String>);

impl AttributeSelection {
    /// Trims both sides, drops blank entries, last duplicate wins.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
    {
        pairs.into_iter().fold(Self::default(), |selection, pair| match pair {
            (Some(name), Some(value)) => selection.with(name, value),
            _ => selection,
        })
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        let (name, value) = (name.trim(), value.trim());
        if !name.is_empty() && !value.is_empty() { self.0.insert(name.to_string(), value.to_string()); }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> { self.0.get(name).map(String::as_str) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAttribute {
    pub name: String,
    pub value: String,
}

/// Checks `selection` against `options` and returns the canonical attributes
/// in schema order, skipping options that resolved to nothing.
pub fn validate_selection(product_name: &str, options: &[ProductOption], selection: &AttributeSelection) -> Result<Vec<ResolvedAttribute>> {
    let missing: Vec<String> = options
        .iter()
        .filter(|option| match selection.get(&option.name) {
            None => true,
            Some(value) if is_size_color_option(&option.name) => !SizeColor::decode(value).is_complete(),
            Some(_) => false,
        })
        .map(|option| option.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(SalesError::MissingOptions { product: product_name.to_string(), options: missing });
    }

    let invalid = options.iter().find(|option| {
        let Some(value) = selection.get(&option.name) else { return false };
        if is_size_color_option(&option.name) {
            let SizeColor { size, color } = SizeColor::decode(value);
            !SizeColorMatrix::parse(option.values.as_slice()).allows(&size, &color)
        } else {
            !option.is_unconstrained() && !option.values.iter().any(|v| v == value)
        }
    });
    if let Some(option) = invalid {
        return Err(SalesError::InvalidAttribute { product: product_name.to_string(), option: option.name.clone() });
    }

    Ok(options
        .iter()
        .filter_map(|option| {
            let value = selection.get(&option.name).unwrap_or_default();
            let value = if is_size_color_option(&option.name) {
                let decoded = SizeColor::decode(value);
                if decoded.is_complete() { format!("{} / {}", decoded.size, decoded.color) } else { value.to_string() }
            } else {
                value.to_string()
            };
            (!value.is_empty()).then(|| ResolvedAttribute { name: option.name.clone(), value })
        })
        .collect())
}

/// `"Remera | Talle y color: S / Rojo, Corte: Slim"`, or just the name.
pub fn render_label(product_name: &str, attributes: &[ResolvedAttribute]) -> String {
    if attributes.is_empty() { return product_name.to_string(); }
    let rendered: Vec<String> = attributes.iter().map(|a| format!("{}: {}", a.name, a.value)).collect();
    format!("{} | {}", product_name, rendered.join(", "))
}
