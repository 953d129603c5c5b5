//! Product option schemas and attribute selections
pub mod schema;
pub mod matrix;
pub mod selection;

pub use schema::{normalize_options, ProductOption};
pub use matrix::{is_size_token, SizeColorMatrix};
pub use selection::{is_size_color_option, render_label, validate_selection, AttributeSelection, ResolvedAttribute, SizeColor};
