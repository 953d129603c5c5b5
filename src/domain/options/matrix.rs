//! Size/color matrices
//!
//! A size/color option lists its values either as an explicit matrix
//! (`"S:Rojo|Azul"`, `"L:Verde"`) or as a flat list mixing size tokens and
//! colors (`["S", "M", "Rojo"]`). Flat lists cannot exclude a color for one
//! size only; that needs the matrix syntax.

use std::collections::BTreeMap;

const SIZE_TOKENS: [&str; 11] = ["XS", "S", "M", "L", "XL", "XXL", "XXXL", "U", "UNICO", "UNICA", "UNISEX"];

/// Letter sizes, "one size" markers, or 2-3 digit numeric sizes.
pub fn is_size_token(value: &str) -> bool {
    let normalized = value.trim().to_uppercase();
    SIZE_TOKENS.contains(&normalized.as_str())
        || ((2..=3).contains(&normalized.len()) && normalized.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SizeColorMatrix {
    colors_by_size: BTreeMap<String, Vec<String>>,
    has_matrix: bool,
}

impl SizeColorMatrix {
    pub fn parse<S: AsRef<str>>(values: &[S]) -> Self {
        let cleaned: Vec<&str> = values.iter().map(|v| v.as_ref().trim()).filter(|v| !v.is_empty()).collect();
        if cleaned.iter().any(|v| v.contains(':')) {
            Self::parse_matrix(&cleaned)
        } else {
            Self::parse_flat(&cleaned)
        }
    }

    fn parse_matrix(entries: &[&str]) -> Self {
        let mut colors_by_size = BTreeMap::new();
        for (size, colors) in entries.iter().filter_map(|entry| entry.split_once(':')) {
            let size = size.trim();
            if size.is_empty() { continue; }
            let colors = dedup(colors.split('|').map(str::trim).filter(|c| !c.is_empty()));
            // a repeated size replaces the earlier entry
            colors_by_size.insert(size.to_string(), colors);
        }
        Self { colors_by_size, has_matrix: true }
    }

    fn parse_flat(values: &[&str]) -> Self {
        let all = dedup(values.iter().copied());
        let sizes = dedup(values.iter().copied().filter(|v| is_size_token(v)));
        let colors = dedup(values.iter().copied().filter(|v| !is_size_token(v)));
        let sizes = if sizes.is_empty() { all.clone() } else { sizes };
        let colors = if colors.is_empty() { all } else { colors };
        let colors_by_size = sizes.into_iter().map(|size| (size, colors.clone())).collect();
        Self { colors_by_size, has_matrix: false }
    }

    pub fn has_matrix(&self) -> bool { self.has_matrix }
    pub fn sizes(&self) -> impl Iterator<Item = &str> { self.colors_by_size.keys().map(String::as_str) }
    pub fn colors_for(&self, size: &str) -> &[String] {
        self.colors_by_size.get(size).map(Vec::as_slice).unwrap_or_default()
    }
    pub fn allows(&self, size: &str, color: &str) -> bool { self.colors_for(size).iter().any(|c| c == color) }
}

fn dedup<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.iter().any(|v| v == value) { out.push(value.to_string()); }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_tokens() {
        assert!(is_size_token(" xl "));
        assert!(is_size_token("Unisex"));
        assert!(is_size_token("42"));
        assert!(is_size_token("105"));
        assert!(!is_size_token("4"));
        assert!(!is_size_token("1000"));
        assert!(!is_size_token("Rojo"));
    }

    #[test]
    fn test_explicit_matrix() {
        let matrix = SizeColorMatrix::parse(&["S:Rojo|Azul", "L:Verde"]);
        assert!(matrix.has_matrix());
        assert_eq!(matrix.colors_for("S"), ["Rojo", "Azul"]);
        assert_eq!(matrix.colors_for("L"), ["Verde"]);
        assert!(matrix.colors_for("M").is_empty());
    }

    #[test]
    fn test_matrix_dedups_and_skips_blank_sizes() {
        let matrix = SizeColorMatrix::parse(&[" S : Rojo | Rojo ||Azul", ":Verde", "M"]);
        assert_eq!(matrix.sizes().collect::<Vec<_>>(), ["S"]);
        assert_eq!(matrix.colors_for("S"), ["Rojo", "Azul"]);
    }

    #[test]
    fn test_flat_colors_only_fall_back_to_full_list() {
        let matrix = SizeColorMatrix::parse(&["Rojo", "Azul"]);
        assert!(!matrix.has_matrix());
        assert_eq!(matrix.sizes().collect::<Vec<_>>(), ["Azul", "Rojo"]);
        assert!(matrix.allows("Rojo", "Azul"));
        assert!(matrix.allows("Azul", "Azul"));
    }

    #[test]
    fn test_flat_mixed_sizes_and_colors() {
        let matrix = SizeColorMatrix::parse(&["S", "M", "Negro", "Blanco", "S"]);
        assert_eq!(matrix.sizes().collect::<Vec<_>>(), ["M", "S"]);
        assert!(matrix.allows("S", "Negro"));
        assert!(matrix.allows("M", "Blanco"));
        assert!(!matrix.allows("S", "M"));
        assert!(!matrix.allows("XL", "Negro"));
    }
}
