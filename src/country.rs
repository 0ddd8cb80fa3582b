//! Country name normalization.
//!
//! Maps common aliases (case-insensitive) to canonical display names so the
//! reporting-country exclusion in the synthesizer compares like with like.
//! Unmapped input passes through unchanged.

const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("usa", "United States"),
    ("india", "India"),
    ("germany", "Germany"),
    ("uk", "United Kingdom"),
    ("united kingdom", "United Kingdom"),
    ("china", "China"),
    ("japan", "Japan"),
    ("eu", "European Union"),
];

/// Normalize a country name to its canonical display form.
pub fn normalize_country_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_map_to_canonical_names() {
        assert_eq!(normalize_country_name("usa"), "United States");
        assert_eq!(normalize_country_name("USA"), "United States");
        assert_eq!(normalize_country_name("uk"), "United Kingdom");
        assert_eq!(normalize_country_name("United Kingdom"), "United Kingdom");
        assert_eq!(normalize_country_name("eu"), "European Union");
    }

    #[test]
    fn unmapped_names_pass_through() {
        assert_eq!(normalize_country_name("Brazil"), "Brazil");
        assert_eq!(normalize_country_name("Atlantis"), "Atlantis");
    }

    #[test]
    fn whitespace_is_trimmed_for_lookup() {
        assert_eq!(normalize_country_name("  india "), "India");
    }
}
