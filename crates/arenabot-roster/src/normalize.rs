//! Identifier normalization.

/// Normalizes free text into an identifier: lowercase ASCII letters and
/// digits only (`"Light Ball"` → `"lightball"`, `"Farfetch’d"` → `"farfetchd"`).
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Species whose names contain a hyphen that is not a forme separator.
const HYPHENATED_SPECIES: &[&str] = &[
    "ho-oh",
    "porygon-z",
    "jangmo-o",
    "hakamo-o",
    "kommo-o",
    "wo-chien",
    "chien-pao",
    "ting-lu",
    "chi-yu",
];

/// Normalized base species of a species name (`"Rotom-Wash"` → `"rotom"`).
pub fn base_species(species: &str) -> String {
    let lowered = species.trim().to_ascii_lowercase();
    if let Some(name) = HYPHENATED_SPECIES
        .iter()
        .find(|name| lowered.starts_with(**name))
    {
        return normalize(name);
    }
    normalize(lowered.split('-').next().unwrap_or(&lowered))
}
