//! Canonical language mapping.
//!
//! Steam lists regional variants ("Spanish - Latin America", "Portuguese -
//! Brazil") as separate languages. The dashboard groups them under one
//! canonical name.

/// Canonical languages, in match priority order.
///
/// The first entry contained in a label wins, so reordering this list
/// changes results for labels that mention more than one language.
pub const CANONICAL_LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "Portuguese",
    "French",
    "German",
    "Arabic",
    "Bulgarian",
    "Chinese",
    "Czech",
    "Danish",
    "Dutch",
    "Finnish",
    "Greek",
    "Hungarian",
    "Italian",
    "Japanese",
    "Korean",
    "Norwegian",
    "Polish",
    "Romanian",
    "Russian",
    "Swedish",
    "Thai",
    "Turkish",
    "Ukrainian",
    "Vietnamese",
];

/// Maps free-text language labels onto a fixed canonical list.
#[derive(Debug, Clone)]
pub struct LanguageNormalizer {
    canonical: Vec<String>,
    lowered: Vec<String>,
}

impl LanguageNormalizer {
    /// Build a normalizer over `canonical`, keeping its order.
    pub fn new<I, S>(canonical: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let canonical: Vec<String> = canonical.into_iter().map(Into::into).collect();
        let lowered = canonical.iter().map(|c| c.to_lowercase()).collect();
        Self { canonical, lowered }
    }

    /// The canonical list this normalizer matches against.
    pub fn canonical(&self) -> &[String] {
        &self.canonical
    }

    /// Return the first canonical name contained (case-insensitively) in
    /// `language`, or `language` itself when none is.
    pub fn normalize(&self, language: &str) -> String {
        let lowered = language.to_lowercase();
        self.lowered
            .iter()
            .position(|candidate| lowered.contains(candidate.as_str()))
            .map(|idx| self.canonical[idx].clone())
            .unwrap_or_else(|| language.to_string())
    }
}

impl Default for LanguageNormalizer {
    fn default() -> Self {
        Self::new(CANONICAL_LANGUAGES.iter().copied())
    }
}

/// One-shot form of [`LanguageNormalizer::normalize`] over an explicit list.
pub fn normalize_language(language: &str, canonical: &[&str]) -> String {
    let lowered = language.to_lowercase();
    canonical
        .iter()
        .find(|candidate| lowered.contains(&candidate.to_lowercase()))
        .map(|candidate| (*candidate).to_string())
        .unwrap_or_else(|| language.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_variant() {
        let normalizer = LanguageNormalizer::default();
        assert_eq!(normalizer.normalize("Spanish - Latin America"), "Spanish");
        assert_eq!(normalizer.normalize("Portuguese - Brazil"), "Portuguese");
        assert_eq!(normalizer.normalize("Simplified Chinese"), "Chinese");
    }

    #[test]
    fn test_case_insensitive() {
        let normalizer = LanguageNormalizer::default();
        assert_eq!(normalizer.normalize("ENGLISH"), "English");
        assert_eq!(normalizer.normalize("french"), "French");
    }

    #[test]
    fn test_unmatched_passes_through() {
        let normalizer = LanguageNormalizer::default();
        assert_eq!(normalizer.normalize("Klingon"), "Klingon");
        assert_eq!(normalizer.normalize(""), "");
    }

    #[test]
    fn test_earliest_entry_wins() {
        let normalizer = LanguageNormalizer::default();
        // Mentions both; English is listed first.
        assert_eq!(normalizer.normalize("German Interface: English"), "English");

        let reversed = LanguageNormalizer::new(["German", "English"]);
        assert_eq!(reversed.normalize("German Interface: English"), "German");
    }

    #[test]
    fn test_free_function_matches_struct() {
        for label in ["Spanish - Spain", "Klingon", "traditional chinese"] {
            assert_eq!(
                normalize_language(label, CANONICAL_LANGUAGES),
                LanguageNormalizer::default().normalize(label)
            );
        }
    }

    #[test]
    fn test_canonical_list_shape() {
        assert_eq!(CANONICAL_LANGUAGES.len(), 26);
        assert_eq!(CANONICAL_LANGUAGES[0], "English");
        assert_eq!(CANONICAL_LANGUAGES[25], "Vietnamese");
    }
}
