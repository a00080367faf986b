//! Parsers for the string-encoded cells of the raw extract.
//!
//! Each function takes one raw cell and returns a structured value. They are
//! pure and deterministic; the only failures are [`FieldError`]s for input the
//! documented heuristics cannot handle.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{FieldError, FieldResult};

/// Separator between the bounds of an owners interval.
const OWNERS_SEPARATOR: &str = " .. ";

/// Markup fragments stripped from each language, applied in this order.
///
/// `/` runs before `[b]` so that a closing `[/b]` collapses into `[b]` and
/// is then removed.
const LANGUAGE_DENYLIST: &[&str] = &[
    "strong", "amp", "*", "&", "lt;", "gt;", "<", ">", ";", r"\/", "/", "br", "[b]",
];

/// A decade contraction such as `1990's`.
static DIGIT_APOSTROPHE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)'").expect("static regex is valid"));

/// Split an owners interval into its `(min, max)` bounds.
///
/// Thousands separators are removed but the bounds stay strings; numeric
/// coercion happens in the pipeline.
///
/// ```
/// use steametl::transform::fields::parse_owners_interval;
///
/// let (min, max) = parse_owners_interval("1,000,000 .. 2,000,000").unwrap();
/// assert_eq!((min.as_str(), max.as_str()), ("1000000", "2000000"));
/// ```
pub fn parse_owners_interval(raw: &str) -> FieldResult<(String, String)> {
    let bounds: Vec<String> = raw
        .split(OWNERS_SEPARATOR)
        .map(|bound| bound.replace(',', ""))
        .collect();

    match <[String; 2]>::try_from(bounds) {
        Ok([min, max]) => Ok((min, max)),
        Err(_) => Err(FieldError::OwnersInterval {
            value: raw.to_string(),
        }),
    }
}

/// Split a comma list and trim each element. Duplicates are kept.
pub fn parse_comma_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

/// Split and clean the supported-languages cell.
///
/// Markup is stripped from each element and `\r\n` runs collapse to a space.
/// Elements starting with `#` (untranslated locale keys) or `(` (footnotes
/// such as "(all with full audio support)") are dropped, as is
/// "not supported" in any case.
pub fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(clean_language)
        .filter(|lang| {
            !lang.starts_with('#')
                && !lang.starts_with('(')
                && !lang.eq_ignore_ascii_case("not supported")
        })
        .collect()
}

fn clean_language(raw: &str) -> String {
    let mut lang = raw.to_string();
    for fragment in LANGUAGE_DENYLIST {
        lang = lang.replace(fragment, "");
    }
    lang.replace("\r\n", " ").trim().to_string()
}

/// Repair and parse the tag-vote mapping, preserving source order.
///
/// The upstream value is a Python-style dict with single quotes. The repair is
/// a fixed sequence of substitutions, not a general quoting fixer:
///
/// 1. a digit followed by `'` loses the apostrophe (`1990's` -> `1990s`)
/// 2. `'Em Up` and `'em up` become `" Em Up"` (note the leading space)
/// 3. the delimiters `{'`, `':` and `, '` become double-quoted
///
/// Empty input, `nan` and the empty list `[]` yield no tags.
pub fn parse_tag_weighted_list(raw: &str) -> FieldResult<Vec<(String, i64)>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        return Ok(Vec::new());
    }

    let repaired = repair_tag_quotes(trimmed);
    let malformed = |message: String| FieldError::Tags {
        value: raw.to_string(),
        message,
    };

    let parsed: Value = serde_json::from_str(&repaired).map_err(|e| malformed(e.to_string()))?;

    match parsed {
        Value::Object(map) => map
            .into_iter()
            .map(|(tag, count)| match count.as_i64() {
                Some(count) => Ok((tag, count)),
                None => Err(malformed(format!("count for '{tag}' is not an integer"))),
            })
            .collect(),
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        other => Err(malformed(format!("expected a mapping, found {other}"))),
    }
}

fn repair_tag_quotes(raw: &str) -> String {
    DIGIT_APOSTROPHE
        .replace_all(raw, "${1}")
        .replace("'Em Up", " Em Up")
        .replace("'em up", " Em Up")
        .replace("{'", "{\"")
        .replace("':", "\":")
        .replace(", '", ", \"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owners_interval() {
        let (min, max) = parse_owners_interval("1,000,000 .. 2,000,000").unwrap();
        assert_eq!(min, "1000000");
        assert_eq!(max, "2000000");

        let (min, max) = parse_owners_interval("0 .. 20,000").unwrap();
        assert_eq!(min, "0");
        assert_eq!(max, "20000");
    }

    #[test]
    fn test_owners_interval_without_separator_fails() {
        let err = parse_owners_interval("20,000").unwrap_err();
        assert_eq!(
            err,
            FieldError::OwnersInterval {
                value: "20,000".to_string()
            }
        );
        assert!(parse_owners_interval("1 .. 2 .. 3").is_err());
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(
            parse_comma_list("Action, Indie,Strategy "),
            vec!["Action", "Indie", "Strategy"]
        );
        assert_eq!(parse_comma_list("Action, Action"), vec!["Action", "Action"]);
        assert_eq!(parse_comma_list("nan"), vec!["nan"]);
    }

    #[test]
    fn test_language_list_strips_and_filters() {
        assert_eq!(
            parse_language_list("English<strong>, #lang_spanish*, Not supported"),
            vec!["English"]
        );
    }

    #[test]
    fn test_language_list_encoded_markup() {
        let raw = "English&lt;strong&gt;*&lt;/strong&gt;, French, German&lt;br&gt;";
        assert_eq!(parse_language_list(raw), vec!["English", "French", "German"]);
    }

    #[test]
    fn test_language_list_bold_tags() {
        assert_eq!(parse_language_list("[b]English[/b], Italian"), vec!["English", "Italian"]);
    }

    #[test]
    fn test_language_list_collapses_crlf() {
        assert_eq!(
            parse_language_list("English\r\nInterface: English\r\nSubtitles"),
            vec!["English Interface: English Subtitles"]
        );
    }

    #[test]
    fn test_language_list_drops_footnotes() {
        assert_eq!(
            parse_language_list("English, (all with full audio support), Korean"),
            vec!["English", "Korean"]
        );
    }

    #[test]
    fn test_language_list_consecutive_matches_all_dropped() {
        // Mutating while iterating would skip the second of two adjacent matches.
        assert_eq!(
            parse_language_list("#lang_a, #lang_b, not supported, NOT SUPPORTED, Thai"),
            vec!["Thai"]
        );
    }

    #[test]
    fn test_tag_list_em_up_and_order() {
        let tags = parse_tag_weighted_list("{'Action': 100, 'Shoot 'Em Up': 50}").unwrap();
        assert_eq!(
            tags,
            vec![("Action".to_string(), 100), ("Shoot  Em Up".to_string(), 50)]
        );
    }

    #[test]
    fn test_tag_list_lowercase_em_up() {
        let tags = parse_tag_weighted_list("{'Beat 'em up': 7}").unwrap();
        assert_eq!(tags, vec![("Beat  Em Up".to_string(), 7)]);
    }

    #[test]
    fn test_tag_list_decades() {
        let tags = parse_tag_weighted_list("{'1990's': 12, 'Retro': 3}").unwrap();
        assert_eq!(tags, vec![("1990s".to_string(), 12), ("Retro".to_string(), 3)]);
    }

    #[test]
    fn test_tag_list_preserves_source_order() {
        let tags = parse_tag_weighted_list("{'Zombies': 1, 'Action': 2, 'Indie': 3}").unwrap();
        let names: Vec<&str> = tags.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, vec!["Zombies", "Action", "Indie"]);
    }

    #[test]
    fn test_tag_list_empty_forms() {
        assert!(parse_tag_weighted_list("").unwrap().is_empty());
        assert!(parse_tag_weighted_list("nan").unwrap().is_empty());
        assert!(parse_tag_weighted_list("[]").unwrap().is_empty());
        assert!(parse_tag_weighted_list("{}").unwrap().is_empty());
    }

    #[test]
    fn test_tag_list_unrepairable_fails() {
        let err = parse_tag_weighted_list("{'Action: 5}").unwrap_err();
        assert!(matches!(err, FieldError::Tags { .. }));

        let err = parse_tag_weighted_list("{'Action': 'lots'}").unwrap_err();
        assert!(matches!(err, FieldError::Tags { .. }));
    }
}
