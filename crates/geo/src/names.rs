//! Street-name normalization and intersection display names.
//!
//! Source datasets spell intersections in many ways: a single combined field
//! ("Main St / Elm St"), two separate street fields, or just one street name.
//! [`resolve_intersection_name`] walks an explicit precedence list of
//! [`NameSource`]s and returns the first one that yields a name.

use crate::feature::Properties;
use once_cell::sync::Lazy;
use regex::Regex;

/// Label used when no name can be derived.
pub const UNNAMED_INTERSECTION: &str = "Unnamed Intersection";

/// `/`, `&` or the word "and", with surrounding whitespace.
static DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:/|&|\band\b)\s*").unwrap());

const DIRECTIONS: &[&str] = &["n", "s", "e", "w", "north", "south", "east", "west"];

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("st", "Street"),
    ("ave", "Avenue"),
    ("av", "Avenue"),
    ("rd", "Road"),
    ("blvd", "Boulevard"),
    ("dr", "Drive"),
    ("ln", "Lane"),
];

/// One way of reading a name out of a feature's properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource<'a> {
    /// A field holding both streets, e.g. "Main St & Elm St"
    Combined(&'a str),
    /// Two fields holding one street each
    Paired(&'a str, &'a str),
    /// A field holding a single street (or an embedded pair)
    Single(&'a str),
}

/// Tried before any caller-supplied field, in this order.
pub const STRUCTURED_SOURCES: &[NameSource<'static>] = &[
    NameSource::Combined("intersection"),
    NameSource::Combined("intersection_name"),
    NameSource::Combined("cross_streets"),
    NameSource::Combined("xstreet"),
    NameSource::Paired("street1", "street2"),
    NameSource::Paired("street_1", "street_2"),
    NameSource::Paired("st_name_1", "st_name_2"),
    NameSource::Paired("on_street", "cross_street"),
    NameSource::Paired("primary_street", "cross_street"),
    NameSource::Paired("from_street", "to_street"),
    NameSource::Paired("road1", "road2"),
];

/// Tried after caller-supplied fields, in this order.
pub const FALLBACK_SOURCES: &[NameSource<'static>] = &[
    NameSource::Single("name"),
    NameSource::Single("street"),
    NameSource::Single("road"),
    NameSource::Single("st_name"),
    NameSource::Single("label"),
];

impl NameSource<'_> {
    /// The display name this source yields for `properties`, if any.
    pub fn extract(&self, properties: &Properties) -> Option<String> {
        match *self {
            NameSource::Combined(field) | NameSource::Single(field) => {
                properties.get(field).map(format_combined)
            }
            NameSource::Paired(first, second) => {
                let first = properties.get(first)?;
                let second = properties.get(second)?;
                Some(join_pair(&normalize_name(first), &normalize_name(second)))
            }
        }
    }
}

/// Derive a "Street A & Street B" label from a feature's properties.
///
/// Precedence: [`STRUCTURED_SOURCES`], then each of `candidate_fields` as a
/// single field, then [`FALLBACK_SOURCES`], then [`UNNAMED_INTERSECTION`].
/// Empty values count as absent. Never fails.
///
/// # Example
/// ```
/// use crossroads_geo::{resolve_intersection_name, Properties};
///
/// let props: Properties = [("INTERSECTION", "KING ST W / bay  st")].into_iter().collect();
/// assert_eq!(resolve_intersection_name(&props, &[]), "King St W & Bay St");
///
/// let props: Properties = [("street1", "Queen St"), ("street2", "")].into_iter().collect();
/// assert_eq!(resolve_intersection_name(&props, &["street1"]), "Queen St");
/// ```
pub fn resolve_intersection_name(properties: &Properties, candidate_fields: &[&str]) -> String {
    STRUCTURED_SOURCES
        .iter()
        .copied()
        .chain(candidate_fields.iter().map(|field| NameSource::Single(*field)))
        .chain(FALLBACK_SOURCES.iter().copied())
        .find_map(|source| source.extract(properties))
        .unwrap_or_else(|| UNNAMED_INTERSECTION.to_string())
}

/// Split on `/`, `&` or "and" when that gives exactly two streets; otherwise
/// the whole value is normalized.
fn format_combined(value: &str) -> String {
    match split_pair(value) {
        Some((first, second)) => join_pair(&normalize_name(first), &normalize_name(second)),
        None => normalize_name(value),
    }
}

fn split_pair(value: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = DELIMITER
        .split(value)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    match parts.as_slice() {
        [first, second] => Some((*first, *second)),
        _ => None,
    }
}

pub(crate) fn join_pair(first: &str, second: &str) -> String {
    format!("{} & {}", first, second)
}

/// Trim, collapse whitespace and title-case.
///
/// ```
/// use crossroads_geo::normalize_name;
///
/// assert_eq!(normalize_name("  MAIN   st "), "Main St");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Base identity of a street name.
///
/// Strips trailing directions (N/S/E/W and spelled out) while more than one
/// word remains, expands common suffix abbreviations and title-cases, so
/// "main st n" and "Main Street North" share the base "Main Street". A
/// leading "St" of a multi-word name is left alone ("St Clair Ave").
///
/// ```
/// use crossroads_geo::base_street_name;
///
/// assert_eq!(base_street_name("main st n"), "Main Street");
/// assert_eq!(base_street_name("Main Street North"), "Main Street");
/// assert_eq!(base_street_name("St Clair Ave W"), "St Clair Avenue");
/// ```
pub fn base_street_name(name: &str) -> String {
    let mut words: Vec<&str> = name.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| is_direction(w)) {
        words.pop();
    }

    let single = words.len() == 1;
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i > 0 || single {
                if let Some(expanded) = expand_abbreviation(word) {
                    return expanded.to_string();
                }
            }
            title_case(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn bare(word: &str) -> String {
    word.trim_end_matches('.').to_ascii_lowercase()
}

fn is_direction(word: &str) -> bool {
    DIRECTIONS.contains(&bare(word).as_str())
}

fn expand_abbreviation(word: &str) -> Option<&'static str> {
    let key = bare(word);
    ABBREVIATIONS
        .iter()
        .find(|(abbreviation, _)| *abbreviation == key)
        .map(|(_, expanded)| *expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("main street"), "Main Street");
        assert_eq!(normalize_name("  ELM\t ST  "), "Elm St");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent_for_normalized_name() {
        assert_eq!(normalize_name("Main Street"), "Main Street");
        assert_eq!(base_street_name("Main Street"), "Main Street");
    }

    #[test]
    fn test_base_street_name() {
        assert_eq!(base_street_name("Main St N"), "Main Street");
        assert_eq!(base_street_name("main st. north"), "Main Street");
        assert_eq!(base_street_name("Bloor Ave E"), "Bloor Avenue");
        assert_eq!(base_street_name("Dundas Rd"), "Dundas Road");
        assert_eq!(base_street_name("North"), "North");
        assert_eq!(base_street_name("West Mall W"), "West Mall");
        assert_eq!(base_street_name(""), "");
    }

    #[test]
    fn test_combined_field_split() {
        for combined in ["Main St & Elm St", "main st/elm st", "Main St and Elm St"] {
            let name = resolve_intersection_name(&props(&[("intersection", combined)]), &[]);
            assert_eq!(name, "Main St & Elm St", "from {:?}", combined);
        }
    }

    #[test]
    fn test_combined_field_without_pair_is_kept_whole() {
        let p = props(&[("intersection", "Main St / Elm St / Oak Ave")]);
        assert_eq!(resolve_intersection_name(&p, &[]), "Main St / Elm St / Oak Ave");

        let p = props(&[("intersection", "anderson ave")]);
        assert_eq!(resolve_intersection_name(&p, &[]), "Anderson Ave");
    }

    #[test]
    fn test_paired_fields() {
        let p = props(&[("street1", "main st"), ("street2", "ELM ST")]);
        assert_eq!(resolve_intersection_name(&p, &[]), "Main St & Elm St");

        let p = props(&[("ON_STREET", "Yonge St"), ("CROSS_STREET", "Bloor St")]);
        assert_eq!(resolve_intersection_name(&p, &[]), "Yonge St & Bloor St");
    }

    #[test]
    fn test_half_pair_falls_through() {
        let p = props(&[("street1", "Main St"), ("street2", " "), ("name", "Fallback")]);
        assert_eq!(resolve_intersection_name(&p, &[]), "Fallback");
    }

    #[test]
    fn test_combined_beats_paired() {
        let p = props(&[("street1", "A St"), ("street2", "B St"), ("intersection", "C St & D St")]);
        assert_eq!(resolve_intersection_name(&p, &[]), "C St & D St");
    }

    #[test]
    fn test_caller_fields_precede_fallbacks() {
        let p = props(&[("name", "Generic"), ("LF_NAME", "Queen St W")]);
        assert_eq!(resolve_intersection_name(&p, &["LF_NAME"]), "Queen St W");
        assert_eq!(resolve_intersection_name(&p, &["missing"]), "Generic");
    }

    #[test]
    fn test_single_field_with_delimiter() {
        let p = props(&[("name", "king st w & spadina ave")]);
        assert_eq!(resolve_intersection_name(&p, &[]), "King St W & Spadina Ave");
    }

    #[test]
    fn test_unnamed() {
        assert_eq!(resolve_intersection_name(&Properties::new(), &[]), UNNAMED_INTERSECTION);
        assert_eq!(
            resolve_intersection_name(&props(&[("name", "   ")]), &["name"]),
            UNNAMED_INTERSECTION
        );
    }

    #[test]
    fn test_precedence_order_is_explicit() {
        assert_eq!(STRUCTURED_SOURCES[0], NameSource::Combined("intersection"));
        assert!(matches!(STRUCTURED_SOURCES[4], NameSource::Paired("street1", "street2")));
        assert_eq!(FALLBACK_SOURCES[0], NameSource::Single("name"));
    }

    proptest! {
        #[test]
        fn prop_base_street_name_is_idempotent(name in "[a-zA-Z. ]{0,40}") {
            let once = base_street_name(&name);
            prop_assert_eq!(base_street_name(&once), once.clone());
        }

        #[test]
        fn prop_normalize_name_is_idempotent(name in "[a-zA-Z ]{0,40}") {
            let once = normalize_name(&name);
            prop_assert_eq!(normalize_name(&once), once.clone());
        }
    }
}
