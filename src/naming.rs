//! Naming convention inference and candidate type names.
//!
//! REST APIs rarely declare which response property identifies which resource.
//! The resolver recovers that from names instead: `accountId` in
//! `/accounts/{accountId}` is the `id` of an `account`. This module splits
//! identifiers into words under an inferred [`NamingConvention`] and derives
//! the ranked candidate type names used to match producers with consumers.
//!
//! # Examples
//!
//! ```rust
//! use apichain_cli::naming::{NamingConvention, infer_convention, split_words};
//!
//! assert_eq!(infer_convention("accountId"), NamingConvention::CamelCase);
//! assert_eq!(split_words("accountId", NamingConvention::CamelCase), vec!["account", "id"]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::SINGULAR_EXCEPTIONS;

/// Word separation convention of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    CamelCase,
    PascalCase,
    HyphenSeparator,
    UnderscoreSeparator,
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CamelCase => "camel_case",
            Self::PascalCase => "pascal_case",
            Self::HyphenSeparator => "hyphen_separator",
            Self::UnderscoreSeparator => "underscore_separator",
        };
        f.write_str(name)
    }
}

/// Classify an identifier by character classes.
///
/// Mixed case starting upper-case is Pascal, mixed case otherwise is camel.
/// Single-case identifiers are underscore- or hyphen-separated when they contain
/// that separator, and camel case otherwise.
#[must_use]
pub fn infer_convention(identifier: &str) -> NamingConvention {
    let has_upper = identifier.chars().any(char::is_uppercase);
    let has_lower = identifier.chars().any(char::is_lowercase);

    if has_upper && has_lower {
        if identifier.chars().next().is_some_and(char::is_uppercase) {
            NamingConvention::PascalCase
        } else {
            NamingConvention::CamelCase
        }
    } else if identifier.contains('_') {
        NamingConvention::UnderscoreSeparator
    } else if identifier.contains('-') {
        NamingConvention::HyphenSeparator
    } else {
        NamingConvention::CamelCase
    }
}

/// Split an identifier into lower-case words.
///
/// Hyphens always separate words regardless of the declared convention.
#[must_use]
pub fn split_words(identifier: &str, convention: NamingConvention) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in identifier.split('-').filter(|c| !c.is_empty()) {
        match convention {
            NamingConvention::UnderscoreSeparator => {
                words.extend(
                    chunk.split('_').filter(|w| !w.is_empty()).map(str::to_lowercase),
                );
            }
            NamingConvention::HyphenSeparator => words.push(chunk.to_lowercase()),
            NamingConvention::CamelCase | NamingConvention::PascalCase => {
                for part in chunk.split('_').filter(|w| !w.is_empty()) {
                    words.extend(split_case_boundaries(part));
                }
            }
        }
    }
    words
}

/// Split on lower→upper transitions, keeping acronym runs together
/// (`VMScaleSet` → `vm`, `scale`, `set`).
fn split_case_boundaries(part: &str) -> Vec<String> {
    let chars: Vec<char> = part.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let boundary = i > 0
            && c.is_uppercase()
            && (chars[i - 1].is_lowercase()
                || chars[i - 1].is_ascii_digit()
                || (chars[i - 1].is_uppercase()
                    && chars.get(i + 1).is_some_and(|n| n.is_lowercase())));
        if boundary && !current.is_empty() {
            words.push(current.to_lowercase());
            current.clear();
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current.to_lowercase());
    }
    words
}

/// Join lower-case words under a convention.
#[must_use]
pub fn join_words(words: &[String], convention: NamingConvention) -> String {
    match convention {
        NamingConvention::UnderscoreSeparator => words.join("_"),
        NamingConvention::HyphenSeparator => words.join("-"),
        NamingConvention::CamelCase => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
            .collect(),
        NamingConvention::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Remove a trailing plural from a lower-case word.
#[must_use]
pub fn singularize(word: &str) -> String {
    if SINGULAR_EXCEPTIONS.contains(&word) || word.len() <= 2 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies")
        && !stem.is_empty()
    {
        return format!("{stem}y");
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    word.strip_suffix('s').map_or_else(|| word.to_string(), str::to_string)
}

/// Normalized comparison key of a type name: its words, lower-cased, concatenated.
///
/// `virtual-machine`, `virtualMachine` and `virtual_machine` share a key.
#[must_use]
pub fn type_key(type_name: &str) -> String {
    split_words(type_name, infer_convention(type_name)).concat()
}

/// Whether two type names denote the same type.
#[must_use]
pub fn same_type(a: &str, b: &str) -> bool {
    type_key(a) == type_key(b)
}

/// Ranked candidate type names for a resource, most specific first.
///
/// * container, no nested body container: the singularized container name;
/// * nested body container: every suffix and every proper prefix of the
///   singularized container words, longer candidates first, with the single
///   trailing word last;
/// * no container: the resource's own words minus the final word
///   (`accountId` → `account`).
#[must_use]
pub fn candidate_type_names(
    container: Option<&str>,
    convention: NamingConvention,
    has_body_container: bool,
    resource_words: &[String],
) -> Vec<String> {
    let Some(container) = container else {
        if resource_words.len() < 2 {
            return Vec::new();
        }
        let primary = &resource_words[..resource_words.len() - 1];
        return vec![join_words(primary, convention)];
    };

    let words: Vec<String> = split_words(container, infer_convention(container))
        .iter()
        .map(|w| singularize(w))
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    if !has_body_container {
        return vec![join_words(&words, convention)];
    }

    // (word count, is_suffix, name); suffixes sort after prefixes of equal
    // length so the trailing word is the least specific candidate.
    let mut ranked: Vec<(usize, bool, String)> = Vec::new();
    for start in 0..words.len() {
        ranked.push((words.len() - start, true, join_words(&words[start..], convention)));
    }
    for end in 1..words.len() {
        ranked.push((end, false, join_words(&words[..end], convention)));
    }
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut names: Vec<String> = Vec::new();
    for (_, _, name) in ranked {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Name a producer is expected to carry for this resource.
///
/// When the resource's words start with one of its candidate types, the
/// remainder is the producer-side name (`accountId` of type `account` → `id`).
/// Otherwise the resource name itself is expected.
#[must_use]
pub fn producer_parameter_name(
    resource_name: &str,
    convention: NamingConvention,
    candidate_types: &[String],
) -> String {
    let words = split_words(resource_name, convention);
    for candidate in candidate_types {
        let type_words = split_words(candidate, infer_convention(candidate));
        if !type_words.is_empty()
            && words.len() > type_words.len()
            && words.starts_with(&type_words)
        {
            return join_words(&words[type_words.len()..], convention);
        }
    }
    resource_name.to_string()
}
