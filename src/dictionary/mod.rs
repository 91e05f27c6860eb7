//! Mutations dictionary and uuid-suffix generation.
//!
//! The mutations dictionary holds user-supplied values the fuzzer substitutes
//! for parameters, plus generated "uuid-suffix" entries for resources whose
//! name must be fresh on every invocation (a PUT that creates its own id, or a
//! body `id` mirroring a sibling `name`).
//!
//! The dictionary is an owned value threaded through extraction by move: every
//! operation that may add an entry takes `self` and hands back the updated
//! dictionary, so the most recently returned value always supersedes earlier
//! ones. Entries are only ever added.
//!
//! # File Format
//!
//! ```json
//! {
//!   "restler_fuzzable_string": ["fuzzstring"],
//!   "restler_custom_payload": { "apiVersion": ["2024-01-01"] },
//!   "restler_custom_payload_header": { "x-tenant": ["contoso"] },
//!   "restler_custom_payload_uuid4_suffix": { "storeId": "storeid" }
//! }
//! ```
//!
//! Keys of the custom payload maps are resource names or JSON-pointer access
//! paths (`/properties/id`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::constants::UUID_SUFFIX_PREFIX_MAX_LEN;
use crate::core::ApichainError;
use crate::grammar::{CustomPayloadType, PrimitiveType, normalize_endpoint};

/// A value taken from the mutations dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DictionaryPayload {
    pub payload_type: CustomPayloadType,
    pub primitive_type: PrimitiveType,
    /// Dictionary key the value is stored under.
    pub name: String,
    pub is_object: bool,
}

/// Literal and generated values keyed the way the fuzzing engine reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationsDictionary {
    pub restler_fuzzable_string: Vec<String>,
    pub restler_fuzzable_string_unquoted: Vec<String>,
    pub restler_fuzzable_datetime: Vec<String>,
    pub restler_fuzzable_date: Vec<String>,
    pub restler_fuzzable_uuid4: Vec<String>,
    pub restler_fuzzable_int: Vec<String>,
    pub restler_fuzzable_number: Vec<String>,
    pub restler_fuzzable_bool: Vec<String>,
    pub restler_fuzzable_object: Vec<String>,
    pub restler_custom_payload: BTreeMap<String, Vec<String>>,
    pub restler_custom_payload_unquoted: BTreeMap<String, Vec<String>>,
    pub restler_custom_payload_header: BTreeMap<String, Vec<String>>,
    pub restler_custom_payload_query: BTreeMap<String, Vec<String>>,
    pub restler_custom_payload_uuid4_suffix: BTreeMap<String, String>,
    pub shadow_values: BTreeMap<String, serde_json::Value>,
}

impl MutationsDictionary {
    /// Dictionary with the default fuzzable values and no custom payloads.
    #[must_use]
    pub fn with_defaults() -> Self {
        let one = |v: &str| vec![v.to_string()];
        Self {
            restler_fuzzable_string: one("fuzzstring"),
            restler_fuzzable_datetime: one("2019-06-26T20:20:39+00:00"),
            restler_fuzzable_date: one("2019-06-26"),
            restler_fuzzable_uuid4: one("566048da-ed19-4cd3-8e0a-b7e0e1ec4d72"),
            restler_fuzzable_int: vec!["0".to_string(), "1".to_string()],
            restler_fuzzable_number: vec!["0.1".to_string(), "1.2".to_string()],
            restler_fuzzable_bool: one("true"),
            restler_fuzzable_object: one("{ \"fuzz\": false }"),
            ..Self::default()
        }
    }

    /// Load a dictionary from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ApichainError::DictionaryParseError`] when the file is not a
    /// valid dictionary; I/O failures carry the file path as context.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary: {}", path.display()))?;
        let dictionary = Self::from_json(&content).map_err(|e| ApichainError::DictionaryParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(dictionary)
    }

    /// Parse a dictionary from JSON text.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Pretty JSON rendering with keys in sorted order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a custom payload by key.
    ///
    /// The kind-specific map (`restler_custom_payload_header` for headers,
    /// `restler_custom_payload_query` for queries) is consulted before the
    /// general `restler_custom_payload` map.
    #[must_use]
    pub fn find_custom_payload(
        &self,
        kind: Option<CustomPayloadType>,
        key: &str,
        primitive_type: PrimitiveType,
    ) -> Option<DictionaryPayload> {
        let specific = match kind {
            Some(CustomPayloadType::Header) => Some(&self.restler_custom_payload_header),
            Some(CustomPayloadType::Query) => Some(&self.restler_custom_payload_query),
            _ => None,
        };

        if let (Some(map), Some(kind)) = (specific, kind)
            && map.contains_key(key)
        {
            return Some(DictionaryPayload {
                payload_type: kind,
                primitive_type,
                name: key.to_string(),
                is_object: false,
            });
        }

        let is_object = self.restler_custom_payload_unquoted.contains_key(key);
        if self.restler_custom_payload.contains_key(key) || is_object {
            return Some(DictionaryPayload {
                payload_type: CustomPayloadType::String,
                primitive_type,
                name: key.to_string(),
                is_object,
            });
        }
        None
    }

    /// Existing uuid-suffix entry for `name`.
    #[must_use]
    pub fn find_uuid_suffix(&self, name: &str, primitive_type: PrimitiveType) -> Option<DictionaryPayload> {
        self.restler_custom_payload_uuid4_suffix.contains_key(name).then(|| DictionaryPayload {
            payload_type: CustomPayloadType::UuidSuffix,
            primitive_type,
            name: name.to_string(),
            is_object: false,
        })
    }

    /// Ensure a uuid-suffix entry exists for `name` and return it.
    ///
    /// An existing entry for the same name is reused untouched.
    #[must_use]
    pub fn with_uuid_suffix(
        mut self,
        name: &str,
        primitive_type: PrimitiveType,
    ) -> (Self, DictionaryPayload) {
        if !self.restler_custom_payload_uuid4_suffix.contains_key(name) {
            let prefix = generate_uuid_suffix_prefix(name);
            tracing::debug!("Adding uuid-suffix entry {name} -> {prefix}");
            self.restler_custom_payload_uuid4_suffix.insert(name.to_string(), prefix);
        }
        let payload = DictionaryPayload {
            payload_type: CustomPayloadType::UuidSuffix,
            primitive_type,
            name: name.to_string(),
            is_object: false,
        };
        (self, payload)
    }

    /// Number of uuid-suffix entries.
    #[must_use]
    pub fn uuid_suffix_count(&self) -> usize {
        self.restler_custom_payload_uuid4_suffix.len()
    }
}

/// Prefix for a generated uuid-suffix value.
///
/// Keeps the alphabetic characters of `name`, lower-cased and truncated to
/// [`UUID_SUFFIX_PREFIX_MAX_LEN`]. Falls back to `name` itself when nothing
/// alphabetic remains.
#[must_use]
pub fn generate_uuid_suffix_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .take(UUID_SUFFIX_PREFIX_MAX_LEN)
        .collect();
    if prefix.is_empty() {
        name.to_string()
    } else {
        prefix
    }
}

/// Dictionaries declared for a subset of endpoints.
///
/// Built when several API documents each bring their own dictionary.
/// Serializes as a map from normalized endpoint to dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PerEndpointDictionaries {
    by_endpoint: BTreeMap<String, MutationsDictionary>,
}

impl PerEndpointDictionaries {
    /// Merge `(endpoints, dictionary)` declarations.
    ///
    /// Identical dictionaries declared twice for one endpoint are tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`ApichainError::ConflictingDictionaries`] naming the endpoint when
    /// two distinct dictionaries claim it.
    pub fn build<I>(declarations: I) -> Result<Self, ApichainError>
    where
        I: IntoIterator<Item = (Vec<String>, MutationsDictionary)>,
    {
        let mut by_endpoint: BTreeMap<String, MutationsDictionary> = BTreeMap::new();
        for (endpoints, dictionary) in declarations {
            for endpoint in endpoints {
                let endpoint = normalize_endpoint(&endpoint);
                match by_endpoint.get(&endpoint) {
                    Some(existing) if *existing != dictionary => {
                        return Err(ApichainError::ConflictingDictionaries {
                            endpoint,
                        });
                    }
                    Some(_) => {}
                    None => {
                        by_endpoint.insert(endpoint, dictionary.clone());
                    }
                }
            }
        }
        Ok(Self {
            by_endpoint,
        })
    }

    /// The dictionary declared for `endpoint`, if any.
    #[must_use]
    pub fn for_endpoint(&self, endpoint: &str) -> Option<&MutationsDictionary> {
        self.by_endpoint.get(&normalize_endpoint(endpoint))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_endpoint.is_empty()
    }

    /// Endpoints with an override, sorted.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.by_endpoint.keys().map(String::as_str)
    }
}
