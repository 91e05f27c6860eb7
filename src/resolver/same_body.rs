//! Same-body resolution.
//!
//! Runs after the cross-request pass for body consumers that are still
//! unresolved. A consumer named like a configured alias key (`id` by default)
//! takes its value from the closest property of the same request body named
//! like the alias value (`name`). Both properties then share one uuid-suffix
//! token, so the producing property gets a dictionary entry as well.

use std::collections::BTreeMap;

use super::producer_index::ProducerIndex;
use super::resource::ApiResource;
use super::types::{Consumer, ParameterKind};
use crate::dictionary::{DictionaryPayload, MutationsDictionary};
use crate::grammar::AccessPath;

/// A same-body binding and the uuid-suffix entry backing its producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SameBodyMatch {
    pub producer: ApiResource,
    pub producer_payload: DictionaryPayload,
}

/// Number of leading segments two paths share.
fn shared_prefix_len(a: &AccessPath, b: &AccessPath) -> usize {
    a.segments().iter().zip(b.segments()).take_while(|(x, y)| x == y).count()
}

/// Pick the same-body producer for `consumer`, if its name has an alias.
///
/// Candidates are properties of the consumer's own request body. The
/// consumer itself and its ancestors are never chosen. Among the rest the one
/// sharing the longest path prefix with the consumer wins, then the shallowest,
/// then index order.
#[must_use]
pub fn resolve_same_body(
    consumer: &Consumer,
    index: &ProducerIndex,
    aliases: &BTreeMap<String, String>,
    dictionary: MutationsDictionary,
) -> (Option<SameBodyMatch>, MutationsDictionary) {
    if consumer.kind != ParameterKind::Body {
        return (None, dictionary);
    }
    let (Some(alias), Some(consumer_path)) =
        (aliases.get(consumer.name()), consumer.resource.access_path())
    else {
        return (None, dictionary);
    };

    let mut candidates: Vec<&ApiResource> = index
        .same_body(alias)
        .iter()
        .filter(|p| p.request_id == *consumer.request_id())
        .filter(|p| {
            p.access_path().is_some_and(|path| path != consumer_path && !path.is_ancestor_of(consumer_path))
        })
        .collect();
    candidates.sort_by_key(|p| {
        let path = p.access_path().cloned().unwrap_or_default();
        (
            std::cmp::Reverse(shared_prefix_len(&path, consumer_path)),
            path.segments().len(),
        )
    });

    let Some(producer) = candidates.first() else {
        tracing::debug!("No same-body producer '{alias}' for {}", consumer.resource);
        return (None, dictionary);
    };

    let (dictionary, producer_payload) =
        dictionary.with_uuid_suffix(producer.name(), producer.primitive_type);
    tracing::debug!("Same-body {} <- {}", consumer.resource, producer);
    let found = SameBodyMatch {
        producer: (*producer).clone(),
        producer_payload,
    };
    (Some(found), dictionary)
}
