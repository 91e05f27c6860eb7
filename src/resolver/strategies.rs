//! Ranked matching strategies for a single consumer.
//!
//! Each strategy is a plain function over the consumer, the frozen producer
//! index and the current dictionary. [`STRATEGIES`] lists them in precedence
//! order and [`resolve`] stops at the first one with an answer:
//!
//! 1. annotation (local, then global, then link)
//! 2. dictionary custom payload or uuid-suffix entry
//! 3. exact type at an ancestor endpoint, or at a single endpoint anywhere
//!    when the type comes from the consumer's own name
//! 4. approximate type, one producing endpoint only
//! 5. create-or-update PUT
//! 6. nested object via its container type, one producing endpoint only
//!
//! A dictionary entry therefore beats an exact-type response producer for
//! the same consumer.
//!
//! Strategies never mutate anything. When one asks for a uuid-suffix entry,
//! [`resolve`] adds it to the dictionary it owns and hands the dictionary back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::producer_index::ProducerIndex;
use super::resource::ApiResource;
use super::types::{Consumer, ParameterKind, Producer};
use crate::annotations::AnnotationResource;
use crate::dictionary::{MutationsDictionary, PerEndpointDictionaries};
use crate::grammar::{
    CustomPayloadType, OperationMethod, RequestId, endpoint_parts, is_path_parameter,
    is_strict_endpoint_ancestor, normalize_endpoint,
};
use crate::naming::same_type;

/// Names the strategies, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Annotation,
    Dictionary,
    ExactType,
    ApproximateType,
    CreateOrUpdate,
    NestedObject,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Annotation => "annotation",
            Self::Dictionary => "dictionary",
            Self::ExactType => "exact_type",
            Self::ApproximateType => "approximate_type",
            Self::CreateOrUpdate => "create_or_update",
            Self::NestedObject => "nested_object",
        };
        f.write_str(name)
    }
}

/// Read-only inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub index: &'a ProducerIndex,
    pub per_endpoint: &'a PerEndpointDictionaries,
    pub allow_get_producers: bool,
}

/// What a strategy decided for one consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// No opinion; try the next strategy.
    Continue,
    Resolved(Producer),
    /// Candidates at more than one endpoint; stop without a producer.
    Ambiguous,
    /// Stop and bind the consumer to a fresh uuid-suffix entry of its own name.
    SynthesizeUuidSuffix,
}

pub type StrategyFn = fn(&Consumer, &ResolutionContext<'_>, &MutationsDictionary) -> StrategyOutcome;

/// Strategies in precedence order.
pub const STRATEGIES: &[(Strategy, StrategyFn)] = &[
    (Strategy::Annotation, annotation_match),
    (Strategy::Dictionary, dictionary_match),
    (Strategy::ExactType, exact_type_match),
    (Strategy::ApproximateType, approximate_type_match),
    (Strategy::CreateOrUpdate, create_or_update_match),
    (Strategy::NestedObject, nested_object_match),
];

/// Result of resolving one consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub producer: Option<Producer>,
    /// The strategy that decided, if any did.
    pub strategy: Option<Strategy>,
    pub ambiguous: bool,
}

/// Run [`STRATEGIES`] for `consumer`.
///
/// Takes the dictionary by value and returns it, with a uuid-suffix entry
/// added when a strategy asked for one.
#[must_use]
pub fn resolve(
    consumer: &Consumer,
    ctx: &ResolutionContext<'_>,
    dictionary: MutationsDictionary,
) -> (Resolution, MutationsDictionary) {
    let decision = STRATEGIES.iter().find_map(|(strategy, run)| {
        match run(consumer, ctx, &dictionary) {
            StrategyOutcome::Continue => None,
            outcome => Some((*strategy, outcome)),
        }
    });

    let Some((strategy, outcome)) = decision else {
        tracing::debug!("No producer for {}", consumer.resource);
        let unresolved = Resolution {
            producer: None,
            strategy: None,
            ambiguous: false,
        };
        return (unresolved, dictionary);
    };

    tracing::debug!("{strategy} decided {}", consumer.resource);
    match outcome {
        StrategyOutcome::Resolved(producer) => (
            Resolution {
                producer: Some(producer),
                strategy: Some(strategy),
                ambiguous: false,
            },
            dictionary,
        ),
        StrategyOutcome::SynthesizeUuidSuffix => {
            let (dictionary, payload) =
                dictionary.with_uuid_suffix(consumer.name(), consumer.resource.primitive_type);
            let resolution = Resolution {
                producer: Some(Producer::Dictionary {
                    payload,
                }),
                strategy: Some(strategy),
                ambiguous: false,
            };
            (resolution, dictionary)
        }
        StrategyOutcome::Ambiguous | StrategyOutcome::Continue => (
            Resolution {
                producer: None,
                strategy: Some(strategy),
                ambiguous: true,
            },
            dictionary,
        ),
    }
}

/// Whether a producer method may feed a consumer method at the same endpoint.
///
/// | producer | allowed consumers        |
/// |----------|--------------------------|
/// | POST     | anything but POST        |
/// | PUT      | anything but POST        |
/// | PATCH    | anything but POST, PUT   |
/// | GET      | anything but POST, PUT, PATCH |
#[must_use]
pub const fn same_endpoint_precedence(producer: OperationMethod, consumer: OperationMethod) -> bool {
    use OperationMethod::{Get, Patch, Post, Put};
    match producer {
        Post | Put => !matches!(consumer, Post),
        Patch => !matches!(consumer, Post | Put),
        Get => !matches!(consumer, Post | Put | Patch),
        _ => false,
    }
}

/// Whether `producer` may supply values to `consumer`.
///
/// Only PUT and POST produce (GET too when `allow_get_producers`). A request
/// never feeds itself. At the same endpoint [`same_endpoint_precedence`]
/// applies; otherwise the producer must not live below the consumer's endpoint.
#[must_use]
pub fn is_valid_producer(producer: &RequestId, consumer: &RequestId, allow_get_producers: bool) -> bool {
    let method_ok = match producer.method {
        OperationMethod::Put | OperationMethod::Post => true,
        OperationMethod::Get => allow_get_producers,
        _ => false,
    };
    if !method_ok || producer == consumer {
        return false;
    }

    if normalize_endpoint(&producer.endpoint) == normalize_endpoint(&consumer.endpoint) {
        same_endpoint_precedence(producer.method, consumer.method)
    } else {
        !is_strict_endpoint_ancestor(&consumer.endpoint, &producer.endpoint)
    }
}

fn is_other_resource(candidate: &ApiResource, consumer: &Consumer) -> bool {
    candidate.request_id != *consumer.request_id()
}

fn valid_for(candidate: &ApiResource, consumer: &Consumer, ctx: &ResolutionContext<'_>) -> bool {
    is_other_resource(candidate, consumer)
        && is_valid_producer(&candidate.request_id, consumer.request_id(), ctx.allow_get_producers)
}

/// Endpoint the consumer's value is scoped to: the prefix ending at a path
/// parameter, or the whole endpoint.
fn anchor_endpoint(consumer: &Consumer) -> String {
    consumer
        .resource
        .reference
        .parameter_prefix()
        .unwrap_or_else(|| normalize_endpoint(&consumer.request_id().endpoint))
}

/// Endpoint with parameter names erased, so `/a/{x}` and `/a/{y}` compare equal.
fn endpoint_shape(endpoint: &str) -> Vec<&str> {
    endpoint_parts(endpoint)
        .into_iter()
        .map(|p| if is_path_parameter(p) { "{}" } else { p })
        .collect()
}

fn distinct_endpoints(candidates: &[&ApiResource]) -> BTreeSet<String> {
    candidates.iter().map(|c| normalize_endpoint(&c.request_id.endpoint)).collect()
}

fn annotation_match(
    consumer: &Consumer,
    ctx: &ResolutionContext<'_>,
    _dictionary: &MutationsDictionary,
) -> StrategyOutcome {
    let Some(matched) = &consumer.annotation else {
        return StrategyOutcome::Continue;
    };
    let annotation = &matched.annotation;
    let Some(parameter) = annotation.producer_parameter.as_ref().or(annotation.consumer_parameter.as_ref())
    else {
        return StrategyOutcome::Continue;
    };

    let (name, path) = match parameter {
        AnnotationResource::Name(name) => (Some(name.as_str()), None),
        AnnotationResource::Path(path) => (None, Some(path)),
    };
    if let Some(response) = ctx
        .index
        .responses_of_request(&annotation.producer_id, name, path)
        .find(|r| *r != &consumer.resource)
    {
        return StrategyOutcome::Resolved(Producer::Response {
            resource: response.clone(),
        });
    }

    let lookup_name = name.or_else(|| path.and_then(|p| p.name_part())).unwrap_or_default();
    if let Some((input, origin)) = ctx.index.input_only(lookup_name).iter().find(|(r, _)| {
        r.request_id == annotation.producer_id
            && parameter.matches(r.name(), r.access_path())
            && *r != consumer.resource
    }) {
        return StrategyOutcome::Resolved(Producer::InputOnly {
            resource: input.clone(),
            origin: *origin,
        });
    }

    tracing::warn!(
        "Annotation {annotation} matched {} but names no producer; falling back to inference",
        consumer.resource
    );
    StrategyOutcome::Continue
}

fn dictionary_match(
    consumer: &Consumer,
    ctx: &ResolutionContext<'_>,
    dictionary: &MutationsDictionary,
) -> StrategyOutcome {
    let kind = match consumer.kind {
        ParameterKind::Header => Some(CustomPayloadType::Header),
        ParameterKind::Query => Some(CustomPayloadType::Query),
        ParameterKind::Path | ParameterKind::Body => None,
    };
    let primitive_type = consumer.resource.primitive_type;
    let endpoint_dictionary = ctx.per_endpoint.for_endpoint(&consumer.request_id().endpoint);

    for dict in endpoint_dictionary.into_iter().chain(std::iter::once(dictionary)) {
        if let Some(path) = consumer.resource.access_path()
            && let Some(payload) = dict.find_custom_payload(kind, &path.to_pointer(), primitive_type)
        {
            return StrategyOutcome::Resolved(Producer::Dictionary {
                payload,
            });
        }
        if let Some(payload) = dict.find_custom_payload(kind, consumer.name(), primitive_type) {
            return StrategyOutcome::Resolved(Producer::Dictionary {
                payload,
            });
        }
        if consumer.is_writer()
            && let Some(payload) = dict.find_uuid_suffix(consumer.name(), primitive_type)
        {
            return StrategyOutcome::Resolved(Producer::Dictionary {
                payload,
            });
        }
    }
    StrategyOutcome::Continue
}

fn exact_type_match(
    consumer: &Consumer,
    ctx: &ResolutionContext<'_>,
    _dictionary: &MutationsDictionary,
) -> StrategyOutcome {
    let resource = &consumer.resource;
    let anchor = anchor_endpoint(consumer);

    if let Some(primary) = resource.primary_type() {
        let anchor_parts = endpoint_parts(&anchor);
        let mut candidates: Vec<&ApiResource> = (0..anchor_parts.len())
            .flat_map(|len| {
                let ancestor = format!("/{}", anchor_parts[..len].join("/"));
                ctx.index.responses_by_name_and_endpoint(&resource.producer_parameter_name, &ancestor)
            })
            .filter(|p| p.primary_type().is_some_and(|t| same_type(t, primary)) && valid_for(p, consumer, ctx))
            .collect();
        candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        if let Some(response) = candidates.first() {
            return StrategyOutcome::Resolved(Producer::Response {
                resource: (*response).clone(),
            });
        }
    }

    if let Some(prefix) = resource.reference.parameter_prefix()
        && let Some((input, origin)) = ctx.index.input_only(consumer.name()).iter().find(|(p, _)| {
            normalize_endpoint(&p.request_id.endpoint) == normalize_endpoint(&prefix)
                && valid_for(p, consumer, ctx)
        })
    {
        return StrategyOutcome::Resolved(Producer::InputOnly {
            resource: input.clone(),
            origin: *origin,
        });
    }

    // A type read off the consumer's own name (`accountId` -> `account`) is not
    // tied to the endpoint tree.
    if consumer.kind != ParameterKind::Path
        && resource.container_name.is_none()
        && let Some(primary) = resource.primary_type()
    {
        let candidates: Vec<&ApiResource> = ctx
            .index
            .responses_by_type(primary)
            .iter()
            .filter(|p| p.name() == resource.producer_parameter_name && valid_for(p, consumer, ctx))
            .collect();
        return single_endpoint(resource, primary, &candidates);
    }

    StrategyOutcome::Continue
}

/// Bind the first candidate when all candidates share one endpoint.
fn single_endpoint(resource: &ApiResource, type_name: &str, candidates: &[&ApiResource]) -> StrategyOutcome {
    let Some(first) = candidates.first() else {
        return StrategyOutcome::Continue;
    };
    let endpoints = distinct_endpoints(candidates);
    if endpoints.len() > 1 {
        tracing::warn!(
            "Ambiguous producers for {resource} with type '{type_name}': {}",
            endpoints.into_iter().collect::<Vec<_>>().join(", ")
        );
        return StrategyOutcome::Ambiguous;
    }
    StrategyOutcome::Resolved(Producer::Response {
        resource: (*first).clone(),
    })
}

fn approximate_type_match(
    consumer: &Consumer,
    ctx: &ResolutionContext<'_>,
    _dictionary: &MutationsDictionary,
) -> StrategyOutcome {
    let resource = &consumer.resource;
    for tier in resource.candidate_type_names.iter().skip(1) {
        let candidates: Vec<&ApiResource> = ctx
            .index
            .responses_by_type(tier)
            .iter()
            .filter(|p| p.name() == resource.producer_parameter_name && valid_for(p, consumer, ctx))
            .collect();
        match single_endpoint(resource, tier, &candidates) {
            StrategyOutcome::Continue => {}
            outcome => return outcome,
        }
    }
    StrategyOutcome::Continue
}

fn create_or_update_match(
    consumer: &Consumer,
    ctx: &ResolutionContext<'_>,
    _dictionary: &MutationsDictionary,
) -> StrategyOutcome {
    if consumer.request_id().method != OperationMethod::Put || !consumer.is_trailing_path_parameter() {
        return StrategyOutcome::Continue;
    }

    let resource = &consumer.resource;
    let shape = endpoint_shape(&consumer.request_id().endpoint);
    let sibling_put = resource.primary_type().and_then(|primary| {
        ctx.index.responses_by_type(primary).iter().find(|p| {
            p.request_id.method == OperationMethod::Put
                && p.name() == resource.producer_parameter_name
                && endpoint_shape(&p.request_id.endpoint) == shape
                && is_other_resource(p, consumer)
        })
    });

    match sibling_put {
        Some(producer) => StrategyOutcome::Resolved(Producer::Response {
            resource: producer.clone(),
        }),
        None => StrategyOutcome::SynthesizeUuidSuffix,
    }
}

fn nested_object_match(
    consumer: &Consumer,
    ctx: &ResolutionContext<'_>,
    _dictionary: &MutationsDictionary,
) -> StrategyOutcome {
    let resource = &consumer.resource;
    if consumer.kind != ParameterKind::Body || resource.body_container_name.is_none() {
        return StrategyOutcome::Continue;
    }
    let Some(container_type) = resource.primary_type() else {
        return StrategyOutcome::Continue;
    };
    let consumer_endpoint = normalize_endpoint(&consumer.request_id().endpoint);

    let candidates: Vec<&ApiResource> = ctx
        .index
        .responses_by_type(container_type)
        .iter()
        .filter(|p| {
            matches!(p.request_id.method, OperationMethod::Put | OperationMethod::Post)
                && normalize_endpoint(&p.request_id.endpoint) != consumer_endpoint
                && p.name() == resource.producer_parameter_name
                && valid_for(p, consumer, ctx)
        })
        .collect();

    match candidates.as_slice() {
        [] => StrategyOutcome::Continue,
        [first, ..] if distinct_endpoints(&candidates).len() == 1 => {
            StrategyOutcome::Resolved(Producer::Response {
                resource: (*first).clone(),
            })
        }
        _ => {
            tracing::debug!("Nested object {resource} matches several endpoints; abstaining");
            StrategyOutcome::Ambiguous
        }
    }
}
