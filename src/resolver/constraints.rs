//! Equality and ordering constraints.
//!
//! Equality constraints alias consumers bound to an annotation-declared input
//! to whatever producer that input itself resolved to; they never invent a
//! producer. Ordering constraints sequence requests without data flow: they
//! come from parameterless annotations and from input-only producers whose
//! writer must run before the reader (and after whoever supplied the writer's
//! own input).

use std::collections::{BTreeMap, BTreeSet};

use super::dependency_graph::DependencyGraph;
use super::types::{InputOrigin, OrderingConstraint, ParameterKind, Producer, ProducerConsumerDependency};
use crate::annotations::ProducerConsumerAnnotation;
use crate::grammar::{CustomPayloadType, RequestId};

/// Kinds searched, in order, for the dependency of an input parameter.
const EQUALITY_SEARCH_ORDER: [ParameterKind; 4] =
    [ParameterKind::Body, ParameterKind::Path, ParameterKind::Query, ParameterKind::Header];

/// Ordering constraints declared by parameterless annotations.
///
/// Each item pairs an annotation with the request it was declared on; that
/// request is the consumer when the annotation names none.
pub fn annotation_ordering_constraints<'a, I>(annotations: I) -> Vec<OrderingConstraint>
where
    I: IntoIterator<Item = (&'a ProducerConsumerAnnotation, Option<&'a RequestId>)>,
{
    annotations
        .into_iter()
        .filter(|(annotation, _)| annotation.is_ordering_only())
        .filter_map(|(annotation, owner)| {
            let target = annotation.consumer_id.as_ref().or(owner)?;
            Some(OrderingConstraint {
                source: annotation.producer_id.clone(),
                target: target.clone(),
            })
        })
        .collect()
}

/// Ordering constraints implied by input-only producers.
///
/// A reader of an input-only value at `A` runs after `A`; when `A`'s own
/// parameter comes from a response of `Z`, `A` runs after `Z`.
#[must_use]
pub fn input_only_ordering_constraints(dependencies: &[ProducerConsumerDependency]) -> Vec<OrderingConstraint> {
    let mut constraints = Vec::new();
    for dependency in dependencies {
        let Some(Producer::InputOnly {
            resource: writer,
            ..
        }) = &dependency.producer
        else {
            continue;
        };
        let reader = dependency.consumer.request_id();
        if &writer.request_id == reader {
            continue;
        }
        constraints.push(OrderingConstraint {
            source: writer.request_id.clone(),
            target: reader.clone(),
        });

        let upstream = dependencies.iter().find_map(|d| match &d.producer {
            Some(Producer::Response {
                resource,
            }) if d.consumer.resource == *writer => Some(resource.request_id.clone()),
            _ => None,
        });
        if let Some(source) = upstream
            && source != writer.request_id
        {
            constraints.push(OrderingConstraint {
                source,
                target: writer.request_id.clone(),
            });
        }
    }
    constraints
}

/// Deduplicate, drop self-edges, sort, and check for cycles.
///
/// A cycle is logged rather than rejected; the code generator decides how to
/// break it.
#[must_use]
pub fn finalize_ordering_constraints(constraints: Vec<OrderingConstraint>) -> Vec<OrderingConstraint> {
    let unique: BTreeSet<OrderingConstraint> =
        constraints.into_iter().filter(|c| c.source != c.target).collect();

    let mut graph = DependencyGraph::new();
    for constraint in &unique {
        graph.add_dependency(constraint.target.clone(), constraint.source.clone());
    }
    tracing::debug!("Ordering graph spans {} requests", graph.node_count());
    if let Err(e) = graph.detect_cycles() {
        tracing::warn!("{e}");
    }

    unique.into_iter().collect()
}

/// Copy resolved producers onto consumers bound to annotation inputs.
///
/// Returns the number of consumers aliased.
pub fn apply_equality_constraints(dependencies: &mut [ProducerConsumerDependency]) -> usize {
    let resolved: BTreeMap<(RequestId, ParameterKind, String), Producer> = dependencies
        .iter()
        .filter_map(|d| {
            let producer = d.producer.as_ref()?;
            let key = (d.consumer.request_id().clone(), d.consumer.kind, d.consumer.name().to_string());
            Some((key, producer.clone()))
        })
        .collect();

    let mut aliased = 0;
    for dependency in dependencies.iter_mut() {
        let Some(Producer::InputOnly {
            resource: input,
            origin: InputOrigin::Annotation,
        }) = &dependency.producer
        else {
            continue;
        };

        let source = EQUALITY_SEARCH_ORDER.iter().find_map(|kind| {
            resolved.get(&(input.request_id.clone(), *kind, input.name().to_string()))
        });
        if let Some(producer) = source
            && is_aliasable(producer)
        {
            tracing::debug!("Equality: {} takes {producer}", dependency.consumer.resource);
            dependency.producer = Some(producer.clone());
            aliased += 1;
        }
    }
    aliased
}

/// Response values and literal dictionary payloads can be shared; a uuid-suffix
/// entry is fresh per writer and cannot.
fn is_aliasable(producer: &Producer) -> bool {
    match producer {
        Producer::Response {
            ..
        } => true,
        Producer::Dictionary {
            payload,
        } => payload.payload_type != CustomPayloadType::UuidSuffix,
        _ => false,
    }
}

/// Constraint producers for the producer dump.
#[must_use]
pub fn ordering_producers(constraints: &[OrderingConstraint]) -> Vec<Producer> {
    constraints
        .iter()
        .map(|c| Producer::OrderingConstraint {
            constraint: c.clone(),
        })
        .collect()
}
