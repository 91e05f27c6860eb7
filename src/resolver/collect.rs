//! Consumer and producer collection from request trees.

use anyhow::Result;

use super::resource::{ApiResource, ResourceReference};
use super::types::{Consumer, InputOrigin, MatchedAnnotation, ParameterKind};
use crate::annotations::{ProducerConsumerAnnotation, find_annotation};
use crate::config::CompilerConfig;
use crate::core::ApichainError;
use crate::grammar::{ARRAY_MARKER, AccessPath, NodeRef, PrimitiveType, RequestData, RequestId, RequestParameter, Tree};
use crate::naming::{NamingConvention, infer_convention};

/// Builds [`ApiResource`]s under one naming policy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceFactory {
    convention: Option<NamingConvention>,
}

impl ResourceFactory {
    pub(crate) const fn new(config: &CompilerConfig) -> Self {
        Self {
            convention: config.naming_convention,
        }
    }

    pub(crate) fn make(
        self,
        request_id: &RequestId,
        reference: ResourceReference,
        primitive_type: PrimitiveType,
    ) -> Result<ApiResource, ApichainError> {
        let convention = self.convention.unwrap_or_else(|| infer_convention(reference.name()));
        ApiResource::new(request_id.clone(), reference, convention, primitive_type)
    }

    /// Like [`ResourceFactory::make`], for a value the request returns.
    pub(crate) fn make_response(
        self,
        request_id: &RequestId,
        reference: ResourceReference,
        primitive_type: PrimitiveType,
    ) -> Result<ApiResource, ApichainError> {
        let convention = self.convention.unwrap_or_else(|| infer_convention(reference.name()));
        ApiResource::response(request_id.clone(), reference, convention, primitive_type)
    }
}

fn check_serialization(request_id: &RequestId, parameter: &RequestParameter) -> Result<(), ApichainError> {
    match parameter.serialization {
        Some(serialization) if !serialization.style.is_supported() => Err(ApichainError::UnsupportedSerialization {
            endpoint: request_id.endpoint.clone(),
            parameter: parameter.name.clone(),
            style: serialization.style.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Reject inputs the grammar cannot express, whether or not they are resolved.
pub fn validate_request(request_id: &RequestId, data: &RequestData) -> Result<(), ApichainError> {
    for parameter in data
        .path_parameters
        .iter()
        .chain(&data.query_parameters)
        .chain(&data.header_parameters)
    {
        check_serialization(request_id, parameter)?;
    }
    for parameter in &data.path_parameters {
        if parameter.payload.is_array() {
            return Err(ApichainError::ArrayPathParameter {
                endpoint: request_id.endpoint.clone(),
                name: parameter.name.clone(),
            });
        }
    }
    Ok(())
}

/// Every substitutable input of one request.
///
/// Only fuzzable, writable leaves become consumers. Query, header and body
/// inputs are included when the configuration enables them.
pub(crate) fn collect_consumers(
    factory: ResourceFactory,
    config: &CompilerConfig,
    request_id: &RequestId,
    data: &RequestData,
) -> Result<Vec<Consumer>> {
    let mut consumers = Vec::new();

    for parameter in &data.path_parameters {
        match &parameter.payload {
            Tree::Leaf(leaf) if leaf.payload.is_fuzzable() && !leaf.is_readonly => {
                let reference = ResourceReference::path(parameter.name.clone(), &request_id.endpoint);
                let resource = factory.make(request_id, reference, leaf.payload.primitive_type())?;
                consumers.push(Consumer::new(resource, ParameterKind::Path));
            }
            Tree::Leaf(_) => {}
            Tree::Internal(_) => {
                tracing::debug!("Skipping structured path parameter '{}' of {request_id}", parameter.name);
            }
        }
    }

    let parameter_groups = [
        (ParameterKind::Query, &data.query_parameters, config.resolve_query_dependencies),
        (ParameterKind::Header, &data.header_parameters, config.resolve_header_dependencies),
    ];
    for (kind, parameters, enabled) in parameter_groups {
        if !enabled {
            continue;
        }
        for parameter in parameters {
            for (_, leaf) in parameter.payload.leaves() {
                if !leaf.payload.is_fuzzable() || leaf.is_readonly {
                    continue;
                }
                let name = if leaf.name.is_empty() { parameter.name.clone() } else { leaf.name.clone() };
                let reference = match kind {
                    ParameterKind::Header => ResourceReference::Header {
                        name,
                    },
                    _ => ResourceReference::Query {
                        name,
                    },
                };
                let resource = factory.make(request_id, reference, leaf.payload.primitive_type())?;
                consumers.push(Consumer::new(resource, kind));
            }
        }
    }

    if config.resolve_body_dependencies
        && let Some(body) = &data.body
    {
        for (path, leaf) in body.leaves() {
            if path.is_empty() || !leaf.payload.is_fuzzable() || leaf.is_readonly {
                continue;
            }
            let resource =
                factory.make(request_id, ResourceReference::body(path), leaf.payload.primitive_type())?;
            consumers.push(Consumer::new(resource, ParameterKind::Body));
        }
    }

    Ok(consumers)
}

/// Attach the highest-precedence annotation matching each consumer.
pub(crate) fn attach_annotations(
    consumers: &mut [Consumer],
    data: &RequestData,
    global: &[ProducerConsumerAnnotation],
) {
    for consumer in consumers {
        let found = find_annotation(
            &data.local_annotations,
            global,
            &data.link_annotations,
            consumer.request_id(),
            consumer.name(),
            consumer.resource.access_path(),
        );
        consumer.annotation = found.map(|(source, annotation)| MatchedAnnotation {
            source,
            annotation: annotation.clone(),
        });
    }
}

/// Response body leaves and response headers of one request.
pub(crate) fn collect_response_producers(
    factory: ResourceFactory,
    request_id: &RequestId,
    data: &RequestData,
) -> Result<Vec<ApiResource>> {
    let mut producers = Vec::new();
    if let Some(response) = &data.response_body {
        for (path, leaf) in response.leaves() {
            if path.is_empty() {
                continue;
            }
            producers.push(factory.make_response(
                request_id,
                ResourceReference::body(path),
                leaf.payload.primitive_type(),
            )?);
        }
    }
    for header in &data.response_headers {
        for (_, leaf) in header.payload.leaves() {
            let name = if leaf.name.is_empty() { header.name.clone() } else { leaf.name.clone() };
            producers.push(factory.make_response(
                request_id,
                ResourceReference::Header {
                    name,
                },
                leaf.payload.primitive_type(),
            )?);
        }
    }
    Ok(producers)
}

/// Every named node of the request body, internal nodes included.
///
/// Array element nodes are left out; the array node itself stands for them.
pub(crate) fn collect_same_body_producers(
    factory: ResourceFactory,
    request_id: &RequestId,
    data: &RequestData,
) -> Result<Vec<ApiResource>> {
    let Some(body) = &data.body else {
        return Ok(Vec::new());
    };

    let mut nodes: Vec<(AccessPath, PrimitiveType)> = Vec::new();
    body.walk(&AccessPath::root(), &mut |path, node| {
        if path.name_part().is_none() || path.segments().last().is_some_and(|s| s == ARRAY_MARKER) {
            return;
        }
        let primitive_type = match node {
            NodeRef::Leaf(leaf) => leaf.payload.primitive_type(),
            NodeRef::Internal(_) => PrimitiveType::Object,
        };
        nodes.push((path.clone(), primitive_type));
    });

    nodes
        .into_iter()
        .map(|(path, primitive_type)| {
            factory
                .make(request_id, ResourceReference::body(path), primitive_type)
                .map_err(Into::into)
        })
        .collect()
}

/// Input-only producers declared by annotations.
///
/// An annotation whose producer parameter is not returned by the producer
/// request, but is one of its inputs, makes that input a producer.
pub(crate) fn annotation_input_producers<'a>(
    annotations: impl IntoIterator<Item = &'a ProducerConsumerAnnotation>,
    responses: &[ApiResource],
    inputs: &[Consumer],
) -> Vec<(ApiResource, InputOrigin)> {
    let mut producers = Vec::new();
    for annotation in annotations {
        let Some(parameter) = &annotation.producer_parameter else {
            continue;
        };
        let returned = responses
            .iter()
            .any(|r| r.request_id == annotation.producer_id && parameter.matches(r.name(), r.access_path()));
        if returned {
            continue;
        }
        match inputs.iter().find(|c| {
            *c.request_id() == annotation.producer_id && parameter.matches(c.name(), c.resource.access_path())
        }) {
            Some(input) => producers.push((input.resource.clone(), InputOrigin::Annotation)),
            None => tracing::warn!("Annotation {annotation} names no response value or input of its producer"),
        }
    }
    producers
}
