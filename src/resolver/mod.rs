//! Producer/consumer dependency extraction.
//!
//! This module turns the parsed requests of an API into the dependency edges a
//! stateful request sequence needs: which response value (or dictionary entry,
//! or same-body property) feeds which request input.
//!
//! # Architecture
//!
//! Extraction is a single-threaded batch pass over immutable request data:
//!
//! 1. **Collection**: every fuzzable, writable input becomes a
//!    [`Consumer`]; response body leaves and response headers become response
//!    producers; every named request body node becomes a same-body producer.
//! 2. **Indexing** ([`producer_index`]): producers are frozen into a
//!    [`ProducerIndex`] with sorted lookups by name, endpoint and type.
//! 3. **Writer pre-pass**: trailing path parameters of PUT requests that end up
//!    with a fresh uuid-suffix identity are registered as input-only producers,
//!    so readers of the same resource can bind to them.
//! 4. **Resolution** ([`strategies`]): each consumer runs the ranked strategy
//!    table; the first strategy with an answer wins.
//! 5. **Same-body pass** ([`same_body`]): unresolved body consumers try an
//!    aliased property of their own request body.
//! 6. **Constraints** ([`constraints`]): ordering constraints are derived from
//!    annotations and input-only producers, then equality constraints alias
//!    annotation inputs to their upstream producers.
//! 7. **Assembly**: dependencies are grouped by consumer access path, and any
//!    consumer key bound to two distinct producers fails the extraction.
//!
//! The [`MutationsDictionary`] is moved through the passes and returned in the
//! [`ExtractionResult`]; every uuid-suffix entry the passes synthesize is in it.
//!
//! # Determinism
//!
//! Consumers are processed in canonical order and every multi-candidate lookup
//! is sorted, so the same input always yields byte-identical diagnostics.
//!
//! # Example
//!
//! ```rust,no_run
//! use apichain_cli::config::CompilerConfig;
//! use apichain_cli::dictionary::MutationsDictionary;
//! use apichain_cli::grammar::CompilationInput;
//! use apichain_cli::resolver::DependencyExtractor;
//!
//! # fn example(input: CompilationInput) -> anyhow::Result<()> {
//! let extractor = DependencyExtractor::new(CompilerConfig::default());
//! let result = extractor.extract(&input, MutationsDictionary::with_defaults())?;
//! for dependency in result.unresolved() {
//!     println!("unresolved: {}", dependency.consumer.resource);
//! }
//! # Ok(())
//! # }
//! ```

mod collect;
pub mod constraints;
pub mod dependency_graph;
pub mod producer_index;
pub mod resource;
pub mod same_body;
pub mod strategies;
pub mod types;


use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::annotations::ProducerConsumerAnnotation;
use crate::config::CompilerConfig;
use crate::core::ApichainError;
use crate::dictionary::{MutationsDictionary, PerEndpointDictionaries};
use crate::grammar::{CompilationInput, CustomPayloadType, RequestId};

use collect::ResourceFactory;

pub use collect::validate_request;

pub use constraints::{apply_equality_constraints, finalize_ordering_constraints};
pub use dependency_graph::DependencyGraph;
pub use producer_index::{ProducerIndex, ProducerIndexBuilder};
pub use resource::{ApiResource, ResourceReference};
pub use same_body::{SameBodyMatch, resolve_same_body};
pub use strategies::{
    Resolution, ResolutionContext, STRATEGIES, Strategy, is_valid_producer, resolve,
    same_endpoint_precedence,
};
pub use types::{
    Consumer, ConsumerKey, DynamicObject, InputOrigin, MatchedAnnotation, OrderingConstraint,
    ParameterKind, Producer, ProducerConsumerDependency,
};

/// Counters reported after an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub consumers: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Consumers left without a producer because candidates spanned endpoints.
    pub ambiguous: usize,
    /// Decisions per strategy name.
    pub by_strategy: BTreeMap<String, usize>,
    pub same_body: usize,
    pub equality_aliases: usize,
    pub writer_producers: usize,
    pub uuid_suffix_entries: usize,
}

/// Everything one extraction produces.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Dependencies grouped by consumer access path (or name for parameters).
    pub dependencies: BTreeMap<String, Vec<ProducerConsumerDependency>>,
    pub ordering_constraints: Vec<OrderingConstraint>,
    /// The input dictionary plus every synthesized uuid-suffix entry.
    pub dictionary: MutationsDictionary,
    /// Endpoint-specific dictionaries the code generator consults before `dictionary`.
    pub per_endpoint: PerEndpointDictionaries,
    /// All consumers, in canonical order.
    pub consumers: Vec<Consumer>,
    /// Indexed producers followed by ordering-constraint producers.
    pub producers: Vec<Producer>,
    pub stats: ResolutionStats,
}

impl ExtractionResult {
    /// All dependencies in canonical consumer order.
    #[must_use]
    pub fn all_dependencies(&self) -> Vec<&ProducerConsumerDependency> {
        let mut all: Vec<&ProducerConsumerDependency> = self.dependencies.values().flatten().collect();
        all.sort_by(|a, b| a.consumer.canonical_cmp(&b.consumer));
        all
    }

    /// Dependencies without a producer.
    #[must_use]
    pub fn unresolved(&self) -> Vec<&ProducerConsumerDependency> {
        self.all_dependencies().into_iter().filter(|d| !d.is_resolved()).collect()
    }

    /// The dependency of the consumer named `name` in `request`.
    ///
    /// With several same-named consumers the first in canonical order wins.
    #[must_use]
    pub fn dependency_for(&self, request: &RequestId, name: &str) -> Option<&ProducerConsumerDependency> {
        self.all_dependencies()
            .into_iter()
            .find(|d| d.consumer.request_id() == request && d.consumer.name() == name)
    }

    /// The producer bound to the consumer named `name` in `request`.
    #[must_use]
    pub fn producer_for(&self, request: &RequestId, name: &str) -> Option<&Producer> {
        self.dependency_for(request, name).and_then(|d| d.producer.as_ref())
    }
}

/// Runs the extraction passes under one configuration.
#[derive(Debug, Clone, Default)]
pub struct DependencyExtractor {
    config: CompilerConfig,
    global_annotations: Vec<ProducerConsumerAnnotation>,
    per_endpoint: PerEndpointDictionaries,
}

impl DependencyExtractor {
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            global_annotations: Vec::new(),
            per_endpoint: PerEndpointDictionaries::default(),
        }
    }

    /// Annotations that apply across all requests.
    #[must_use]
    pub fn with_global_annotations(mut self, annotations: Vec<ProducerConsumerAnnotation>) -> Self {
        self.global_annotations = annotations;
        self
    }

    #[must_use]
    pub fn with_per_endpoint_dictionaries(mut self, per_endpoint: PerEndpointDictionaries) -> Self {
        self.per_endpoint = per_endpoint;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Extract every producer/consumer dependency of `input`.
    ///
    /// # Errors
    ///
    /// Fails on malformed input (array path parameters, unsupported parameter
    /// serialization, empty resource names) and when one consumer key is bound
    /// to two distinct producers. Unresolved consumers are not errors.
    pub fn extract(&self, input: &CompilationInput, dictionary: MutationsDictionary) -> Result<ExtractionResult> {
        let factory = ResourceFactory::new(&self.config);
        let mut stats = ResolutionStats::default();

        // Collection
        let mut seen: BTreeSet<&RequestId> = BTreeSet::new();
        let mut consumers: Vec<Consumer> = Vec::new();
        let mut responses = Vec::new();
        let mut builder = ProducerIndexBuilder::new();
        for entry in &input.requests {
            if !seen.insert(&entry.id) {
                tracing::warn!("Duplicate request {} ignored", entry.id);
                continue;
            }
            collect::validate_request(&entry.id, &entry.data)?;

            let mut request_consumers = collect::collect_consumers(factory, &self.config, &entry.id, &entry.data)?;
            collect::attach_annotations(&mut request_consumers, &entry.data, &self.global_annotations);
            consumers.extend(request_consumers);

            responses.extend(collect::collect_response_producers(factory, &entry.id, &entry.data)?);
            for producer in collect::collect_same_body_producers(factory, &entry.id, &entry.data)? {
                builder.add_same_body(producer);
            }
        }
        consumers.sort_by(Consumer::canonical_cmp);
        for response in &responses {
            builder.add_response(response.clone());
        }

        let declared = input
            .requests
            .iter()
            .flat_map(|e| e.data.local_annotations.iter().chain(&e.data.link_annotations))
            .chain(&self.global_annotations);
        for (resource, origin) in collect::annotation_input_producers(declared, &responses, &consumers) {
            builder.add_input_only(resource, origin);
        }
        tracing::info!("Collected {} consumers and {} response producers", consumers.len(), responses.len());

        // Writer pre-pass
        let preliminary = builder.clone().build();
        let mut dictionary = dictionary;
        for consumer in consumers.iter().filter(|c| c.kind == ParameterKind::Path && c.is_writer()) {
            let ctx = self.context(&preliminary);
            let (resolution, updated) = resolve(consumer, &ctx, dictionary);
            dictionary = updated;
            if let Some(Producer::Dictionary {
                payload,
            }) = &resolution.producer
                && payload.payload_type == CustomPayloadType::UuidSuffix
            {
                builder.add_input_only(consumer.resource.clone(), InputOrigin::Writer);
                stats.writer_producers += 1;
            }
        }
        let index = builder.build();

        // Main pass
        let mut dependencies: Vec<ProducerConsumerDependency> = Vec::with_capacity(consumers.len());
        for consumer in &consumers {
            let ctx = self.context(&index);
            let (resolution, updated) = resolve(consumer, &ctx, dictionary);
            dictionary = updated;
            if let Some(strategy) = resolution.strategy
                && resolution.producer.is_some()
            {
                *stats.by_strategy.entry(strategy.to_string()).or_default() += 1;
            }
            if resolution.ambiguous {
                stats.ambiguous += 1;
            }
            dependencies.push(ProducerConsumerDependency {
                consumer: consumer.clone(),
                producer: resolution.producer,
            });
        }

        // Same-body pass
        for position in 0..dependencies.len() {
            if dependencies[position].producer.is_some() {
                continue;
            }
            let (found, updated) =
                resolve_same_body(&dependencies[position].consumer, &index, &self.config.same_body.aliases, dictionary);
            dictionary = updated;
            let Some(found) = found else {
                continue;
            };
            if let Some(producing) = dependencies
                .iter_mut()
                .find(|d| d.producer.is_none() && d.consumer.resource == found.producer)
            {
                producing.producer = Some(Producer::Dictionary {
                    payload: found.producer_payload.clone(),
                });
            }
            dependencies[position].producer = Some(Producer::SameBody {
                resource: found.producer,
            });
            stats.same_body += 1;
        }

        // Constraints
        let owned = input.requests.iter().flat_map(|e| {
            e.data
                .local_annotations
                .iter()
                .chain(&e.data.link_annotations)
                .map(move |a| (a, Some(&e.id)))
        });
        let global = self.global_annotations.iter().map(|a| (a, None));
        let mut ordering = constraints::annotation_ordering_constraints(owned.chain(global));
        ordering.extend(constraints::input_only_ordering_constraints(&dependencies));
        stats.equality_aliases = apply_equality_constraints(&mut dependencies);
        let ordering_constraints = finalize_ordering_constraints(ordering);

        // Assembly
        let dependency_map = group_dependencies(dependencies)?;

        stats.consumers = consumers.len();
        stats.resolved = dependency_map.values().flatten().filter(|d| d.is_resolved()).count();
        stats.unresolved = stats.consumers - stats.resolved;
        stats.uuid_suffix_entries = dictionary.uuid_suffix_count();
        tracing::info!(
            "Resolved {}/{} consumers ({} ambiguous, {} same-body, {} aliased, {} ordering constraints)",
            stats.resolved,
            stats.consumers,
            stats.ambiguous,
            stats.same_body,
            stats.equality_aliases,
            ordering_constraints.len()
        );

        let mut producers = index.snapshot();
        producers.extend(constraints::ordering_producers(&ordering_constraints));

        Ok(ExtractionResult {
            dependencies: dependency_map,
            ordering_constraints,
            dictionary,
            per_endpoint: self.per_endpoint.clone(),
            consumers,
            producers,
            stats,
        })
    }

    const fn context<'a>(&'a self, index: &'a ProducerIndex) -> ResolutionContext<'a> {
        ResolutionContext {
            index,
            per_endpoint: &self.per_endpoint,
            allow_get_producers: self.config.allow_get_producers,
        }
    }
}

/// Group dependencies by map key, rejecting a consumer key bound twice.
fn group_dependencies(
    dependencies: Vec<ProducerConsumerDependency>,
) -> Result<BTreeMap<String, Vec<ProducerConsumerDependency>>, ApichainError> {
    let mut bound: BTreeMap<ConsumerKey, Producer> = BTreeMap::new();
    let mut grouped: BTreeMap<String, Vec<ProducerConsumerDependency>> = BTreeMap::new();

    for dependency in dependencies {
        if let Some(producer) = &dependency.producer {
            let key = dependency.consumer.key();
            match bound.get(&key) {
                Some(existing) if existing != producer => {
                    return Err(ApichainError::ResolutionConflict {
                        key: key.to_string(),
                        existing: existing.to_string(),
                        new: producer.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    bound.insert(key, producer.clone());
                }
            }
        }
        grouped.entry(dependency.consumer.resource.map_key()).or_default().push(dependency);
    }
    Ok(grouped)
}
