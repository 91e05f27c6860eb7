//! Multi-key index over every known producer.
//!
//! [`ProducerIndexBuilder`] collects producers while request trees are walked;
//! [`ProducerIndexBuilder::build`] sorts every bucket by `(request, access path,
//! name)` and freezes the result into a [`ProducerIndex`]. Nothing is removed
//! once added, and every lookup returns candidates in that stable order so
//! "first wins" rules downstream are deterministic.

use std::collections::BTreeMap;

use super::resource::ApiResource;
use super::types::{InputOrigin, Producer};
use crate::grammar::{AccessPath, RequestId, normalize_endpoint};
use crate::naming::type_key;

/// Accumulates producers before the index is frozen.
#[derive(Debug, Clone, Default)]
pub struct ProducerIndexBuilder {
    responses: Vec<ApiResource>,
    same_body: Vec<ApiResource>,
    input_only: Vec<(ApiResource, InputOrigin)>,
}

impl ProducerIndexBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A response body property or response header.
    pub fn add_response(&mut self, resource: ApiResource) -> &mut Self {
        self.responses.push(resource);
        self
    }

    /// A request body node that may feed a sibling in the same body.
    pub fn add_same_body(&mut self, resource: ApiResource) -> &mut Self {
        self.same_body.push(resource);
        self
    }

    /// A request input whose value is assigned at send time.
    pub fn add_input_only(&mut self, resource: ApiResource, origin: InputOrigin) -> &mut Self {
        let duplicate = self.input_only.iter().any(|(r, _)| r == &resource);
        if !duplicate {
            self.input_only.push((resource, origin));
        }
        self
    }

    /// Sort every bucket and freeze the index.
    #[must_use]
    pub fn build(self) -> ProducerIndex {
        let mut by_name_endpoint: BTreeMap<(String, String), Vec<ApiResource>> = BTreeMap::new();
        let mut by_type: BTreeMap<String, Vec<ApiResource>> = BTreeMap::new();
        for resource in self.responses {
            if let Some(primary) = resource.primary_type() {
                by_type.entry(type_key(primary)).or_default().push(resource.clone());
            }
            by_name_endpoint
                .entry((resource.name().to_string(), normalize_endpoint(&resource.request_id.endpoint)))
                .or_default()
                .push(resource);
        }

        let mut same_body: BTreeMap<String, Vec<ApiResource>> = BTreeMap::new();
        for resource in self.same_body {
            same_body.entry(resource.name().to_string()).or_default().push(resource);
        }

        let mut input_only: BTreeMap<String, Vec<(ApiResource, InputOrigin)>> = BTreeMap::new();
        for (resource, origin) in self.input_only {
            input_only.entry(resource.name().to_string()).or_default().push((resource, origin));
        }

        for bucket in by_name_endpoint.values_mut().chain(by_type.values_mut()).chain(same_body.values_mut()) {
            bucket.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            bucket.dedup();
        }
        for bucket in input_only.values_mut() {
            bucket.sort_by(|a, b| a.0.sort_key().cmp(&b.0.sort_key()));
        }

        ProducerIndex {
            by_name_endpoint,
            by_type,
            same_body,
            input_only,
        }
    }
}

/// Frozen producer lookups.
#[derive(Debug, Clone, Default)]
pub struct ProducerIndex {
    by_name_endpoint: BTreeMap<(String, String), Vec<ApiResource>>,
    by_type: BTreeMap<String, Vec<ApiResource>>,
    same_body: BTreeMap<String, Vec<ApiResource>>,
    input_only: BTreeMap<String, Vec<(ApiResource, InputOrigin)>>,
}

impl ProducerIndex {
    /// Response producers named `name` at `endpoint`.
    #[must_use]
    pub fn responses_by_name_and_endpoint(&self, name: &str, endpoint: &str) -> &[ApiResource] {
        self.by_name_endpoint
            .get(&(name.to_string(), normalize_endpoint(endpoint)))
            .map_or(&[], Vec::as_slice)
    }

    /// Response producers whose primary type is `type_name`, in any convention.
    #[must_use]
    pub fn responses_by_type(&self, type_name: &str) -> &[ApiResource] {
        self.by_type.get(&type_key(type_name)).map_or(&[], Vec::as_slice)
    }

    /// Response producers of `request` matching a name or an exact access path.
    pub fn responses_of_request<'a>(
        &'a self,
        request: &'a RequestId,
        name: Option<&'a str>,
        access_path: Option<&'a AccessPath>,
    ) -> impl Iterator<Item = &'a ApiResource> + 'a {
        self.by_name_endpoint
            .iter()
            .filter(move |((_, endpoint), _)| *endpoint == normalize_endpoint(&request.endpoint))
            .flat_map(|(_, bucket)| bucket.iter())
            .filter(move |r| &r.request_id == request)
            .filter(move |r| name.is_none_or(|n| r.name() == n))
            .filter(move |r| access_path.is_none_or(|p| r.access_path() == Some(p)))
    }

    /// Same-body producers named `name`.
    #[must_use]
    pub fn same_body(&self, name: &str) -> &[ApiResource] {
        self.same_body.get(name).map_or(&[], Vec::as_slice)
    }

    /// Input-only producers named `name`.
    #[must_use]
    pub fn input_only(&self, name: &str) -> &[(ApiResource, InputOrigin)] {
        self.input_only.get(name).map_or(&[], Vec::as_slice)
    }

    /// Every producer, grouped by variant and in index order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Producer> {
        let mut producers: Vec<Producer> = self
            .by_name_endpoint
            .values()
            .flatten()
            .map(|r| Producer::Response {
                resource: r.clone(),
            })
            .collect();
        producers.extend(self.same_body.values().flatten().map(|r| Producer::SameBody {
            resource: r.clone(),
        }));
        producers.extend(self.input_only.values().flatten().map(|(r, origin)| Producer::InputOnly {
            resource: r.clone(),
            origin: *origin,
        }));
        producers
    }
}
