//! Producer/consumer annotations.
//!
//! Annotations let users override inference. Each one names a producer
//! request and, optionally, the value it produces and the consumer it feeds:
//!
//! ```json
//! {
//!   "x-restler-global-annotations": [
//!     {
//!       "producer_endpoint": "/stores",
//!       "producer_method": "POST",
//!       "producer_resource_name": "id",
//!       "consumer_endpoint": "/stores/{storeId}/orders",
//!       "consumer_method": "POST",
//!       "consumer_param": "storeId",
//!       "except": [{ "consumer_endpoint": "/stores/{storeId}", "consumer_method": "DELETE" }]
//!     }
//!   ]
//! }
//! ```
//!
//! A resource name starting with `/` is an access path into the body rather
//! than a name. An annotation without any parameter only orders the two
//! requests. Annotations come from three places, in decreasing precedence:
//! local annotations declared on the consuming operation, the global file,
//! and response links.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::core::ApichainError;
use crate::grammar::{AccessPath, OperationMethod, RequestId};

/// Key of the global annotation list inside an annotation file.
pub const GLOBAL_ANNOTATIONS_KEY: &str = "x-restler-global-annotations";

/// Where an annotation was declared. Ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSource {
    Local,
    Global,
    Link,
}

/// A resource named by an annotation: a bare name or an access path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationResource {
    Name(String),
    Path(AccessPath),
}

impl AnnotationResource {
    /// `"/a/b"` is a path, anything else a name.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.starts_with('/') {
            Self::Path(AccessPath::parse(value))
        } else {
            Self::Name(value.to_string())
        }
    }

    /// Whether a resource with this name and optional body path is the one named.
    #[must_use]
    pub fn matches(&self, name: &str, access_path: Option<&AccessPath>) -> bool {
        match self {
            Self::Name(n) => n == name,
            Self::Path(p) => access_path == Some(p),
        }
    }
}

impl fmt::Display for AnnotationResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

/// One user-declared producer/consumer relationship.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAnnotation", into = "RawAnnotation")]
pub struct ProducerConsumerAnnotation {
    pub producer_id: RequestId,
    /// `None` for local annotations, whose consumer is the declaring request.
    pub consumer_id: Option<RequestId>,
    pub producer_parameter: Option<AnnotationResource>,
    pub consumer_parameter: Option<AnnotationResource>,
    /// Consumer requests the annotation does not apply to.
    pub except: Vec<RequestId>,
}

impl ProducerConsumerAnnotation {
    /// Annotation binding `producer_parameter` of `producer_id` to a consumer.
    #[must_use]
    pub fn new(producer_id: RequestId, producer_parameter: AnnotationResource) -> Self {
        Self {
            producer_id,
            consumer_id: None,
            producer_parameter: Some(producer_parameter),
            consumer_parameter: None,
            except: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_consumer(mut self, consumer_id: RequestId) -> Self {
        self.consumer_id = Some(consumer_id);
        self
    }

    #[must_use]
    pub fn with_consumer_parameter(mut self, parameter: AnnotationResource) -> Self {
        self.consumer_parameter = Some(parameter);
        self
    }

    #[must_use]
    pub fn with_except(mut self, request: RequestId) -> Self {
        self.except.push(request);
        self
    }

    /// Annotation that only sequences two requests.
    #[must_use]
    pub const fn ordering(producer_id: RequestId, consumer_id: RequestId) -> Self {
        Self {
            producer_id,
            consumer_id: Some(consumer_id),
            producer_parameter: None,
            consumer_parameter: None,
            except: Vec::new(),
        }
    }

    /// True when no parameter is named on either side.
    #[must_use]
    pub const fn is_ordering_only(&self) -> bool {
        self.producer_parameter.is_none() && self.consumer_parameter.is_none()
    }

    /// The consumer-side parameter, defaulting to the producer's resource name.
    #[must_use]
    pub fn effective_consumer_parameter(&self) -> Option<&AnnotationResource> {
        self.consumer_parameter.as_ref().or(self.producer_parameter.as_ref())
    }

    /// Whether this annotation feeds the resource `name`/`access_path` of `request`.
    #[must_use]
    pub fn applies_to(&self, request: &RequestId, name: &str, access_path: Option<&AccessPath>) -> bool {
        if self.is_ordering_only() || self.except.contains(request) {
            return false;
        }
        if let Some(consumer) = &self.consumer_id
            && consumer != request
        {
            return false;
        }
        self.effective_consumer_parameter().is_some_and(|p| p.matches(name, access_path))
    }
}

impl fmt::Display for ProducerConsumerAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.producer_id)?;
        if let Some(parameter) = &self.producer_parameter {
            write!(f, " [{parameter}]")?;
        }
        if let Some(consumer) = &self.consumer_id {
            write!(f, " -> {consumer}")?;
        }
        if let Some(parameter) = &self.consumer_parameter {
            write!(f, " [{parameter}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawExcept {
    consumer_endpoint: String,
    consumer_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAnnotation {
    producer_endpoint: String,
    producer_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    producer_resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consumer_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consumer_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consumer_param: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    except: Vec<RawExcept>,
}

fn request_id(endpoint: &str, method: &str) -> Result<RequestId, String> {
    let method: OperationMethod = method.parse()?;
    Ok(RequestId::new(endpoint, method))
}

impl TryFrom<RawAnnotation> for ProducerConsumerAnnotation {
    type Error = String;

    fn try_from(raw: RawAnnotation) -> Result<Self, Self::Error> {
        let producer_id = request_id(&raw.producer_endpoint, &raw.producer_method)?;
        let consumer_id = match (raw.consumer_endpoint, raw.consumer_method) {
            (Some(endpoint), Some(method)) => Some(request_id(&endpoint, &method)?),
            (None, None) => None,
            _ => {
                return Err(format!(
                    "annotation for producer {producer_id} must give both consumer_endpoint and consumer_method"
                ));
            }
        };
        let except = raw
            .except
            .iter()
            .map(|e| request_id(&e.consumer_endpoint, &e.consumer_method))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            producer_id,
            consumer_id,
            producer_parameter: raw.producer_resource_name.as_deref().map(AnnotationResource::parse),
            consumer_parameter: raw.consumer_param.as_deref().map(AnnotationResource::parse),
            except,
        })
    }
}

impl From<ProducerConsumerAnnotation> for RawAnnotation {
    fn from(annotation: ProducerConsumerAnnotation) -> Self {
        Self {
            producer_endpoint: annotation.producer_id.endpoint.clone(),
            producer_method: annotation.producer_id.method.to_string(),
            producer_resource_name: annotation.producer_parameter.map(|p| p.to_string()),
            consumer_endpoint: annotation.consumer_id.as_ref().map(|c| c.endpoint.clone()),
            consumer_method: annotation.consumer_id.as_ref().map(|c| c.method.to_string()),
            consumer_param: annotation.consumer_parameter.map(|p| p.to_string()),
            except: annotation
                .except
                .into_iter()
                .map(|e| RawExcept {
                    consumer_endpoint: e.endpoint,
                    consumer_method: e.method.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnnotationFile {
    #[serde(rename = "x-restler-global-annotations", default)]
    annotations: Vec<ProducerConsumerAnnotation>,
}

/// Parse the global annotation list from JSON text.
pub fn parse_global_annotations(content: &str) -> serde_json::Result<Vec<ProducerConsumerAnnotation>> {
    let file: AnnotationFile = serde_json::from_str(content)?;
    Ok(file.annotations)
}

/// Load the global annotation list from a file.
///
/// # Errors
///
/// Returns [`ApichainError::AnnotationParseError`] for malformed content.
pub fn load_global_annotations(path: &Path) -> Result<Vec<ProducerConsumerAnnotation>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read annotations: {}", path.display()))?;
    let annotations =
        parse_global_annotations(&content).map_err(|e| ApichainError::AnnotationParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    tracing::debug!("Loaded {} global annotations from {}", annotations.len(), path.display());
    Ok(annotations)
}

/// The first annotation feeding a resource, searching local, global then link
/// annotations.
#[must_use]
pub fn find_annotation<'a>(
    local: &'a [ProducerConsumerAnnotation],
    global: &'a [ProducerConsumerAnnotation],
    link: &'a [ProducerConsumerAnnotation],
    request: &RequestId,
    name: &str,
    access_path: Option<&AccessPath>,
) -> Option<(AnnotationSource, &'a ProducerConsumerAnnotation)> {
    [
        (AnnotationSource::Local, local),
        (AnnotationSource::Global, global),
        (AnnotationSource::Link, link),
    ]
    .into_iter()
    .find_map(|(source, annotations)| {
        annotations
            .iter()
            .find(|a| a.applies_to(request, name, access_path))
            .map(|a| (source, a))
    })
}
