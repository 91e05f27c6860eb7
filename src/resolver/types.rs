//! Consumers, producers and the resolved edges between them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::resource::ApiResource;
use crate::annotations::{AnnotationSource, ProducerConsumerAnnotation};
use crate::dictionary::DictionaryPayload;
use crate::grammar::{OperationMethod, PrimitiveType, RequestId};

/// Which part of a request a consumer lives in.
///
/// Declaration order is the canonical ordering used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Path,
    Query,
    Header,
    Body,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        };
        f.write_str(name)
    }
}

/// An annotation matched to a consumer, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedAnnotation {
    pub source: AnnotationSource,
    pub annotation: ProducerConsumerAnnotation,
}

/// A request input that may take its value from a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub resource: ApiResource,
    pub kind: ParameterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<MatchedAnnotation>,
}

impl Consumer {
    #[must_use]
    pub const fn new(resource: ApiResource, kind: ParameterKind) -> Self {
        Self {
            resource,
            kind,
            annotation: None,
        }
    }

    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.resource.request_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.resource.name()
    }

    /// Whether this is the last path parameter of its endpoint.
    #[must_use]
    pub fn is_trailing_path_parameter(&self) -> bool {
        self.kind == ParameterKind::Path
            && self.request_id().endpoint_parts().last().is_some_and(|last| {
                last.strip_prefix('{').and_then(|s| s.strip_suffix('}')) == Some(self.name())
            })
    }

    /// Whether the request assigns this value rather than reading an existing one:
    /// the trailing path parameter of a PUT, or a PUT/POST body property.
    #[must_use]
    pub fn is_writer(&self) -> bool {
        let method = self.request_id().method;
        match self.kind {
            ParameterKind::Path => method == OperationMethod::Put && self.is_trailing_path_parameter(),
            ParameterKind::Body => matches!(method, OperationMethod::Put | OperationMethod::Post),
            ParameterKind::Query | ParameterKind::Header => false,
        }
    }

    /// Key under which at most one producer may be bound.
    #[must_use]
    pub fn key(&self) -> ConsumerKey {
        ConsumerKey {
            request_id: self.request_id().clone(),
            kind: self.kind,
            name: self.name().to_string(),
            access_path: self.resource.map_key(),
        }
    }

    /// Canonical ordering: method rank, parameter kind, access-path key, then
    /// endpoint and name.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.request_id()
            .method
            .rank()
            .cmp(&other.request_id().method.rank())
            .then(self.kind.cmp(&other.kind))
            .then_with(|| self.resource.map_key().cmp(&other.resource.map_key()))
            .then_with(|| self.request_id().cmp(other.request_id()))
            .then_with(|| self.name().cmp(other.name()))
    }
}

/// `(request, parameter kind, resource name, access path)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsumerKey {
    pub request_id: RequestId,
    pub kind: ParameterKind,
    pub name: String,
    pub access_path: String,
}

impl fmt::Display for ConsumerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.request_id, self.kind, self.name, self.access_path)
    }
}

/// Why an input-only producer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    /// Named by an annotation whose producer request has no such response value.
    Annotation,
    /// A PUT path parameter that assigns a fresh uuid-suffix identity.
    Writer,
}

/// A request sequencing constraint with no data flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderingConstraint {
    pub source: RequestId,
    pub target: RequestId,
}

impl fmt::Display for OrderingConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Placeholder in the generated grammar filled in from a producer at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DynamicObject {
    pub name: String,
    pub primitive_type: PrimitiveType,
    /// Set when the value is assigned while sending rather than parsed from a response.
    pub is_writer: bool,
}

impl DynamicObject {
    /// `_<endpoint>_<method>_<path>` with every non-alphanumeric run collapsed to `_`.
    #[must_use]
    pub fn for_resource(resource: &ApiResource, is_writer: bool) -> Self {
        let raw = format!(
            "{}_{}_{}",
            resource.request_id.endpoint,
            resource.request_id.method.as_lower(),
            resource.map_key()
        );
        let mut name = String::from("_");
        let mut pending_separator = false;
        for c in raw.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && name.len() > 1 {
                    name.push('_');
                }
                pending_separator = false;
                name.push(c);
            } else {
                pending_separator = true;
            }
        }
        Self {
            name,
            primitive_type: resource.primitive_type,
            is_writer,
        }
    }
}

/// Something that supplies a consumer's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "producer", rename_all = "snake_case")]
pub enum Producer {
    /// A response body property or response header.
    Response {
        resource: ApiResource,
    },
    /// Another property of the consumer's own request body.
    SameBody {
        resource: ApiResource,
    },
    /// A request input whose value is assigned at send time.
    InputOnly {
        resource: ApiResource,
        origin: InputOrigin,
    },
    /// A mutations dictionary entry.
    Dictionary {
        payload: DictionaryPayload,
    },
    /// Sequencing only; carries no value.
    OrderingConstraint {
        constraint: OrderingConstraint,
    },
}

impl Producer {
    /// The resource behind a value-carrying producer.
    #[must_use]
    pub const fn resource(&self) -> Option<&ApiResource> {
        match self {
            Self::Response {
                resource,
            }
            | Self::SameBody {
                resource,
            }
            | Self::InputOnly {
                resource,
                ..
            } => Some(resource),
            Self::Dictionary {
                ..
            }
            | Self::OrderingConstraint {
                ..
            } => None,
        }
    }

    /// Request that produces the value, if it comes from a request.
    #[must_use]
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::OrderingConstraint {
                constraint,
            } => Some(&constraint.source),
            _ => self.resource().map(|r| &r.request_id),
        }
    }

    /// Dynamic object the code generator declares for this producer.
    #[must_use]
    pub fn dynamic_object(&self) -> Option<DynamicObject> {
        match self {
            Self::Response {
                resource,
            } => Some(DynamicObject::for_resource(resource, false)),
            Self::SameBody {
                resource,
            }
            | Self::InputOnly {
                resource,
                ..
            } => Some(DynamicObject::for_resource(resource, true)),
            Self::Dictionary {
                ..
            }
            | Self::OrderingConstraint {
                ..
            } => None,
        }
    }

    /// Short variant label for logs and statistics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Response {
                ..
            } => "response",
            Self::SameBody {
                ..
            } => "same_body",
            Self::InputOnly {
                ..
            } => "input_only",
            Self::Dictionary {
                ..
            } => "dictionary",
            Self::OrderingConstraint {
                ..
            } => "ordering_constraint",
        }
    }
}

impl fmt::Display for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dictionary {
                payload,
            } => write!(f, "dictionary {:?} '{}'", payload.payload_type, payload.name),
            Self::OrderingConstraint {
                constraint,
            } => write!(f, "ordering {constraint}"),
            _ => match self.resource() {
                Some(resource) => write!(f, "{} {resource}", self.label()),
                None => f.write_str(self.label()),
            },
        }
    }
}

/// A consumer and the producer bound to it; `None` when unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerConsumerDependency {
    pub consumer: Consumer,
    pub producer: Option<Producer>,
}

impl ProducerConsumerDependency {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.producer.is_some()
    }
}
