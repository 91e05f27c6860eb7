//! Resource references and their situated form, [`ApiResource`].
//!
//! A [`ResourceReference`] says where a value lives (a path parameter, a query
//! or header parameter, or a body property). An [`ApiResource`] attaches that
//! reference to one request and precomputes everything matching needs: the
//! container, the ranked candidate type names and the name a producer is
//! expected to carry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::ApichainError;
use crate::grammar::{AccessPath, PrimitiveType, RequestId, endpoint_parts, is_path_parameter};
use crate::naming::{self, NamingConvention};

/// Container of a path parameter: the literal segment right before it.
///
/// `parts` runs from the endpoint root up to and including the parameter.
#[must_use]
pub fn path_container_name(parts: &[&str]) -> Option<String> {
    match parts {
        [.., container, _] if !is_path_parameter(container) => Some((*container).to_string()),
        _ => None,
    }
}

/// Container implied by an endpoint: its last literal segment, or the literal
/// segment before a trailing parameter.
#[must_use]
pub fn endpoint_container_name(parts: &[&str]) -> Option<String> {
    match parts {
        [] => None,
        [.., last] if !is_path_parameter(last) => Some((*last).to_string()),
        [.., container, _] if !is_path_parameter(container) => Some((*container).to_string()),
        _ => None,
    }
}

/// Where a candidate resource lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceReference {
    /// Path parameter; `path_to_parameter` holds the endpoint segments up to
    /// and including the parameter.
    Path {
        name: String,
        path_to_parameter: Vec<String>,
    },
    Query {
        name: String,
    },
    Header {
        name: String,
    },
    /// Body property at `full_path` (request or response body).
    Body {
        name: String,
        full_path: AccessPath,
    },
}

impl ResourceReference {
    /// Path reference for parameter `name` of `endpoint`.
    ///
    /// The parameter prefix stops at the `{name}` segment; when the parameter
    /// does not appear in the endpoint the whole endpoint is kept.
    #[must_use]
    pub fn path(name: impl Into<String>, endpoint: &str) -> Self {
        let name = name.into();
        let marker = format!("{{{name}}}");
        let parts = endpoint_parts(endpoint);
        let end = parts.iter().position(|p| *p == marker).map_or(parts.len(), |i| i + 1);
        Self::Path {
            path_to_parameter: parts[..end].iter().map(|p| (*p).to_string()).collect(),
            name,
        }
    }

    /// Body reference at `full_path`, named after its last property.
    #[must_use]
    pub fn body(full_path: AccessPath) -> Self {
        Self::Body {
            name: full_path.name_part().unwrap_or_default().to_string(),
            full_path,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Path {
                name,
                ..
            }
            | Self::Query {
                name,
            }
            | Self::Header {
                name,
            }
            | Self::Body {
                name,
                ..
            } => name,
        }
    }

    /// Location inside the body; only body references have one.
    #[must_use]
    pub const fn access_path(&self) -> Option<&AccessPath> {
        match self {
            Self::Body {
                full_path,
                ..
            } => Some(full_path),
            _ => None,
        }
    }

    /// Container of the reference inside `endpoint_parts`.
    ///
    /// A body property at the root of the body has no container.
    #[must_use]
    pub fn container_name(&self, endpoint_parts: &[&str]) -> Option<String> {
        match self {
            Self::Path {
                path_to_parameter,
                ..
            } => {
                let parts: Vec<&str> = path_to_parameter.iter().map(String::as_str).collect();
                path_container_name(&parts)
            }
            Self::Query {
                ..
            }
            | Self::Header {
                ..
            } => endpoint_container_name(endpoint_parts),
            Self::Body {
                ..
            } => self.body_container_name(),
        }
    }

    /// Nearest enclosing property name of a body reference, skipping array markers.
    #[must_use]
    pub fn body_container_name(&self) -> Option<String> {
        self.parent_access_path()
            .and_then(|parent| parent.name_part().map(str::to_string))
    }

    /// Whether the reference sits inside a named body object.
    #[must_use]
    pub fn is_nested_body_resource(&self) -> bool {
        self.body_container_name().is_some()
    }

    /// Access path of the enclosing body node.
    #[must_use]
    pub fn parent_access_path(&self) -> Option<AccessPath> {
        self.access_path().and_then(AccessPath::parent)
    }

    /// Endpoint prefix ending at this path parameter.
    #[must_use]
    pub fn parameter_prefix(&self) -> Option<String> {
        match self {
            Self::Path {
                path_to_parameter,
                ..
            } => Some(format!("/{}", path_to_parameter.join("/"))),
            _ => None,
        }
    }

    /// Short kind label used in keys and logs.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Path {
                ..
            } => "path",
            Self::Query {
                ..
            } => "query",
            Self::Header {
                ..
            } => "header",
            Self::Body {
                ..
            } => "body",
        }
    }
}

/// A resource reference situated in one request, with inferred naming data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiResource {
    pub request_id: RequestId,
    pub reference: ResourceReference,
    pub naming_convention: NamingConvention,
    pub primitive_type: PrimitiveType,
    pub container_name: Option<String>,
    pub body_container_name: Option<String>,
    /// Most specific first.
    pub candidate_type_names: Vec<String>,
    pub producer_parameter_name: String,
    pub is_nested_body_resource: bool,
}

impl ApiResource {
    /// Situate `reference` in `request_id` and derive its naming data.
    ///
    /// # Errors
    ///
    /// Returns [`ApichainError::MalformedResource`] for an empty resource name or
    /// a body reference with an empty access path.
    pub fn new(
        request_id: RequestId,
        reference: ResourceReference,
        naming_convention: NamingConvention,
        primitive_type: PrimitiveType,
    ) -> Result<Self, ApichainError> {
        Self::situate(request_id, reference, naming_convention, primitive_type, false)
    }

    /// Situate a value returned by `request_id`.
    ///
    /// A property at the root of the response body describes the resource the
    /// endpoint returns, so it takes the endpoint container.
    ///
    /// # Errors
    ///
    /// Same as [`ApiResource::new`].
    pub fn response(
        request_id: RequestId,
        reference: ResourceReference,
        naming_convention: NamingConvention,
        primitive_type: PrimitiveType,
    ) -> Result<Self, ApichainError> {
        Self::situate(request_id, reference, naming_convention, primitive_type, true)
    }

    fn situate(
        request_id: RequestId,
        reference: ResourceReference,
        naming_convention: NamingConvention,
        primitive_type: PrimitiveType,
        endpoint_fallback: bool,
    ) -> Result<Self, ApichainError> {
        if let Some(path) = reference.access_path()
            && path.is_empty()
        {
            return Err(ApichainError::MalformedResource {
                request: request_id.to_string(),
                reason: format!("body resource '{}' has no access path", reference.name()),
            });
        }
        if reference.name().is_empty() {
            return Err(ApichainError::MalformedResource {
                request: request_id.to_string(),
                reason: format!("empty {} resource name", reference.kind_label()),
            });
        }

        let parts = request_id.endpoint_parts();
        let container_name = match reference.container_name(&parts) {
            None if endpoint_fallback && reference.access_path().is_some() => endpoint_container_name(&parts),
            container => container,
        };
        let body_container_name = reference.body_container_name();
        let resource_words = naming::split_words(reference.name(), naming_convention);
        let candidate_type_names = naming::candidate_type_names(
            container_name.as_deref(),
            naming_convention,
            body_container_name.is_some(),
            &resource_words,
        );
        let producer_parameter_name = naming::producer_parameter_name(
            reference.name(),
            naming_convention,
            &candidate_type_names,
        );
        let is_nested_body_resource = reference.is_nested_body_resource();

        Ok(Self {
            request_id,
            reference,
            naming_convention,
            primitive_type,
            container_name,
            body_container_name,
            candidate_type_names,
            producer_parameter_name,
            is_nested_body_resource,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.reference.name()
    }

    #[must_use]
    pub const fn access_path(&self) -> Option<&AccessPath> {
        self.reference.access_path()
    }

    /// The most specific candidate type.
    #[must_use]
    pub fn primary_type(&self) -> Option<&str> {
        self.candidate_type_names.first().map(String::as_str)
    }

    /// Dependency map key: the access path pointer, or the bare name.
    #[must_use]
    pub fn map_key(&self) -> String {
        self.access_path().map_or_else(|| self.name().to_string(), AccessPath::to_pointer)
    }

    /// Sort key shared by every multi-candidate lookup.
    #[must_use]
    pub fn sort_key(&self) -> (&RequestId, String, &str, &'static str) {
        (&self.request_id, self.map_key(), self.name(), self.reference.kind_label())
    }
}

impl fmt::Display for ApiResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.request_id, self.reference.kind_label(), self.map_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::OperationMethod;

    fn resource(endpoint: &str, method: OperationMethod, reference: ResourceReference) -> ApiResource {
        ApiResource::new(
            RequestId::new(endpoint, method),
            reference,
            NamingConvention::CamelCase,
            PrimitiveType::String,
        )
        .unwrap()
    }

    #[test]
    fn test_container_inference() {
        assert_eq!(path_container_name(&["api", "accounts", "{accountId}"]), Some("accounts".into()));
        assert_eq!(path_container_name(&["{onlyParam}"]), None);
        assert_eq!(path_container_name(&["{a}", "{b}"]), None);

        assert_eq!(endpoint_container_name(&["api", "accounts"]), Some("accounts".into()));
        assert_eq!(endpoint_container_name(&["accounts", "{accountId}"]), Some("accounts".into()));
        assert_eq!(endpoint_container_name(&["{a}", "{b}"]), None);
        assert_eq!(endpoint_container_name(&[]), None);
    }

    #[test]
    fn test_path_reference_prefix() {
        let reference = ResourceReference::path("accountId", "/api/accounts/{accountId}/orders");
        assert_eq!(reference.parameter_prefix().as_deref(), Some("/api/accounts/{accountId}"));
        assert_eq!(reference.container_name(&[]), Some("accounts".into()));
    }

    #[test]
    fn test_path_resource_naming() {
        let r = resource(
            "/accounts/{accountId}",
            OperationMethod::Get,
            ResourceReference::path("accountId", "/accounts/{accountId}"),
        );
        assert_eq!(r.container_name.as_deref(), Some("accounts"));
        assert_eq!(r.candidate_type_names, vec!["account"]);
        assert_eq!(r.producer_parameter_name, "id");
        assert!(!r.is_nested_body_resource);
    }

    #[test]
    fn test_body_resource_naming() {
        let root = resource(
            "/orders",
            OperationMethod::Post,
            ResourceReference::body(AccessPath::parse("/accountId")),
        );
        assert_eq!(root.container_name, None);
        assert_eq!(root.body_container_name, None);
        assert_eq!(root.candidate_type_names, vec!["account"]);
        assert_eq!(root.producer_parameter_name, "id");

        let bare = resource("/accounts", OperationMethod::Post, ResourceReference::body(AccessPath::parse("/id")));
        assert_eq!(bare.container_name, None);
        assert!(bare.candidate_type_names.is_empty());

        let returned = ApiResource::response(
            RequestId::new("/accounts", OperationMethod::Post),
            ResourceReference::body(AccessPath::parse("/id")),
            NamingConvention::CamelCase,
            PrimitiveType::String,
        )
        .unwrap();
        assert_eq!(returned.container_name.as_deref(), Some("accounts"));
        assert_eq!(returned.candidate_type_names, vec!["account"]);
        assert_eq!(returned.producer_parameter_name, "id");

        let nested = resource(
            "/orders",
            OperationMethod::Post,
            ResourceReference::body(AccessPath::parse("/lineItems/[0]/id")),
        );
        assert_eq!(nested.body_container_name.as_deref(), Some("lineItems"));
        assert_eq!(nested.candidate_type_names, vec!["lineItem", "line", "item"]);
        assert!(nested.is_nested_body_resource);
        assert_eq!(nested.map_key(), "/lineItems/[0]/id");
    }

    #[test]
    fn test_malformed_resources() {
        let id = RequestId::new("/stores", OperationMethod::Post);
        let err = ApiResource::new(
            id.clone(),
            ResourceReference::body(AccessPath::root()),
            NamingConvention::CamelCase,
            PrimitiveType::String,
        )
        .unwrap_err();
        assert!(matches!(err, ApichainError::MalformedResource { .. }));

        let err = ApiResource::new(
            id,
            ResourceReference::Query {
                name: String::new(),
            },
            NamingConvention::CamelCase,
            PrimitiveType::String,
        )
        .unwrap_err();
        assert!(err.to_string().contains("empty query resource name"));
    }
}
