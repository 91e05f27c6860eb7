//! Request grammar input model.
//!
//! The schema layer (outside this crate) parses an API description into one
//! [`RequestData`] per operation. Each parameter, request body and response body
//! is delivered as a [`Tree`] of [`LeafNode`]s and [`InternalNode`]s. This module
//! owns those types plus the identifiers the resolver keys everything on:
//! [`RequestId`] and [`AccessPath`].
//!
//! # Input Format
//!
//! The CLI reads the trees from a JSON document:
//!
//! ```json
//! {
//!   "requests": [
//!     {
//!       "id": { "endpoint": "/stores/{storeId}", "method": "GET" },
//!       "data": {
//!         "path_parameters": [
//!           { "name": "storeId",
//!             "payload": { "node": "leaf", "name": "storeId",
//!                          "payload": { "kind": "fuzzable", "primitive_type": "string" } } }
//!         ]
//!       }
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::annotations::ProducerConsumerAnnotation;

/// Marker used in an [`AccessPath`] for "any element of this array".
pub const ARRAY_MARKER: &str = "[0]";

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl OperationMethod {
    /// Rank used for the canonical ordering of consumers in diagnostics.
    ///
    /// Creating methods come first so that dumps read in the order requests
    /// usually execute.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Post => 0,
            Self::Put => 1,
            Self::Patch => 2,
            Self::Get => 3,
            Self::Delete => 4,
            Self::Head => 5,
            Self::Options => 6,
            Self::Trace => 7,
        }
    }

    /// Lower-case method name, as used in dynamic object names.
    #[must_use]
    pub const fn as_lower(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for OperationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_lower().to_uppercase())
    }
}

impl std::str::FromStr for OperationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "delete" => Ok(Self::Delete),
            "head" => Ok(Self::Head),
            "options" => Ok(Self::Options),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown HTTP method '{other}'")),
        }
    }
}

/// Split an endpoint template into its non-empty segments.
///
/// `"/api/accounts/{accountId}"` becomes `["api", "accounts", "{accountId}"]`.
#[must_use]
pub fn endpoint_parts(endpoint: &str) -> Vec<&str> {
    endpoint.split('/').filter(|p| !p.is_empty()).collect()
}

/// Whether an endpoint segment is a path parameter (`{name}`).
#[must_use]
pub fn is_path_parameter(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}

/// Whether `ancestor` is a proper prefix of `descendant`, segment-wise.
#[must_use]
pub fn is_strict_endpoint_ancestor(ancestor: &str, descendant: &str) -> bool {
    let a = endpoint_parts(ancestor);
    let d = endpoint_parts(descendant);
    a.len() < d.len() && d.starts_with(&a)
}

/// Normalize an endpoint for comparisons (drops empty segments and trailing slashes).
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    format!("/{}", endpoint_parts(endpoint).join("/"))
}

/// Identifies one API operation.
///
/// Equality, ordering and hashing consider only `(endpoint, method)`; the
/// alternate path alias is carried for code generation but never distinguishes
/// two requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestId {
    /// Endpoint template, e.g. `/stores/{storeId}`.
    pub endpoint: String,
    /// HTTP method.
    pub method: OperationMethod,
    /// Alternate path under which the same operation is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_path: Option<String>,
}

impl RequestId {
    /// Create a request id for `method endpoint`.
    pub fn new(endpoint: impl Into<String>, method: OperationMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            alternate_path: None,
        }
    }

    /// Attach an alternate path alias.
    #[must_use]
    pub fn with_alternate_path(mut self, path: impl Into<String>) -> Self {
        self.alternate_path = Some(path.into());
        self
    }

    /// Content hash used as a stable map key (`sha256:` of `METHOD endpoint`).
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.to_string().as_bytes());
        hasher.update(b" ");
        hasher.update(normalize_endpoint(&self.endpoint).as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    /// Segments of the endpoint template.
    #[must_use]
    pub fn endpoint_parts(&self) -> Vec<&str> {
        endpoint_parts(&self.endpoint)
    }

    fn key(&self) -> (String, OperationMethod) {
        (normalize_endpoint(&self.endpoint), self.method)
    }
}

impl PartialEq for RequestId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for RequestId {}

impl Hash for RequestId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for RequestId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RequestId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}

/// Location of a property inside a JSON body.
///
/// Segments are property names, with [`ARRAY_MARKER`] standing for array
/// elements. Rendered as a JSON-pointer-style string: `/items/[0]/id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessPath(Vec<String>);

impl AccessPath {
    /// The empty (root) path.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a JSON-pointer-style string.
    #[must_use]
    pub fn parse(pointer: &str) -> Self {
        Self(pointer.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect())
    }

    /// Path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Path with the last segment removed, `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The last property name, skipping array markers.
    #[must_use]
    pub fn name_part(&self) -> Option<&str> {
        self.property_names().last()
    }

    /// Property names excluding array markers.
    pub fn property_names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.iter().map(String::as_str).filter(|s| *s != ARRAY_MARKER)
    }

    /// Whether `self` is a proper prefix of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Raw segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON-pointer-style rendering.
    #[must_use]
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            out.push('/');
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

impl Serialize for AccessPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pointer())
    }
}

impl<'de> Deserialize<'de> for AccessPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pointer = String::deserialize(deserializer)?;
        Ok(Self::parse(&pointer))
    }
}

/// Primitive type of a payload value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    String,
    Object,
    Number,
    Int,
    Bool,
    Uuid,
    DateTime,
    Date,
}

/// Kind of a user-supplied custom payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomPayloadType {
    String,
    UuidSuffix,
    Header,
    Query,
}

/// The value a leaf carries in the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FuzzingPayload {
    /// Fixed value declared by the schema (e.g. an enum with one member).
    Constant {
        primitive_type: PrimitiveType,
        value: String,
    },
    /// Value the fuzzer may choose; a candidate for dependency substitution.
    Fuzzable {
        primitive_type: PrimitiveType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<String>,
    },
    /// Value already bound to a dictionary entry by the schema layer.
    Custom {
        payload_type: CustomPayloadType,
        primitive_type: PrimitiveType,
        value: String,
        #[serde(default)]
        is_object: bool,
    },
}

impl FuzzingPayload {
    /// Fuzzable payload of the given type with no default.
    #[must_use]
    pub const fn fuzzable(primitive_type: PrimitiveType) -> Self {
        Self::Fuzzable {
            primitive_type,
            default_value: None,
        }
    }

    #[must_use]
    pub const fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Constant {
                primitive_type,
                ..
            }
            | Self::Fuzzable {
                primitive_type,
                ..
            }
            | Self::Custom {
                primitive_type,
                ..
            } => *primitive_type,
        }
    }

    #[must_use]
    pub const fn is_fuzzable(&self) -> bool {
        matches!(self, Self::Fuzzable { .. })
    }
}

const fn default_true() -> bool {
    true
}

/// A leaf of a parameter or body tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafNode {
    /// Property name; empty for array elements.
    #[serde(default)]
    pub name: String,
    pub payload: FuzzingPayload,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub is_readonly: bool,
}

/// Shape of an internal node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedKind {
    #[default]
    Object,
    Array,
}

/// An object or array node with children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalNode {
    /// Property name; empty for the body root and for array elements.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: NestedKind,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub is_readonly: bool,
    #[serde(default)]
    pub children: Vec<Tree>,
}

/// Parameter or body schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Tree {
    Leaf(LeafNode),
    Internal(InternalNode),
}

/// One node reached while walking a [`Tree`].
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Leaf(&'a LeafNode),
    Internal(&'a InternalNode),
}

impl NodeRef<'_> {
    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        match self {
            NodeRef::Leaf(leaf) => leaf.is_readonly,
            NodeRef::Internal(node) => node.is_readonly,
        }
    }
}

impl Tree {
    /// Leaf with a fuzzable payload.
    pub fn fuzzable_leaf(name: impl Into<String>, primitive_type: PrimitiveType) -> Self {
        Self::Leaf(LeafNode {
            name: name.into(),
            payload: FuzzingPayload::fuzzable(primitive_type),
            is_required: true,
            is_readonly: false,
        })
    }

    /// Object node with the given children.
    pub fn object(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Internal(InternalNode {
            name: name.into(),
            kind: NestedKind::Object,
            is_required: true,
            is_readonly: false,
            children,
        })
    }

    /// Array node whose single child describes the elements.
    pub fn array(name: impl Into<String>, element: Self) -> Self {
        Self::Internal(InternalNode {
            name: name.into(),
            kind: NestedKind::Array,
            is_required: true,
            is_readonly: false,
            children: vec![element],
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(leaf) => &leaf.name,
            Self::Internal(node) => &node.name,
        }
    }

    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Internal(InternalNode { kind: NestedKind::Array, .. }))
    }

    /// Depth-first walk calling `visit` with the access path of every node.
    ///
    /// Named nodes extend the path by their name; array nodes additionally push
    /// [`ARRAY_MARKER`] before their element.
    pub fn walk<'a>(&'a self, base: &AccessPath, visit: &mut impl FnMut(&AccessPath, NodeRef<'a>)) {
        match self {
            Self::Leaf(leaf) => {
                let path = if leaf.name.is_empty() {
                    base.clone()
                } else {
                    base.child(leaf.name.clone())
                };
                visit(&path, NodeRef::Leaf(leaf));
            }
            Self::Internal(node) => {
                let mut path = if node.name.is_empty() {
                    base.clone()
                } else {
                    base.child(node.name.clone())
                };
                if !path.is_empty() {
                    visit(&path, NodeRef::Internal(node));
                }
                if node.kind == NestedKind::Array {
                    path = path.child(ARRAY_MARKER);
                }
                for child in &node.children {
                    child.walk(&path, visit);
                }
            }
        }
    }

    /// All leaves with their access paths, in document order.
    #[must_use]
    pub fn leaves(&self) -> Vec<(AccessPath, &LeafNode)> {
        let mut out = Vec::new();
        self.walk(&AccessPath::root(), &mut |path, node| {
            if let NodeRef::Leaf(leaf) = node {
                out.push((path.clone(), leaf));
            }
        });
        out
    }
}

/// OpenAPI parameter serialization style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SerializationStyle {
    Form,
    Simple,
    Matrix,
    Label,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl SerializationStyle {
    /// Styles the grammar generator can express.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Form | Self::Simple)
    }
}

impl fmt::Display for SerializationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Form => "form",
            Self::Simple => "simple",
            Self::Matrix => "matrix",
            Self::Label => "label",
            Self::SpaceDelimited => "spaceDelimited",
            Self::PipeDelimited => "pipeDelimited",
            Self::DeepObject => "deepObject",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSerialization {
    pub style: SerializationStyle,
    #[serde(default)]
    pub explode: bool,
}

/// A path, query or header parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameter {
    pub name: String,
    pub payload: Tree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialization: Option<ParameterSerialization>,
}

impl RequestParameter {
    /// Parameter whose payload is a single fuzzable leaf of the same name.
    pub fn fuzzable(name: impl Into<String>, primitive_type: PrimitiveType) -> Self {
        let name = name.into();
        Self {
            payload: Tree::fuzzable_leaf(name.clone(), primitive_type),
            name,
            serialization: None,
        }
    }
}

/// Everything the schema layer knows about one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData {
    #[serde(default)]
    pub path_parameters: Vec<RequestParameter>,
    #[serde(default)]
    pub query_parameters: Vec<RequestParameter>,
    #[serde(default)]
    pub header_parameters: Vec<RequestParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Tree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Tree>,
    #[serde(default)]
    pub response_headers: Vec<RequestParameter>,
    /// Annotations declared on this operation; their consumer is the operation.
    #[serde(default)]
    pub local_annotations: Vec<ProducerConsumerAnnotation>,
    /// Annotations derived from response links.
    #[serde(default)]
    pub link_annotations: Vec<ProducerConsumerAnnotation>,
}

/// One parsed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEntry {
    pub id: RequestId,
    pub data: RequestData,
}

/// The parsed API surface handed to the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationInput {
    #[serde(default)]
    pub requests: Vec<RequestEntry>,
}
