//! Test fixtures for creating sample data structures
//!
//! This module provides builders for request data and sample configuration
//! files.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::annotations::ProducerConsumerAnnotation;
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::grammar::{
    CompilationInput, OperationMethod, PrimitiveType, RequestData, RequestEntry, RequestId,
    RequestParameter, Tree, endpoint_parts,
};

/// Builder for one request of a [`CompilationInput`].
///
/// Path parameters are derived from the endpoint as fuzzable strings; use
/// [`RequestFixture::path_param_type`] to change one.
#[derive(Clone, Debug)]
pub struct RequestFixture {
    id: RequestId,
    data: RequestData,
}

impl RequestFixture {
    pub fn new(method: OperationMethod, endpoint: &str) -> Self {
        let path_parameters = endpoint_parts(endpoint)
            .into_iter()
            .filter_map(|part| part.strip_prefix('{').and_then(|p| p.strip_suffix('}')))
            .map(|name| RequestParameter::fuzzable(name, PrimitiveType::String))
            .collect();
        Self {
            id: RequestId::new(endpoint, method),
            data: RequestData {
                path_parameters,
                ..RequestData::default()
            },
        }
    }

    pub fn get(endpoint: &str) -> Self {
        Self::new(OperationMethod::Get, endpoint)
    }

    pub fn post(endpoint: &str) -> Self {
        Self::new(OperationMethod::Post, endpoint)
    }

    pub fn put(endpoint: &str) -> Self {
        Self::new(OperationMethod::Put, endpoint)
    }

    pub fn patch(endpoint: &str) -> Self {
        Self::new(OperationMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: &str) -> Self {
        Self::new(OperationMethod::Delete, endpoint)
    }

    /// The id the built request will carry.
    pub fn id(&self) -> RequestId {
        self.id.clone()
    }

    pub fn path_param_type(mut self, name: &str, primitive_type: PrimitiveType) -> Self {
        if let Some(parameter) = self.data.path_parameters.iter_mut().find(|p| p.name == name) {
            *parameter = RequestParameter::fuzzable(name, primitive_type);
        }
        self
    }

    pub fn path_param(mut self, parameter: RequestParameter) -> Self {
        self.data.path_parameters.retain(|p| p.name != parameter.name);
        self.data.path_parameters.push(parameter);
        self
    }

    pub fn query(mut self, name: &str, primitive_type: PrimitiveType) -> Self {
        self.data.query_parameters.push(RequestParameter::fuzzable(name, primitive_type));
        self
    }

    pub fn query_param(mut self, parameter: RequestParameter) -> Self {
        self.data.query_parameters.push(parameter);
        self
    }

    pub fn header(mut self, name: &str, primitive_type: PrimitiveType) -> Self {
        self.data.header_parameters.push(RequestParameter::fuzzable(name, primitive_type));
        self
    }

    pub fn body(mut self, body: Tree) -> Self {
        self.data.body = Some(body);
        self
    }

    /// Flat object body with one fuzzable leaf per field.
    pub fn body_fields(self, fields: &[(&str, PrimitiveType)]) -> Self {
        self.body(object_of(fields))
    }

    pub fn response(mut self, body: Tree) -> Self {
        self.data.response_body = Some(body);
        self
    }

    /// Flat object response with one leaf per field.
    pub fn response_fields(self, fields: &[(&str, PrimitiveType)]) -> Self {
        self.response(object_of(fields))
    }

    pub fn response_header(mut self, name: &str) -> Self {
        self.data.response_headers.push(RequestParameter::fuzzable(name, PrimitiveType::String));
        self
    }

    pub fn local_annotation(mut self, annotation: ProducerConsumerAnnotation) -> Self {
        self.data.local_annotations.push(annotation);
        self
    }

    pub fn link_annotation(mut self, annotation: ProducerConsumerAnnotation) -> Self {
        self.data.link_annotations.push(annotation);
        self
    }

    pub fn build(self) -> RequestEntry {
        RequestEntry {
            id: self.id,
            data: self.data,
        }
    }
}

fn object_of(fields: &[(&str, PrimitiveType)]) -> Tree {
    Tree::object("", fields.iter().map(|(name, primitive_type)| Tree::fuzzable_leaf(*name, *primitive_type)).collect())
}

/// Assemble fixtures into an input, keeping their order.
pub fn compilation_input(requests: impl IntoIterator<Item = RequestFixture>) -> CompilationInput {
    CompilationInput {
        requests: requests.into_iter().map(RequestFixture::build).collect(),
    }
}

/// Test fixture for creating sample apichain.toml files
#[derive(Clone, Debug)]
pub struct ConfigFixture {
    pub content: String,
    pub name: String,
}

impl ConfigFixture {
    /// Defaults spelled out
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            content: r"
allow_get_producers = false
resolve_query_dependencies = true
resolve_header_dependencies = false
resolve_body_dependencies = true
"
            .trim()
            .to_string(),
        }
    }

    /// Headers resolved, GET producers allowed, custom same-body alias
    pub fn permissive() -> Self {
        Self {
            name: "permissive".to_string(),
            content: r#"
allow_get_producers = true
resolve_header_dependencies = true
naming_convention = "camel_case"

[same_body.aliases]
id = "name"
key = "label"
"#
            .trim()
            .to_string(),
        }
    }

    /// Configuration with invalid syntax
    pub fn invalid_syntax() -> Self {
        Self {
            name: "invalid_syntax".to_string(),
            content: r"
allow_get_producers = [true
"
            .trim()
            .to_string(),
        }
    }

    /// Configuration with a field the compiler does not know
    pub fn unknown_field() -> Self {
        Self {
            name: "unknown_field".to_string(),
            content: r"
resolve_everything = true
"
            .trim()
            .to_string(),
        }
    }

    /// Write the fixture as `apichain.toml` in `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);
        fs::write(&config_path, &self.content)?;
        Ok(config_path)
    }
}
