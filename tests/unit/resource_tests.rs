//! Resource containers and derived naming data.

use apichain_cli::grammar::{AccessPath, OperationMethod, PrimitiveType, RequestId};
use apichain_cli::naming::NamingConvention;
use apichain_cli::resolver::resource::{
    ApiResource, ResourceReference, endpoint_container_name, path_container_name,
};

fn resource(endpoint: &str, reference: ResourceReference) -> ApiResource {
    ApiResource::new(
        RequestId::new(endpoint, OperationMethod::Post),
        reference,
        NamingConvention::CamelCase,
        PrimitiveType::String,
    )
    .unwrap()
}

#[test]
fn containers_from_endpoint_segments() {
    assert_eq!(path_container_name(&["stores", "{storeId}"]), Some("stores".to_string()));
    assert_eq!(path_container_name(&["{a}", "{b}"]), None);
    assert_eq!(endpoint_container_name(&["stores"]), Some("stores".to_string()));
    assert_eq!(endpoint_container_name(&["stores", "{storeId}"]), Some("stores".to_string()));
    assert_eq!(endpoint_container_name(&["{tenant}", "{id}"]), None);
    assert_eq!(endpoint_container_name(&[]), None);
}

#[test]
fn path_resource_uses_segment_before_parameter() {
    let r = resource(
        "/stores/{storeId}/orders/{orderId}",
        ResourceReference::path("storeId", "/stores/{storeId}/orders/{orderId}"),
    );
    assert_eq!(r.container_name.as_deref(), Some("stores"));
    assert_eq!(r.primary_type(), Some("store"));
    assert_eq!(r.producer_parameter_name, "id");
    assert_eq!(r.reference.parameter_prefix().as_deref(), Some("/stores/{storeId}"));
    assert_eq!(r.map_key(), "storeId");
}

#[test]
fn nested_body_resource_skips_array_marker() {
    let r = resource("/orders", ResourceReference::body(AccessPath::parse("/lineItems/[0]/id")));
    assert!(r.is_nested_body_resource);
    assert_eq!(r.body_container_name.as_deref(), Some("lineItems"));
    assert_eq!(r.candidate_type_names, vec!["lineItem", "line", "item"]);
    assert_eq!(r.map_key(), "/lineItems/[0]/id");
}

#[test]
fn root_request_body_property_has_no_container() {
    let r = resource("/stores", ResourceReference::body(AccessPath::parse("/ownerId")));
    assert!(!r.is_nested_body_resource);
    assert_eq!(r.container_name, None);
    assert_eq!(r.candidate_type_names, vec!["owner"]);
    assert_eq!(r.producer_parameter_name, "id");
}

#[test]
fn root_response_property_takes_endpoint_container() {
    let r = ApiResource::response(
        RequestId::new("/stores", OperationMethod::Post),
        ResourceReference::body(AccessPath::parse("/name")),
        NamingConvention::CamelCase,
        PrimitiveType::String,
    )
    .unwrap();
    assert_eq!(r.container_name.as_deref(), Some("stores"));
    assert_eq!(r.candidate_type_names, vec!["store"]);
}

#[test]
fn empty_names_are_malformed() {
    let err = ApiResource::new(
        RequestId::new("/stores", OperationMethod::Get),
        ResourceReference::Query {
            name: String::new(),
        },
        NamingConvention::CamelCase,
        PrimitiveType::String,
    )
    .unwrap_err();
    assert!(err.to_string().contains("empty query resource name"));
}
