//! Word splitting, singularization and candidate type names.

use apichain_cli::naming::{
    NamingConvention, candidate_type_names, infer_convention, join_words, producer_parameter_name,
    same_type, singularize, split_words,
};

fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|w| (*w).to_string()).collect()
}

#[test]
fn split_and_join_round_trip_per_convention() {
    let cases = [
        ("virtualMachineId", NamingConvention::CamelCase),
        ("VirtualMachineId", NamingConvention::PascalCase),
        ("virtual_machine_id", NamingConvention::UnderscoreSeparator),
        ("virtual-machine-id", NamingConvention::HyphenSeparator),
    ];
    for (identifier, convention) in cases {
        assert_eq!(infer_convention(identifier), convention, "{identifier}");
        let split = split_words(identifier, convention);
        assert_eq!(split, words(&["virtual", "machine", "id"]), "{identifier}");
        assert_eq!(join_words(&split, convention), identifier);
    }
}

#[test]
fn singularize_respects_exceptions() {
    assert_eq!(singularize("stores"), "store");
    assert_eq!(singularize("policies"), "policy");
    assert_eq!(singularize("boxes"), "box");
    assert_eq!(singularize("addresses"), "address");
    for word in ["data", "metadata", "status", "address", "settings", "news"] {
        assert_eq!(singularize(word), word);
    }
}

#[test]
fn same_type_ignores_convention() {
    assert!(same_type("virtualMachine", "virtual_machine"));
    assert!(same_type("VirtualMachine", "virtual-machine"));
    assert!(!same_type("virtualMachine", "machine"));
}

#[test]
fn candidate_types_for_plain_container() {
    let resource = split_words("storeId", NamingConvention::CamelCase);
    assert_eq!(
        candidate_type_names(Some("stores"), NamingConvention::CamelCase, false, &resource),
        words(&["store"])
    );
}

#[test]
fn candidate_types_without_container_drop_last_word() {
    let resource = split_words("accountId", NamingConvention::CamelCase);
    assert_eq!(
        candidate_type_names(None, NamingConvention::CamelCase, false, &resource),
        words(&["account"])
    );
    let single = split_words("id", NamingConvention::CamelCase);
    assert!(candidate_type_names(None, NamingConvention::CamelCase, false, &single).is_empty());
}

#[test]
fn candidate_types_for_nested_container_rank_prefixes_before_suffixes() {
    let resource = split_words("id", NamingConvention::CamelCase);
    assert_eq!(
        candidate_type_names(Some("virtualMachineScaleSets"), NamingConvention::CamelCase, true, &resource),
        words(&[
            "virtualMachineScaleSet",
            "virtualMachineScale",
            "machineScaleSet",
            "virtualMachine",
            "scaleSet",
            "virtual",
            "set",
        ])
    );
}

#[test]
fn producer_parameter_name_strips_type_prefix() {
    let convention = NamingConvention::CamelCase;
    assert_eq!(producer_parameter_name("storeId", convention, &words(&["store"])), "id");
    assert_eq!(producer_parameter_name("storeName", convention, &words(&["store"])), "name");
    assert_eq!(producer_parameter_name("store", convention, &words(&["store"])), "store");
    assert_eq!(producer_parameter_name("orderId", convention, &words(&["store"])), "orderId");
    assert_eq!(
        producer_parameter_name("store_id", NamingConvention::UnderscoreSeparator, &words(&["store"])),
        "id"
    );
}
