//! Which requests may produce values for which consumers.

use apichain_cli::grammar::{OperationMethod, RequestId};
use apichain_cli::resolver::strategies::{is_valid_producer, same_endpoint_precedence};

use OperationMethod::{Delete, Get, Patch, Post, Put};

const METHODS: [OperationMethod; 4] = [Get, Post, Put, Patch];

#[test]
fn same_endpoint_table() {
    // (producer, consumer, expected) with GET producers allowed.
    let table = [
        (Post, Get, true),
        (Post, Post, false),
        (Post, Put, true),
        (Post, Patch, true),
        (Put, Get, true),
        (Put, Post, false),
        (Put, Put, false),
        (Put, Patch, true),
        (Patch, Get, false),
        (Patch, Post, false),
        (Patch, Put, false),
        (Patch, Patch, false),
        (Get, Get, false),
        (Get, Post, false),
        (Get, Put, false),
        (Get, Patch, false),
    ];
    assert_eq!(table.len(), METHODS.len() * METHODS.len());

    for (producer, consumer, expected) in table {
        let p = RequestId::new("/stores/{storeId}", producer);
        let c = RequestId::new("/stores/{storeId}", consumer);
        assert_eq!(is_valid_producer(&p, &c, true), expected, "{producer:?} -> {consumer:?}");
    }
}

#[test]
fn get_producer_feeds_delete_only_when_allowed() {
    let get = RequestId::new("/stores/{storeId}", Get);
    let delete = RequestId::new("/stores/{storeId}", Delete);
    assert!(is_valid_producer(&get, &delete, true));
    assert!(!is_valid_producer(&get, &delete, false));
}

#[test]
fn parent_endpoint_feeds_child() {
    for (producer, allow_get, expected) in [
        (Post, false, true),
        (Put, false, true),
        (Patch, false, false),
        (Delete, true, false),
        (Get, false, false),
        (Get, true, true),
    ] {
        let p = RequestId::new("/stores", producer);
        for consumer in METHODS {
            let c = RequestId::new("/stores/{storeId}", consumer);
            assert_eq!(
                is_valid_producer(&p, &c, allow_get),
                expected,
                "{producer:?} /stores -> {consumer:?} /stores/{{storeId}}"
            );
        }
    }
}

#[test]
fn child_endpoint_never_feeds_parent() {
    let child = RequestId::new("/stores/{storeId}/orders", Post);
    let parent = RequestId::new("/stores/{storeId}", Get);
    assert!(!is_valid_producer(&child, &parent, true));

    let sibling = RequestId::new("/orders", Get);
    assert!(is_valid_producer(&child, &sibling, false));
}

#[test]
fn precedence_is_independent_of_endpoints() {
    assert!(same_endpoint_precedence(Post, Delete));
    assert!(same_endpoint_precedence(Patch, Get));
    assert!(!same_endpoint_precedence(Patch, Put));
    assert!(!same_endpoint_precedence(Delete, Get));
}
