//! Unit test suite for apichain
//!
//! Table-driven tests of the public naming and producer rules, run against the
//! library as an external crate.
//!
//! ```bash
//! cargo test --test unit
//! ```

mod naming_tests;
mod producer_rules_tests;
mod resource_tests;
