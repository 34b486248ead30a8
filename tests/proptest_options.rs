//! Property-based tests using proptest
//!
//! These tests verify option resolution invariants (required keys, key
//! normalization, merge precedence and coercion) over randomized inputs.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tfog::{
    coerce, OptionSchema, RawOptions, ServiceError, ServiceFactory, StaticCredentials, WarningSink,
};

struct SilentSink;

impl WarningSink for SilentSink {
    fn warn(&self, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

fn schema() -> OptionSchema {
    OptionSchema::builder()
        .requires("api_key")
        .requires("region")
        .recognizes("user")
        .recognizes("port")
        .build()
}

fn factory(globals: &BTreeMap<String, String>) -> ServiceFactory {
    let credentials: StaticCredentials = globals
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    ServiceFactory::new(Arc::new(credentials), Arc::new(false))
        .with_warning_sink(Arc::new(SilentSink))
}

/// Option keys drawn from both declared and undeclared names
fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("api_key".to_string()),
        Just("region".to_string()),
        Just("user".to_string()),
        Just("port".to_string()),
        "[a-z][a-z_]{0,12}",
    ]
}

/// Values that exercise every coercion branch
fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("true".to_string()),
        Just("false".to_string()),
        any::<i64>().prop_map(|n| n.to_string()),
        "[a-zA-Z0-9 .-]{0,16}",
    ]
}

fn arb_options() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(arb_key(), arb_value(), 0..8)
}

fn raw_from(options: &BTreeMap<String, String>, prefix: &str) -> RawOptions {
    options
        .iter()
        .map(|(k, v)| (format!("{}{}", prefix, k), v.clone()))
        .collect()
}

proptest! {
    /// Supplying every required key with a non-null value always succeeds
    #[test]
    fn required_keys_present_succeeds(
        options in arb_options(),
        api_key in arb_value(),
        region in arb_value(),
    ) {
        let raw = raw_from(&options, "")
            .with("api_key", api_key)
            .with("region", region);
        prop_assert!(factory(&BTreeMap::new()).resolve(&raw, &schema()).is_ok());
    }

    /// A required key missing from both options and defaults always fails
    #[test]
    fn required_key_missing_fails(
        options in arb_options(),
        globals in arb_options(),
    ) {
        let mut options = options;
        let mut globals = globals;
        options.remove("region");
        globals.remove("region");

        let result = factory(&globals).resolve(&raw_from(&options, ""), &schema());
        match result {
            Err(ServiceError::MissingRequiredOption { keys }) => {
                prop_assert!(keys.iter().any(|k| k.as_str() == "region"));
            }
            other => prop_assert!(false, "expected missing region, got {:?}", other),
        }
    }

    /// String keys and symbol-style keys resolve identically
    #[test]
    fn key_normalization_is_idempotent(
        options in arb_options(),
        globals in arb_options(),
    ) {
        let factory = factory(&globals);
        let plain = factory.resolve(&raw_from(&options, ""), &schema());
        let symbolic = factory.resolve(&raw_from(&options, ":"), &schema());

        match (plain, symbolic) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            (a, b) => prop_assert!(false, "diverged: {:?} vs {:?}", a, b),
        }
    }

    /// Caller values win over defaults; default-only keys survive
    #[test]
    fn caller_values_override_defaults(
        options in arb_options(),
        globals in arb_options(),
    ) {
        let raw = raw_from(&options, "")
            .with("api_key", "k")
            .with("region", "r");
        let resolved = factory(&globals).resolve(&raw, &schema()).unwrap();

        for (key, value) in &globals {
            let expected = options.get(key).unwrap_or(value);
            if key == "api_key" || key == "region" {
                continue;
            }
            prop_assert_eq!(resolved.get(key), Some(&coerce(json!(expected))));
        }
        for (key, value) in &options {
            if key == "api_key" || key == "region" {
                continue;
            }
            prop_assert_eq!(resolved.get(key), Some(&coerce(json!(value))));
        }
    }

    /// A null option removes the key even when a default exists
    #[test]
    fn null_suppresses_defaults(globals in arb_options(), key in arb_key()) {
        let raw = RawOptions::new()
            .with("api_key", "k")
            .with("region", "r")
            .with_null(key.as_str());

        match factory(&globals).resolve(&raw, &schema()) {
            Ok(resolved) => prop_assert!(resolved.get(&key).is_none()),
            // Nulling a required key makes it missing
            Err(ServiceError::MissingRequiredOption { keys }) => {
                prop_assert!(keys.iter().any(|k| k.as_str() == key));
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Empty options resolve to exactly the (coerced) defaults
    #[test]
    fn empty_options_resolve_to_defaults(globals in arb_options()) {
        let mut globals = globals;
        globals.insert("api_key".to_string(), "k".to_string());
        globals.insert("region".to_string(), "r".to_string());

        let resolved = factory(&globals).resolve(&RawOptions::new(), &schema()).unwrap();
        let map = resolved.as_map().unwrap();
        prop_assert_eq!(map.len(), globals.len());
        for (key, value) in &globals {
            prop_assert_eq!(map.get(key.as_str()), Some(&coerce(json!(value))));
        }
    }

    /// Every i64 string coerces to the same integer
    #[test]
    fn integer_strings_coerce(n in any::<i64>()) {
        prop_assert_eq!(coerce(json!(n.to_string())), json!(n));
    }

    /// Strings that are neither literals nor integers are unchanged
    #[test]
    fn other_strings_unchanged(s in "[a-zA-Z ._][a-zA-Z0-9 ._-]{0,20}") {
        prop_assume!(s != "true" && s != "false");
        prop_assert_eq!(coerce(Value::String(s.clone())), Value::String(s));
    }
}
