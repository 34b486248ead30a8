//! Option schemas
//!
//! Every service type declares which options it requires and which it merely
//! recognizes. The schema is built once per service type and never changes.

use super::options::{OptionKey, OptionMap};
use std::collections::BTreeSet;

/// Required and recognized option keys of a service type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSchema {
    required: BTreeSet<OptionKey>,
    recognized: BTreeSet<OptionKey>,
    secrets: BTreeSet<OptionKey>,
}

impl OptionSchema {
    pub fn builder() -> OptionSchemaBuilder {
        OptionSchemaBuilder::default()
    }

    pub fn required(&self) -> &BTreeSet<OptionKey> {
        &self.required
    }

    pub fn recognized(&self) -> &BTreeSet<OptionKey> {
        &self.recognized
    }

    pub fn secrets(&self) -> &BTreeSet<OptionKey> {
        &self.secrets
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.contains(key)
    }

    /// Required or recognized
    pub fn is_declared(&self, key: &str) -> bool {
        self.required.contains(key) || self.recognized.contains(key)
    }

    pub fn is_secret(&self, key: &str) -> bool {
        self.secrets.contains(key)
    }

    /// Keys of `options` the schema does not declare, sorted
    pub fn unrecognized<'a>(&self, options: &'a OptionMap) -> Vec<&'a OptionKey> {
        options
            .keys()
            .filter(|key| !self.is_declared(key.as_str()))
            .collect()
    }

    /// Required keys absent from `options`, sorted
    pub fn missing(&self, options: &OptionMap) -> Vec<OptionKey> {
        self.required
            .iter()
            .filter(|key| options.get(key.as_str()).map_or(true, |v| v.is_null()))
            .cloned()
            .collect()
    }
}

/// Builder for [`OptionSchema`]
#[derive(Debug, Default)]
pub struct OptionSchemaBuilder {
    schema: OptionSchema,
}

impl OptionSchemaBuilder {
    /// Declare a required option
    pub fn requires(mut self, key: impl Into<OptionKey>) -> Self {
        self.schema.required.insert(key.into());
        self
    }

    /// Declare an optional option
    pub fn recognizes(mut self, key: impl Into<OptionKey>) -> Self {
        self.schema.recognized.insert(key.into());
        self
    }

    /// Mark an option as secret; secret values are masked when displayed
    pub fn secret(mut self, key: impl Into<OptionKey>) -> Self {
        self.schema.secrets.insert(key.into());
        self
    }

    pub fn requires_all<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<OptionKey>,
    {
        keys.into_iter().fold(self, |builder, key| builder.requires(key))
    }

    pub fn recognizes_all<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<OptionKey>,
    {
        keys.into_iter().fold(self, |builder, key| builder.recognizes(key))
    }

    pub fn secret_all<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<OptionKey>,
    {
        keys.into_iter().fold(self, |builder, key| builder.secret(key))
    }

    pub fn build(self) -> OptionSchema {
        let undeclared: Vec<_> = self
            .schema
            .secrets
            .iter()
            .filter(|key| !self.schema.is_declared(key.as_str()))
            .collect();
        if !undeclared.is_empty() {
            tracing::warn!("Secret options not declared by schema: {:?}", undeclared);
        }
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> OptionSchema {
        OptionSchema::builder()
            .requires("generic_api_key")
            .recognizes("generic_user")
            .recognizes(":connection_options")
            .build()
    }

    #[test]
    fn test_declared_keys() {
        let schema = schema();
        assert!(schema.is_required("generic_api_key"));
        assert!(!schema.is_required("generic_user"));
        assert!(schema.is_declared("generic_user"));
        assert!(schema.is_declared("connection_options"));
        assert!(!schema.is_declared("bad_option"));
    }

    #[test]
    fn test_unrecognized_is_sorted() {
        let mut options = OptionMap::new();
        options.insert("zz".into(), json!(1));
        options.insert("generic_api_key".into(), json!("abc"));
        options.insert("aa".into(), json!(2));

        let unrecognized: Vec<&str> = schema()
            .unrecognized(&options)
            .into_iter()
            .map(OptionKey::as_str)
            .collect();
        assert_eq!(unrecognized, vec!["aa", "zz"]);
    }

    #[test]
    fn test_missing_treats_null_as_absent() {
        let mut options = OptionMap::new();
        assert_eq!(schema().missing(&options), vec![OptionKey::from("generic_api_key")]);

        options.insert("generic_api_key".into(), json!(null));
        assert_eq!(schema().missing(&options).len(), 1);

        options.insert("generic_api_key".into(), json!("abc"));
        assert!(schema().missing(&options).is_empty());
    }

    #[test]
    fn test_bulk_declarations() {
        let schema = OptionSchema::builder()
            .requires_all(["a", "b"])
            .recognizes_all(vec!["c".to_string()])
            .secret_all(["b"])
            .build();
        assert_eq!(schema.required().len(), 2);
        assert!(schema.is_declared("c"));
        assert!(schema.is_secret("b"));
    }
}
