//! Inflated marker objects.

use std::collections::{BTreeMap, BTreeSet};

use crate::ArgValue;

/// The inflated output of a successfully parsed marker: every declared
/// argument populated with its bound value, or its type's zero value when
/// optional and unset.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerObject {
    name: String,
    values: BTreeMap<String, ArgValue>,
    set: BTreeSet<String>,
}

impl MarkerObject {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: BTreeMap::new(),
            set: BTreeSet::new(),
        }
    }

    pub(crate) fn bind_set(&mut self, name: &str, value: ArgValue) {
        self.values.insert(name.to_string(), value);
        self.set.insert(name.to_string());
    }

    pub(crate) fn bind_zero(&mut self, name: &str, value: ArgValue) {
        self.values.insert(name.to_string(), value);
    }

    /// The scope-path prefix this object was inflated for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of an argument, zero-initialized if optional and unset.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Whether the argument was explicitly bound in the marker text.
    pub fn is_set(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    /// The value of an argument, only if it was explicitly bound.
    pub fn set_arg(&self, name: &str) -> Option<&ArgValue> {
        if self.is_set(name) {
            self.values.get(name)
        } else {
            None
        }
    }

    pub fn string_arg(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(ArgValue::as_str)
    }

    pub fn bool_arg(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(ArgValue::as_bool)
    }

    pub fn int_arg(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(ArgValue::as_int)
    }
}
