//! The well-known marker definitions.

use marq_parse::{ArgType, Definition, Registry};

use crate::FieldType;

/// Scope-path prefix of the per-component field marker.
pub const FIELD_MARKER: &str = "+marq:field";

/// Scope-path prefix of the collection field marker.
pub const COLLECTION_FIELD_MARKER: &str = "+marq:collection:field";

/// Scope-path prefix of the resource marker.
pub const RESOURCE_MARKER: &str = "+marq:resource";

fn field_definition(name: &str) -> Definition {
    Definition::new(name)
        .optional_arg("name", ArgType::String)
        .arg("type", ArgType::custom::<FieldType>())
        .optional_arg("description", ArgType::String)
        // Defaults take the declared field's type, so the schema accepts any
        // literal and agreement is checked downstream.
        .optional_arg("default", ArgType::Any)
        .optional_arg("replace", ArgType::String)
        .optional_arg("parent", ArgType::String)
        .optional_arg("arbitrary", ArgType::Bool)
}

/// A registry holding the three well-known marker schemas.
pub fn well_known_registry() -> Registry {
    let mut registry = Registry::new();
    registry.add(field_definition(FIELD_MARKER));
    registry.add(field_definition(COLLECTION_FIELD_MARKER));
    registry.add(
        Definition::new(RESOURCE_MARKER)
            .optional_arg("field", ArgType::String)
            .optional_arg("collectionField", ArgType::String)
            .arg("value", ArgType::Any)
            .optional_arg("include", ArgType::Bool),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_prefixes_are_registered() {
        let registry = well_known_registry();
        assert!(registry.lookup(FIELD_MARKER));
        assert!(registry.lookup(COLLECTION_FIELD_MARKER));
        assert!(registry.lookup(RESOURCE_MARKER));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_field_marker_arguments() {
        let registry = well_known_registry();
        let definition = registry.get_definition(FIELD_MARKER).unwrap();
        for argument in ["name", "type", "description", "default", "replace", "parent", "arbitrary"] {
            assert!(definition.lookup_argument(argument), "missing {argument}");
        }
        assert!(!definition.argument("type").unwrap().is_optional());
        assert!(definition.argument("default").unwrap().is_optional());
    }
}
