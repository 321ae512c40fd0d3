//! Field and collection-field markers.

use std::fmt;

use marq_parse::{ArgValue, MarkerArg, MarkerObject};

use crate::{COLLECTION_FIELD_MARKER, FIELD_MARKER};

/// The declared type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    String,
    Int,
}

impl MarkerArg for FieldType {
    const TYPE_NAME: &'static str = "FieldType";

    fn unmarshal(value: &str) -> Result<Self, String> {
        match value {
            "bool" => Ok(FieldType::Bool),
            "string" => Ok(FieldType::String),
            "int" => Ok(FieldType::Int),
            other => Err(format!("unknown field type {other}")),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Int => "int",
        })
    }
}

impl FieldType {
    /// Whether a bound literal agrees with this declared type.
    pub fn agrees_with(&self, value: &ArgValue) -> bool {
        match self {
            FieldType::Bool => value.as_bool().is_some(),
            FieldType::String => value.as_str().is_some(),
            FieldType::Int => value.as_int().is_some(),
        }
    }
}

/// Which configuration object a field marker draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    /// A per-component field, read from the `parent` object.
    Field,
    /// A collection-wide field, read from the `collection` object.
    Collection,
}

impl FieldCategory {
    /// The source-code variable the field hangs off.
    pub fn var_prefix(self) -> &'static str {
        match self {
            FieldCategory::Field => "parent",
            FieldCategory::Collection => "collection",
        }
    }

    /// The phrasing used in rewritten comments.
    pub fn controlled_by(self) -> &'static str {
        match self {
            FieldCategory::Field => "field",
            FieldCategory::Collection => "collection field",
        }
    }
}

/// A field or collection-field marker, extracted from its inflated object.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMarker {
    pub category: FieldCategory,
    pub name: Option<String>,
    pub ty: FieldType,
    pub description: Option<String>,
    pub default: Option<ArgValue>,
    pub replace: Option<String>,
    pub parent: Option<String>,
    /// Declared by the schema; not consumed by the core transform.
    pub arbitrary: Option<bool>,
    /// The scalar value the marked node held before rewriting.
    pub original_value: Option<String>,
    /// The source-code variable the marker resolves to, attached during
    /// transform.
    pub source_var: Option<String>,
}

impl FieldMarker {
    /// Extract a typed marker if the object is a field or collection-field
    /// marker.
    pub fn from_object(object: &MarkerObject) -> Option<Self> {
        let category = match object.name() {
            FIELD_MARKER => FieldCategory::Field,
            COLLECTION_FIELD_MARKER => FieldCategory::Collection,
            _ => return None,
        };
        let ty = FieldType::unmarshal(object.string_arg("type")?).ok()?;

        let string_of = |name: &str| {
            object
                .set_arg(name)
                .and_then(ArgValue::as_str)
                .map(str::to_string)
        };

        Some(Self {
            category,
            name: string_of("name"),
            ty,
            description: string_of("description"),
            default: object.set_arg("default").cloned(),
            replace: string_of("replace"),
            parent: string_of("parent"),
            arbitrary: object.set_arg("arbitrary").and_then(ArgValue::as_bool),
            original_value: None,
            source_var: None,
        })
    }

    /// The name shown in "controlled by" comments: the field name, or the
    /// parent path for parent-only markers.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.parent.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marq_parse::Inspector;
    use pretty_assertions::assert_eq;

    fn parse_one(source: &str) -> MarkerObject {
        let registry = crate::well_known_registry();
        let results = Inspector::new(&registry).inspect(source);
        assert_eq!(results.len(), 1, "expected one marker in {source:?}");
        results.into_iter().next().unwrap().object.unwrap()
    }

    #[test]
    fn test_field_type_unmarshal() {
        assert_eq!(FieldType::unmarshal("string"), Ok(FieldType::String));
        assert_eq!(FieldType::unmarshal("int"), Ok(FieldType::Int));
        assert_eq!(FieldType::unmarshal("bool"), Ok(FieldType::Bool));
        assert!(FieldType::unmarshal("struct").is_err());
    }

    #[test]
    fn test_extract_field_marker() {
        let object = parse_one(
            "+marq:field:name=myField,type=string,description='the field',default=\"x\"",
        );
        let marker = FieldMarker::from_object(&object).unwrap();
        assert_eq!(marker.category, FieldCategory::Field);
        assert_eq!(marker.name.as_deref(), Some("myField"));
        assert_eq!(marker.ty, FieldType::String);
        assert_eq!(marker.description.as_deref(), Some("the field"));
        assert_eq!(marker.default, Some(ArgValue::String("x".into())));
        assert_eq!(marker.replace, None);
        assert_eq!(marker.arbitrary, None);
    }

    #[test]
    fn test_extract_collection_marker() {
        let object = parse_one("+marq:collection:field:name=size,type=int");
        let marker = FieldMarker::from_object(&object).unwrap();
        assert_eq!(marker.category, FieldCategory::Collection);
        assert_eq!(marker.ty, FieldType::Int);
    }

    #[test]
    fn test_bad_field_type_is_an_error_result() {
        let registry = crate::well_known_registry();
        let results =
            Inspector::new(&registry).inspect("+marq:field:name=x,type=struct");
        assert_eq!(results.len(), 1);
        assert!(results[0].object.is_err());
    }

    #[test]
    fn test_agreement() {
        assert!(FieldType::Bool.agrees_with(&ArgValue::Bool(true)));
        assert!(!FieldType::Bool.agrees_with(&ArgValue::String("yes".into())));
        assert!(FieldType::Int.agrees_with(&ArgValue::Int(3)));
    }
}
