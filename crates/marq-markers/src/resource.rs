//! Resource markers: guards over already-discovered field markers.

use marq_parse::{ArgValue, MarkerObject};

use crate::transform::resolve_source_var;
use crate::{FieldCategory, FieldMarker, RESOURCE_MARKER, TransformError};

/// A resource marker: pairs with a field (or collection field) marker by
/// name and gates resource creation on that field's value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMarker {
    pub field: Option<String>,
    pub collection_field: Option<String>,
    pub value: ArgValue,
    pub include: bool,
    /// The generated guard snippet, attached during association.
    pub guard: Option<String>,
}

impl ResourceMarker {
    /// Extract a typed marker if the object is a resource marker.
    pub fn from_object(object: &MarkerObject) -> Option<Self> {
        if object.name() != RESOURCE_MARKER {
            return None;
        }
        Some(Self {
            field: object
                .set_arg("field")
                .and_then(ArgValue::as_str)
                .map(str::to_string),
            collection_field: object
                .set_arg("collectionField")
                .and_then(ArgValue::as_str)
                .map(str::to_string),
            value: object.get("value").cloned()?,
            // An absent include argument means the resource is included
            // when the field matches.
            include: object
                .set_arg("include")
                .and_then(ArgValue::as_bool)
                .unwrap_or(true),
            guard: None,
        })
    }

    /// The field marker this resource marker pairs with.
    pub fn target(&self) -> Option<(&str, FieldCategory)> {
        if let Some(name) = self.field.as_deref() {
            return Some((name, FieldCategory::Field));
        }
        self.collection_field
            .as_deref()
            .map(|name| (name, FieldCategory::Collection))
    }
}

/// Pair each resource marker with a discovered field marker, verify type
/// agreement, and attach the generated guard snippet.
pub fn associate_resource_markers(
    resources: &mut [ResourceMarker],
    fields: &[FieldMarker],
) -> Result<(), TransformError> {
    for resource in resources {
        associate_one(resource, fields)?;
    }
    Ok(())
}

pub(crate) fn associate_one(
    resource: &mut ResourceMarker,
    fields: &[FieldMarker],
) -> Result<(), TransformError> {
    let Some((name, category)) = resource.target() else {
        return Err(TransformError::ResourceWithoutField);
    };

    let paired = fields
        .iter()
        .find(|field| field.category == category && field.name.as_deref() == Some(name))
        .ok_or_else(|| TransformError::UnassociatedResource(name.to_string()))?;

    if !paired.ty.agrees_with(&resource.value) {
        return Err(TransformError::ValueTypeMismatch {
            field: name.to_string(),
            expected: paired.ty.to_string(),
            found: resource.value.type_name().to_string(),
        });
    }

    let var = match &paired.source_var {
        Some(var) => var.clone(),
        None => resolve_source_var(paired)?,
    };
    let literal = go_literal(&resource.value);
    let operator = if resource.include { "!=" } else { "==" };
    resource.guard = Some(format!(
        "if {var} {operator} {literal} {{\n\treturn []client.Object{{}}, nil\n}}"
    ));
    Ok(())
}

/// Render a bound value as a Go literal.
fn go_literal(value: &ArgValue) -> String {
    match value {
        ArgValue::String(text) => format!("{text:?}"),
        other => other.as_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldType;
    use pretty_assertions::assert_eq;

    fn provision_field() -> FieldMarker {
        FieldMarker {
            category: FieldCategory::Field,
            name: Some("provision".to_string()),
            ty: FieldType::Bool,
            description: None,
            default: None,
            replace: None,
            parent: None,
            arbitrary: None,
            original_value: None,
            source_var: Some("parent.Spec.Provision".to_string()),
        }
    }

    fn resource(value: ArgValue, include: bool) -> ResourceMarker {
        ResourceMarker {
            field: Some("provision".to_string()),
            collection_field: None,
            value,
            include,
            guard: None,
        }
    }

    #[test]
    fn test_include_guard() {
        let mut marker = resource(ArgValue::Bool(true), true);
        associate_one(&mut marker, &[provision_field()]).unwrap();
        assert_eq!(
            marker.guard.as_deref(),
            Some("if parent.Spec.Provision != true {\n\treturn []client.Object{}, nil\n}")
        );
    }

    #[test]
    fn test_exclude_guard_negates() {
        let mut marker = resource(ArgValue::Bool(false), false);
        associate_one(&mut marker, &[provision_field()]).unwrap();
        assert_eq!(
            marker.guard.as_deref(),
            Some("if parent.Spec.Provision == false {\n\treturn []client.Object{}, nil\n}")
        );
    }

    #[test]
    fn test_string_values_are_quoted() {
        let mut field = provision_field();
        field.ty = FieldType::String;
        let mut marker = resource(ArgValue::String("production".to_string()), true);
        associate_one(&mut marker, &[field]).unwrap();
        assert_eq!(
            marker.guard.as_deref(),
            Some(
                "if parent.Spec.Provision != \"production\" {\n\treturn []client.Object{}, nil\n}"
            )
        );
    }

    #[test]
    fn test_unpaired_resource_is_an_error() {
        let mut marker = resource(ArgValue::Bool(true), true);
        let error = associate_one(&mut marker, &[]).unwrap_err();
        assert!(matches!(error, TransformError::UnassociatedResource(name) if name == "provision"));
    }

    #[test]
    fn test_type_disagreement_is_an_error() {
        let mut marker = resource(ArgValue::String("yes".to_string()), true);
        let error = associate_one(&mut marker, &[provision_field()]).unwrap_err();
        assert!(matches!(error, TransformError::ValueTypeMismatch { .. }));
    }
}
