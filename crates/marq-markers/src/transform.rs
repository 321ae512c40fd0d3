//! Rewrites marked YAML nodes into source-code field references.

use std::fmt;

use marq_yaml::{Document, NodeId};
use regex::Regex;
use tracing::debug;

use crate::inspect::{TypedMarker, YamlResult};
use crate::{FieldMarker, FieldType, ResourceMarker};

/// Names a user may not give a field marker; they collide with the
/// collection configuration itself.
const RESERVED_NAMES: [&str; 3] = ["collection", "collection.name", "collection.namespace"];

/// Parent paths a marker may reference instead of naming a field.
const SUPPORTED_PARENTS: [(&str, &str); 1] = [("metadata.name", "Name")];

/// Error applying a transform to discovered markers.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// A field marker specified neither a name nor a parent.
    MissingName,
    /// A field marker used a reserved name.
    ReservedName(String),
    /// A field marker referenced an unsupported parent path.
    UnsupportedParent(String),
    /// A replace substring failed to compile as a regex.
    Regex { pattern: String, message: String },
    /// A resource marker specified neither field nor collectionField.
    ResourceWithoutField,
    /// A resource marker named a field no field marker declares.
    UnassociatedResource(String),
    /// A resource marker's value disagrees with the paired field's type.
    ValueTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    /// A result referenced a node missing from the document.
    MissingNode(NodeId),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::MissingName => {
                f.write_str("field markers must specify a name or a parent")
            }
            TransformError::ReservedName(name) => {
                write!(f, "field name {name} is reserved")
            }
            TransformError::UnsupportedParent(parent) => {
                write!(f, "unsupported parent {parent}")
            }
            TransformError::Regex { pattern, message } => {
                write!(f, "invalid replace pattern {pattern:?}: {message}")
            }
            TransformError::ResourceWithoutField => {
                f.write_str("resource markers must specify field or collectionField")
            }
            TransformError::UnassociatedResource(name) => {
                write!(f, "resource marker references unknown field {name}")
            }
            TransformError::ValueTypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "resource value for {field} should be {expected}, got {found}"
            ),
            TransformError::MissingNode(id) => {
                write!(f, "no node with id {id:?} in document")
            }
        }
    }
}

impl std::error::Error for TransformError {}

/// Resolve the source-code variable a field marker refers to.
pub(crate) fn resolve_source_var(marker: &FieldMarker) -> Result<String, TransformError> {
    let prefix = marker.category.var_prefix();

    if let Some(parent) = &marker.parent {
        let mapped = SUPPORTED_PARENTS
            .iter()
            .find(|(path, _)| *path == parent.as_str())
            .map(|(_, field)| *field)
            .ok_or_else(|| TransformError::UnsupportedParent(parent.clone()))?;
        return Ok(format!("{prefix}.{mapped}"));
    }

    let Some(name) = &marker.name else {
        return Err(TransformError::MissingName);
    };
    Ok(format!("{prefix}.Spec.{}", title_case(name)))
}

/// Upper-camel each dot-separated segment of a field name.
fn title_case(name: &str) -> String {
    name.split('.')
        .map(upper_camel)
        .collect::<Vec<_>>()
        .join(".")
}

fn upper_camel(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Rewrite every marked scalar into a source-code field reference and
/// convert the marker comments into "controlled by" notes.
pub fn transform_field_markers(
    document: &mut Document,
    results: &mut Vec<YamlResult>,
) -> Result<(), TransformError> {
    for result in results.iter_mut() {
        let Ok(object) = &result.result.object else {
            continue;
        };
        let Some(mut marker) = FieldMarker::from_object(object) else {
            continue;
        };

        if marker.name.is_none() && marker.parent.is_none() {
            return Err(TransformError::MissingName);
        }
        if let Some(name) = &marker.name
            && RESERVED_NAMES.contains(&name.as_str())
        {
            return Err(TransformError::ReservedName(name.clone()));
        }

        let var = resolve_source_var(&marker)?;
        marker.source_var = Some(var.clone());
        debug!("field marker {} -> {var}", marker.display_name());

        let marker_text = result.result.marker_text.clone();
        // Keep replaced-in text commented when the marker spanned lines.
        let commented_text = marker_text.replace('\n', "\n#");
        let controlled = format!(
            "controlled by {}: {}",
            marker.category.controlled_by(),
            marker.display_name()
        );

        let Some(&key_id) = result.nodes.first() else {
            continue;
        };
        let Some(&value_id) = result.nodes.last() else {
            continue;
        };

        // Key node: append the description, convert marker text, clear foot.
        let key = document
            .node_mut(key_id)
            .ok_or(TransformError::MissingNode(key_id))?;
        if let Some(description) = &marker.description {
            let description = description.strip_prefix('\n').unwrap_or(description);
            key.head_comment.push('\n');
            key.head_comment.push_str("# ");
            key.head_comment.push_str(description);
        }
        let trimmed = key.head_comment.trim_start_matches('\n').to_string();
        key.head_comment = trimmed;
        rewrite_comments(key.comments_mut(), &marker_text, &commented_text, &controlled);
        key.foot_comment.clear();

        if value_id != key_id {
            let value = document
                .node_mut(value_id)
                .ok_or(TransformError::MissingNode(value_id))?;
            rewrite_comments(value.comments_mut(), &marker_text, &commented_text, &controlled);
            value.foot_comment.clear();
        }

        // Value node: record the original scalar, then rewrite it.
        let value = document
            .node_mut(value_id)
            .ok_or(TransformError::MissingNode(value_id))?;
        marker.original_value = Some(value.value.clone());

        if let Some(replace) = &marker.replace {
            let regex = Regex::new(replace).map_err(|error| TransformError::Regex {
                pattern: replace.clone(),
                message: error.to_string(),
            })?;
            let expression = match marker.ty {
                FieldType::String => var.clone(),
                FieldType::Int => format!("strconv.Itoa({var})"),
                FieldType::Bool => format!("strconv.FormatBool({var})"),
            };
            let replacement = format!("!!start {expression} !!end");
            value.value = regex
                .replace_all(&value.value, replacement.as_str())
                .into_owned();
            value.tag = "!!str".to_string();
        } else {
            value.value = var;
            value.tag = "!!var".to_string();
        }

        result.marker = Some(TypedMarker::Field(marker));
    }
    Ok(())
}

fn rewrite_comments(
    comments: [&mut String; 3],
    marker_text: &str,
    commented_text: &str,
    controlled: &str,
) {
    for comment in comments {
        if comment.contains(commented_text) {
            *comment = comment.replace(commented_text, controlled);
        } else if comment.contains(marker_text) {
            *comment = comment.replace(marker_text, controlled);
        }
    }
}

/// Pair resource markers with the field markers discovered by
/// [`transform_field_markers`] and attach their guards.
pub fn transform_resource_markers(
    _document: &mut Document,
    results: &mut Vec<YamlResult>,
) -> Result<(), TransformError> {
    let fields: Vec<FieldMarker> = results
        .iter()
        .filter_map(|result| match &result.marker {
            Some(TypedMarker::Field(field)) => Some(field.clone()),
            _ => None,
        })
        .collect();

    for result in results.iter_mut() {
        let Ok(object) = &result.result.object else {
            continue;
        };
        let Some(mut resource) = ResourceMarker::from_object(object) else {
            continue;
        };
        crate::resource::associate_one(&mut resource, &fields)?;
        result.marker = Some(TypedMarker::Resource(resource));
    }
    Ok(())
}
