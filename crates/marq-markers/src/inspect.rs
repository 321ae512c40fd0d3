//! YAML traversal feeding node comments to the marker inspector.

use std::fmt;

use marq_parse::{Inspector, MarkerError, MarkerResult, Registry};
use marq_yaml::{Document, Node, NodeId, NodeKind, ScanError};

use crate::{FieldMarker, ResourceMarker, TransformError};

/// A typed view of a result's marker, attached by the transforms.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedMarker {
    Field(FieldMarker),
    Resource(ResourceMarker),
}

/// A parser result plus the YAML nodes its marker was attached to.
#[derive(Debug, Clone)]
pub struct YamlResult {
    pub result: MarkerResult,
    /// Key and value node ids for mapping entries, a single id otherwise.
    pub nodes: Vec<NodeId>,
    /// Populated by the transforms.
    pub marker: Option<TypedMarker>,
}

/// A walked document and everything found in it.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub document: Document,
    pub results: Vec<YamlResult>,
}

/// A post-parse rewrite over the document and its results.
pub type Transform = fn(&mut Document, &mut Vec<YamlResult>) -> Result<(), TransformError>;

/// Error from YAML inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectError {
    /// The bytes did not parse as a YAML document.
    Scan(ScanError),
    /// A marker in a comment failed to lex, bind, or inflate.
    Marker(MarkerError),
    /// A transform rejected the discovered markers.
    Transform(TransformError),
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectError::Scan(error) => write!(f, "yaml: {error}"),
            InspectError::Marker(error) => write!(f, "{error}"),
            InspectError::Transform(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for InspectError {}

impl From<ScanError> for InspectError {
    fn from(error: ScanError) -> Self {
        InspectError::Scan(error)
    }
}

impl From<TransformError> for InspectError {
    fn from(error: TransformError) -> Self {
        InspectError::Transform(error)
    }
}

/// Walk a YAML document and collect every marker attached to its nodes.
pub fn inspect_yaml(source: &str, registry: &Registry) -> Result<Inspection, InspectError> {
    inspect_yaml_with(source, registry, &[])
}

/// Walk a YAML document, then apply each transform in order.
///
/// Any error-bearing marker result short-circuits before the first transform
/// runs; a transform error aborts the inspection.
pub fn inspect_yaml_with(
    source: &str,
    registry: &Registry,
    transforms: &[Transform],
) -> Result<Inspection, InspectError> {
    let mut document = Document::parse(source)?;
    let inspector = Inspector::new(registry);
    let mut results = Vec::new();
    walk(&document.root, &inspector, &mut results);

    for result in &results {
        if let Err(error) = &result.result.object {
            return Err(InspectError::Marker(error.clone()));
        }
    }

    for transform in transforms {
        transform(&mut document, &mut results)?;
    }

    Ok(Inspection { document, results })
}

/// Depth-first traversal: mapping pairs are inspected together, composite
/// values are recursed into, and sequence scalars stand alone.
fn walk(node: &Node, inspector: &Inspector<'_>, results: &mut Vec<YamlResult>) {
    match node.kind {
        NodeKind::Mapping => {
            for (key, value) in node.mapping_pairs() {
                inspect_nodes(&[key, value], inspector, results);
                if !value.is_scalar() {
                    walk(value, inspector, results);
                }
            }
        }
        NodeKind::Sequence => {
            for item in &node.children {
                if item.is_scalar() {
                    inspect_nodes(&[item], inspector, results);
                } else {
                    walk(item, inspector, results);
                }
            }
        }
        NodeKind::Scalar => inspect_nodes(&[node], inspector, results),
    }
}

/// Feed the nodes' comments, joined by newlines, to a fresh parser.
fn inspect_nodes(nodes: &[&Node], inspector: &Inspector<'_>, results: &mut Vec<YamlResult>) {
    let mut comments = Vec::new();
    for node in nodes {
        for comment in [&node.head_comment, &node.line_comment, &node.foot_comment] {
            if !comment.is_empty() {
                comments.push(comment.as_str());
            }
        }
    }
    if comments.is_empty() {
        return;
    }

    let source = comments.join("\n");
    let ids: Vec<NodeId> = nodes.iter().map(|node| node.id).collect();
    for result in inspector.inspect(&source) {
        results.push(YamlResult {
            result,
            nodes: ids.clone(),
            marker: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known_registry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_result_count_matches_marker_count() {
        let registry = well_known_registry();
        let source = "\
# +marq:field:name=one,type=string
a: 1
b: 2  # +marq:field:name=two,type=int
c:
  - x  # +marq:field:name=three,type=string
";
        let inspection = inspect_yaml(source, &registry).unwrap();
        assert_eq!(inspection.results.len(), 3);
    }

    #[test]
    fn test_results_carry_the_originating_nodes() {
        let registry = well_known_registry();
        let source = "b: 2  # +marq:field:name=two,type=int\n";
        let inspection = inspect_yaml(source, &registry).unwrap();

        let result = &inspection.results[0];
        assert_eq!(result.nodes.len(), 2);
        let value = inspection.document.node(result.nodes[1]).unwrap();
        assert_eq!(value.value, "2");
        assert!(value.line_comment.contains("+marq:field"));
    }

    #[test]
    fn test_marker_errors_short_circuit() {
        let registry = well_known_registry();
        // The field marker is missing its required type argument.
        let source = "a: 1  # +marq:field:name=broken\n";
        let error = inspect_yaml(source, &registry).unwrap_err();
        assert!(matches!(error, InspectError::Marker(_)));
    }

    #[test]
    fn test_unknown_markers_are_ignored() {
        let registry = well_known_registry();
        let source = "a: 1  # +kubebuilder:validation:Required\n";
        let inspection = inspect_yaml(source, &registry).unwrap();
        assert!(inspection.results.is_empty());
    }

    #[test]
    fn test_markers_found_in_head_and_foot_comments() {
        let registry = well_known_registry();
        let source = "\
# +marq:field:name=fromHead,type=string
a: 1
# +marq:field:name=fromFoot,type=string
";
        let inspection = inspect_yaml(source, &registry).unwrap();
        let names: Vec<&str> = inspection
            .results
            .iter()
            .map(|r| {
                r.result
                    .object
                    .as_ref()
                    .unwrap()
                    .string_arg("name")
                    .unwrap()
            })
            .collect();
        assert_eq!(names, vec!["fromHead", "fromFoot"]);
    }
}
