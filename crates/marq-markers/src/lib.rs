//! Well-known marq markers and the YAML transform engine.
//!
//! The generic lexer/parser machinery lives in `marq-parse`; this crate
//! registers the marker schemas the scaffolding tooling understands, walks
//! YAML documents feeding node comments to the inspector, and rewrites
//! marked scalars into source-code field references.

mod registry;
pub use registry::{
    COLLECTION_FIELD_MARKER, FIELD_MARKER, RESOURCE_MARKER, well_known_registry,
};

mod field;
pub use field::{FieldCategory, FieldMarker, FieldType};

mod resource;
pub use resource::{ResourceMarker, associate_resource_markers};

mod inspect;
pub use inspect::{
    InspectError, Inspection, Transform, TypedMarker, YamlResult, inspect_yaml,
    inspect_yaml_with,
};

mod transform;
pub use transform::{TransformError, transform_field_markers, transform_resource_markers};
