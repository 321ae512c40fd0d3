//! Marker schemas and argument binding.

use std::collections::BTreeMap;

use crate::{ArgType, ArgValue, MarkerErrorKind, MarkerObject};

/// One declared argument of a marker schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    name: String,
    ty: ArgType,
    optional: bool,
    value: Option<ArgValue>,
    set: bool,
}

impl Argument {
    /// Declare a required argument of the given type.
    pub fn new(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            value: None,
            set: false,
        }
    }

    /// Mark this argument optional. Option-typed fields of the output shape
    /// are always declared this way.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ArgType {
        self.ty
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn value(&self) -> Option<&ArgValue> {
        self.value.as_ref()
    }

    /// Bind a lexed literal to this argument, checking it against the
    /// declared type.
    fn bind(&mut self, value: ArgValue) -> Result<(), MarkerErrorKind> {
        let bound = match self.ty {
            // A custom type binds from the literal's string form; its
            // unmarshal hook decides validity.
            ArgType::Custom(custom) => {
                let text = value.as_text();
                if let Err(message) = (custom.unmarshal)(&text) {
                    return Err(MarkerErrorKind::Unmarshal {
                        argument: self.name.clone(),
                        value: text,
                        message,
                    });
                }
                ArgValue::String(text)
            }
            ArgType::Any => value,
            ArgType::Bool if value.as_bool().is_some() => value,
            ArgType::Int if value.as_int().is_some() => value,
            ArgType::String if value.as_str().is_some() => value,
            ArgType::Float => match value {
                ArgValue::Float(_) => value,
                // Integer literals widen to a declared float.
                ArgValue::Int(int) => ArgValue::Float(int as f64),
                other => {
                    return Err(self.mismatch(&other));
                }
            },
            _ => {
                return Err(self.mismatch(&value));
            }
        };
        self.value = Some(bound);
        self.set = true;
        Ok(())
    }

    fn mismatch(&self, value: &ArgValue) -> MarkerErrorKind {
        MarkerErrorKind::TypeMismatch {
            argument: self.name.clone(),
            expected: self.ty.name().to_string(),
            found: value.type_name().to_string(),
        }
    }
}

/// A named marker schema: the scope-path prefix that selects it and the
/// arguments it accepts.
///
/// Definitions are templates. The registry stores one per prefix and lends
/// out deep copies, so the binding state accumulated while parsing one
/// marker never contaminates another parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    name: String,
    fields: BTreeMap<String, Argument>,
}

impl Definition {
    /// Create a schema for the given scope-path prefix.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Declare a required argument.
    pub fn arg(mut self, name: &str, ty: ArgType) -> Self {
        self.fields.insert(name.to_string(), Argument::new(name, ty));
        self
    }

    /// Declare an optional argument.
    pub fn optional_arg(mut self, name: &str, ty: ArgType) -> Self {
        self.fields
            .insert(name.to_string(), Argument::new(name, ty).optional());
        self
    }

    /// The scope-path prefix this schema is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the schema declares an argument with this name.
    pub fn lookup_argument(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The declared argument with this name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.fields.get(name)
    }

    /// Bind a literal to the named argument.
    pub fn bind(&mut self, name: &str, value: ArgValue) -> Result<(), MarkerErrorKind> {
        let Some(argument) = self.fields.get_mut(name) else {
            return Err(MarkerErrorKind::UnknownArgument(name.to_string()));
        };
        argument.bind(value)
    }

    /// Inflate the schema into its output object.
    ///
    /// Every required, unset argument is reported; optional unset arguments
    /// inflate to their type's zero value without being marked set.
    pub fn inflate(&self) -> Result<MarkerObject, MarkerErrorKind> {
        let mut missing = Vec::new();
        let mut object = MarkerObject::new(&self.name);

        for (name, argument) in &self.fields {
            if argument.set {
                let value = argument
                    .value
                    .clone()
                    .unwrap_or_else(|| argument.ty.zero());
                object.bind_set(name, value);
            } else if argument.optional {
                object.bind_zero(name, argument.ty.zero());
            } else {
                missing.push(name.clone());
            }
        }

        if !missing.is_empty() {
            return Err(MarkerErrorKind::MissingArguments(missing));
        }
        Ok(object)
    }
}
