//! Argument values and declared argument types.
//!
//! The source-of-truth for a marker's arguments is an explicit schema
//! description rather than runtime reflection: every argument declares an
//! [`ArgType`] up front, and binding checks the lexed literal against it.

use std::fmt;

/// A literal value bound to a marker argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ArgValue {
    /// The name of this value's runtime type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::String(_) => "string",
        }
    }

    /// The value's string form, as a custom unmarshaller sees it.
    pub fn as_text(&self) -> String {
        match self {
            ArgValue::Bool(value) => value.to_string(),
            ArgValue::Int(value) => value.to_string(),
            ArgValue::Float(value) => value.to_string(),
            ArgValue::String(value) => value.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(value) => write!(f, "{value}"),
            ArgValue::Int(value) => write!(f, "{value}"),
            ArgValue::Float(value) => write!(f, "{value}"),
            ArgValue::String(value) => f.write_str(value),
        }
    }
}

/// A user type that can be bound from a marker argument literal.
pub trait MarkerArg: Sized {
    /// The type name reported in binding errors.
    const TYPE_NAME: &'static str;

    /// Parse the literal's string form, or explain why it is invalid.
    fn unmarshal(value: &str) -> Result<Self, String>;
}

/// The declared type of a marker argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Bool,
    Int,
    Float,
    String,
    /// Accepts any literal unchanged. The rendition of the original's
    /// untyped `default`/`value` arguments.
    Any,
    /// A user type bound through its [`MarkerArg`] implementation.
    Custom(CustomType),
}

/// The validation hook for a custom-typed argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomType {
    /// The type name reported in binding errors.
    pub name: &'static str,
    /// Validates a literal's string form.
    pub unmarshal: fn(&str) -> Result<(), String>,
}

fn validate<T: MarkerArg>(value: &str) -> Result<(), String> {
    T::unmarshal(value).map(|_| ())
}

impl ArgType {
    /// The declared type for a user type implementing [`MarkerArg`].
    pub fn custom<T: MarkerArg>() -> Self {
        ArgType::Custom(CustomType {
            name: T::TYPE_NAME,
            unmarshal: validate::<T>,
        })
    }

    /// The name of this type, for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ArgType::Bool => "bool",
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::String => "string",
            ArgType::Any => "any",
            ArgType::Custom(custom) => custom.name,
        }
    }

    /// The zero value an optional, unset argument inflates to.
    pub fn zero(&self) -> ArgValue {
        match self {
            ArgType::Bool => ArgValue::Bool(false),
            ArgType::Int => ArgValue::Int(0),
            ArgType::Float => ArgValue::Float(0.0),
            ArgType::String | ArgType::Any | ArgType::Custom(_) => {
                ArgValue::String(String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fahrenheit(f64);

    impl MarkerArg for Fahrenheit {
        const TYPE_NAME: &'static str = "Fahrenheit";

        fn unmarshal(value: &str) -> Result<Self, String> {
            value
                .strip_suffix('F')
                .and_then(|degrees| degrees.parse().ok())
                .map(Fahrenheit)
                .ok_or_else(|| format!("{value} is not a temperature"))
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ArgValue::Bool(true).type_name(), "bool");
        assert_eq!(ArgValue::String("x".into()).type_name(), "string");
        assert_eq!(ArgType::custom::<Fahrenheit>().name(), "Fahrenheit");
    }

    #[test]
    fn test_custom_validation() {
        let ArgType::Custom(custom) = ArgType::custom::<Fahrenheit>() else {
            panic!("expected a custom type");
        };
        assert!((custom.unmarshal)("451F").is_ok());
        assert!((custom.unmarshal)("cold").is_err());
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(ArgValue::Bool(false).as_text(), "false");
        assert_eq!(ArgValue::Int(-3).as_text(), "-3");
        assert_eq!(ArgValue::String("earth".into()).as_text(), "earth");
    }
}
