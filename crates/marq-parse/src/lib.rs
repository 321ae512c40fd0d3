//! Registry-driven parsing of marq markers.

pub use marq_tokenizer::{Position, Token, TokenKind};

mod value;
pub use value::{ArgType, ArgValue, CustomType, MarkerArg};

mod definition;
pub use definition::{Argument, Definition};

mod object;
pub use object::MarkerObject;

mod registry;
pub use registry::Registry;

mod error;
pub use error::{MarkerError, MarkerErrorKind, UNKNOWN_MARKER};

mod diagnostic;

mod parser;
pub use parser::{MarkerResult, Parser};

mod inspect;
pub use inspect::Inspector;
