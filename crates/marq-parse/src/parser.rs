//! State-function parser for marker token streams.
//!
//! The parser mirrors the lexer's shape: a machine of state functions, each
//! consuming tokens and naming its successor, with results queuing up for
//! [`Parser::next_result`]. The parser owns its lexer and pulls tokens on
//! demand, so neither side runs ahead of the other.

use std::collections::VecDeque;

use marq_tokenizer::{Lexer, Position, Token, TokenKind};
use tracing::{trace, warn};

use crate::{
    ArgValue, Definition, MarkerError, MarkerErrorKind, MarkerObject, Registry, UNKNOWN_MARKER,
};

/// A parsed marker, or the error that spoiled it, plus the marker's verbatim
/// source text.
///
/// The text is reconstructed from the consumed tokens and is what downstream
/// transforms use to locate the marker in the original input.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerResult {
    /// The inflated object, or the in-band error.
    pub object: Result<MarkerObject, MarkerError>,
    /// The marker as it appeared in the input.
    pub marker_text: String,
}

/// A parser state: consumes tokens and names its successor.
#[derive(Clone, Copy)]
struct StateFn(fn(&mut Parser<'_>) -> Option<StateFn>);

/// A parser that assembles markers from an input string, resolving scope
/// paths against a registry. Single-use: one parser per input.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    registry: &'src Registry,
    /// Verbatim text of the marker being assembled (the scope buffer).
    buffer: String,
    current: Option<Token>,
    /// Look-ahead tokens, at most three deep.
    peeked: VecDeque<Token>,
    /// The schema copy being bound, once the scope path resolves.
    definition: Option<Definition>,
    /// The argument awaiting a value.
    argument: Option<String>,
    results: VecDeque<MarkerResult>,
    state: Option<StateFn>,
}

impl<'src> Parser<'src> {
    /// Create a parser over the given input and registry.
    pub fn new(source: &'src str, registry: &'src Registry) -> Self {
        Self {
            lexer: Lexer::new(source),
            registry,
            buffer: String::new(),
            current: None,
            peeked: VecDeque::new(),
            definition: None,
            argument: None,
            results: VecDeque::new(),
            state: Some(StateFn(start_parse)),
        }
    }

    /// Get the next result, advancing the machine as far as needed.
    /// Returns `None` once the input is exhausted.
    pub fn next_result(&mut self) -> Option<MarkerResult> {
        loop {
            if let Some(result) = self.results.pop_front() {
                return Some(result);
            }
            let StateFn(state) = self.state.take()?;
            self.state = state(self);
        }
    }

    /// Drive the machine to completion and collect every result.
    pub fn run(mut self) -> Vec<MarkerResult> {
        let mut results = Vec::new();
        while let Some(result) = self.next_result() {
            results.push(result);
        }
        results
    }

    fn fill_peek(&mut self) {
        if self.peeked.is_empty()
            && let Some(token) = self.lexer.next_token()
        {
            self.peeked.push_back(token);
        }
    }

    /// Look at the next token without consuming it.
    fn peek(&mut self) -> Option<&Token> {
        self.fill_peek();
        self.peeked.front()
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Advance by one token, appending its text to the scope buffer.
    ///
    /// Synthetic and diagnostic tokens consumed no input, so they do not
    /// contribute to the buffer.
    fn next(&mut self) -> Option<&Token> {
        self.fill_peek();
        let token = self.peeked.pop_front()?;
        if !token.kind.is_synthetic() && !token.kind.is_diagnostic() {
            self.buffer.push_str(&token.value);
        }
        self.current = Some(token);
        self.current.as_ref()
    }

    /// Consume the next token if it has the given kind.
    fn consumed(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.next();
            return true;
        }
        false
    }

    /// Drop the next token without touching the scope buffer.
    fn discard(&mut self) -> Option<Token> {
        self.fill_peek();
        self.peeked.pop_front()
    }

    /// Clear the scope buffer and any in-flight schema state.
    fn flush(&mut self) {
        self.buffer.clear();
        self.definition = None;
        self.argument = None;
    }

    fn marker_name(&self) -> String {
        self.definition
            .as_ref()
            .map(|definition| definition.name().to_string())
            .unwrap_or_else(|| UNKNOWN_MARKER.to_string())
    }

    /// Deliver an error-bearing result and reset for the next marker.
    fn push_error(&mut self, kind: MarkerErrorKind, position: Position) {
        let error = MarkerError {
            marker: self.marker_name(),
            position,
            kind,
        };
        trace!("marker error: {error}");
        self.results.push_back(MarkerResult {
            object: Err(error),
            marker_text: self.buffer.clone(),
        });
        self.flush();
    }

    /// Inflate the current schema and deliver the result.
    fn emit_marker(&mut self) {
        let Some(definition) = self.definition.take() else {
            self.flush();
            return;
        };
        let position = self
            .current
            .as_ref()
            .map(|token| token.start)
            .unwrap_or_default();
        let object = definition.inflate().map_err(|kind| MarkerError {
            marker: definition.name().to_string(),
            position,
            kind,
        });
        trace!("emit marker {:?}", self.buffer);
        self.results.push_back(MarkerResult {
            object,
            marker_text: self.buffer.clone(),
        });
        self.flush();
    }
}

/// Initial state.
fn start_parse(p: &mut Parser<'_>) -> Option<StateFn> {
    match p.peek_kind() {
        None | Some(TokenKind::Eof) => None,
        Some(TokenKind::Comment) => {
            p.discard();
            Some(StateFn(parse))
        }
        Some(TokenKind::MarkerStart) => {
            p.next();
            Some(StateFn(parse_marker_start))
        }
        Some(_) => Some(StateFn(parse)),
    }
}

/// Scan the token stream for the next marker.
fn parse(p: &mut Parser<'_>) -> Option<StateFn> {
    match p.peek_kind() {
        None | Some(TokenKind::Eof) => None,
        Some(TokenKind::Comment) => {
            p.discard();
            Some(StateFn(parse))
        }
        Some(TokenKind::MarkerStart) => {
            p.flush();
            p.next();
            Some(StateFn(parse_marker_start))
        }
        Some(TokenKind::Error) => {
            if let Some(token) = p.discard() {
                p.push_error(MarkerErrorKind::Lex(token.value), token.start);
            }
            Some(StateFn(parse))
        }
        Some(TokenKind::Warning) => {
            if let Some(token) = p.discard() {
                warn!("{}", token.value);
            }
            Some(StateFn(parse))
        }
        Some(_) => {
            p.discard();
            Some(StateFn(parse))
        }
    }
}

fn parse_marker_start(p: &mut Parser<'_>) -> Option<StateFn> {
    if p.peek_kind() == Some(TokenKind::Scope) {
        p.next();
        return Some(StateFn(parse_scope));
    }
    Some(StateFn(parse))
}

fn parse_scope(p: &mut Parser<'_>) -> Option<StateFn> {
    if p.peek_kind() == Some(TokenKind::Separator) {
        p.next();
        return Some(StateFn(parse_separator));
    }
    Some(StateFn(parse))
}

/// After a separator: deeper scope, or resolve the path and start arguments.
fn parse_separator(p: &mut Parser<'_>) -> Option<StateFn> {
    match p.peek_kind() {
        Some(TokenKind::Scope) => {
            p.next();
            Some(StateFn(parse_scope))
        }
        Some(TokenKind::Arg) => {
            // The registry is keyed by the scope path without its trailing
            // separator.
            let name = p
                .buffer
                .strip_suffix(':')
                .unwrap_or(&p.buffer)
                .to_string();
            if p.registry.lookup(&name) {
                trace!("resolved marker {name}");
                p.definition = p.registry.get_definition(&name);
                p.next();
                Some(StateFn(parse_arg))
            } else {
                // Not ours; some other subsystem may own this prefix.
                trace!("unknown marker {name}, skipping");
                p.flush();
                Some(StateFn(parse))
            }
        }
        _ => {
            p.flush();
            Some(StateFn(parse))
        }
    }
}

/// The current token names an argument; check it against the schema.
fn parse_arg(p: &mut Parser<'_>) -> Option<StateFn> {
    let declared = match (&p.current, &p.definition) {
        (Some(token), Some(definition)) => {
            definition.lookup_argument(&token.value).then(|| token.value.clone())
        }
        _ => None,
    };
    match declared {
        Some(name) => {
            p.argument = Some(name);
            Some(StateFn(parse_arg_value))
        }
        None => {
            trace!("undeclared argument, abandoning marker");
            Some(StateFn(parse))
        }
    }
}

/// Consume a literal and bind it to the pending argument.
fn parse_arg_value(p: &mut Parser<'_>) -> Option<StateFn> {
    p.consumed(TokenKind::ArgAssignment);

    let quoted = p.consumed(TokenKind::Quote);

    let Some(kind) = p.peek_kind() else {
        return None;
    };
    if !kind.is_literal() {
        return Some(StateFn(parse));
    }
    p.next();
    let (text, position) = match &p.current {
        Some(token) => (token.value.clone(), token.start),
        None => return None,
    };

    let converted = match kind {
        TokenKind::StringLiteral => Ok(ArgValue::String(text)),
        TokenKind::IntegerLiteral => {
            text.parse::<i64>()
                .map(ArgValue::Int)
                .map_err(|_| MarkerErrorKind::InvalidLiteral {
                    literal: text,
                    expected: "integer",
                })
        }
        TokenKind::FloatLiteral => {
            text.parse::<f64>()
                .map(ArgValue::Float)
                .map_err(|_| MarkerErrorKind::InvalidLiteral {
                    literal: text,
                    expected: "float",
                })
        }
        _ => text
            .parse::<bool>()
            .map(ArgValue::Bool)
            .map_err(|_| MarkerErrorKind::InvalidLiteral {
                literal: text,
                expected: "boolean",
            }),
    };

    if quoted {
        p.consumed(TokenKind::Quote);
    }

    let value = match converted {
        Ok(value) => value,
        Err(kind) => {
            p.push_error(kind, position);
            return Some(StateFn(parse));
        }
    };

    let Some(name) = p.argument.take() else {
        return Some(StateFn(parse));
    };
    match p.definition.as_mut().map(|definition| definition.bind(&name, value)) {
        Some(Err(kind)) => {
            p.push_error(kind, position);
            Some(StateFn(parse))
        }
        _ => Some(StateFn(parse_more_args)),
    }
}

/// After a bound argument: more arguments, or the end of the marker.
fn parse_more_args(p: &mut Parser<'_>) -> Option<StateFn> {
    match p.peek_kind() {
        Some(TokenKind::ArgDelimiter) => {
            p.next();
            Some(StateFn(parse_more_args))
        }
        Some(TokenKind::Arg) => {
            p.next();
            Some(StateFn(parse_arg))
        }
        Some(TokenKind::MarkerEnd) => {
            p.discard();
            p.emit_marker();
            Some(StateFn(parse))
        }
        _ => Some(StateFn(parse)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArgType;
    use pretty_assertions::assert_eq;

    fn galaxy_registry() -> Registry {
        let mut registry = Registry::new();
        registry.add(Definition::new("+galaxy").arg("planet", ArgType::String));
        registry.add(
            Definition::new("+planet")
                .arg("name", ArgType::String)
                .arg("solar-system", ArgType::String),
        );
        registry.add(Definition::new("+test").arg("flag", ArgType::Bool));
        registry.add(
            Definition::new("+typed")
                .arg("count", ArgType::Int)
                .optional_arg("ratio", ArgType::Float),
        );
        registry
    }

    fn parse_all(source: &str, registry: &Registry) -> Vec<MarkerResult> {
        Parser::new(source, registry).run()
    }

    #[test]
    fn test_string_argument_and_marker_text() {
        let registry = galaxy_registry();
        let results = parse_all("+galaxy:planet=earth", &registry);
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert_eq!(result.marker_text, "+galaxy:planet=earth");
        let object = result.object.as_ref().unwrap();
        assert_eq!(object.name(), "+galaxy");
        assert_eq!(object.string_arg("planet"), Some("earth"));
    }

    #[test]
    fn test_bare_flag_binds_synthetic_true() {
        let registry = galaxy_registry();
        let results = parse_all("+test:flag", &registry);
        assert_eq!(results.len(), 1);

        let object = results[0].object.as_ref().unwrap();
        assert_eq!(object.bool_arg("flag"), Some(true));
        assert_eq!(results[0].marker_text, "+test:flag");
    }

    #[test]
    fn test_two_required_arguments() {
        let registry = galaxy_registry();
        let results = parse_all("+planet:name=earth,solar-system=milky-way", &registry);
        assert_eq!(results.len(), 1);

        let object = results[0].object.as_ref().unwrap();
        assert_eq!(object.string_arg("name"), Some("earth"));
        assert_eq!(object.string_arg("solar-system"), Some("milky-way"));
        assert_eq!(
            results[0].marker_text,
            "+planet:name=earth,solar-system=milky-way"
        );
    }

    #[test]
    fn test_unknown_marker_is_silently_skipped() {
        let registry = galaxy_registry();
        let results = parse_all("+unknown:scope:arg=1", &registry);
        assert!(results.is_empty());
    }

    #[test]
    fn test_markers_after_an_unknown_one_still_parse() {
        let registry = galaxy_registry();
        let source = "# +unknown:scope:arg=1\n# +galaxy:planet=mars";
        let results = parse_all(source, &registry);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].object.as_ref().unwrap().string_arg("planet"),
            Some("mars")
        );
    }

    #[test]
    fn test_missing_required_argument_is_reported() {
        let registry = galaxy_registry();
        let results = parse_all("+planet:name=earth", &registry);
        assert_eq!(results.len(), 1);

        let error = results[0].object.as_ref().unwrap_err();
        assert_eq!(error.marker, "+planet");
        assert_eq!(
            error.kind,
            MarkerErrorKind::MissingArguments(vec!["solar-system".into()])
        );
    }

    #[test]
    fn test_type_mismatch_is_reported_in_band() {
        let registry = galaxy_registry();
        let source = "# +typed:count=nope\n# +typed:count=3";
        let results = parse_all(source, &registry);
        assert_eq!(results.len(), 2);

        let error = results[0].object.as_ref().unwrap_err();
        assert!(matches!(
            &error.kind,
            MarkerErrorKind::TypeMismatch { argument, .. } if argument == "count"
        ));

        // The second marker still parses.
        let object = results[1].object.as_ref().unwrap();
        assert_eq!(object.int_arg("count"), Some(3));
    }

    #[test]
    fn test_lexer_error_surfaces_as_result() {
        let registry = galaxy_registry();
        let results = parse_all("+typed:count=1.2.3", &registry);
        assert_eq!(results.len(), 1);

        let error = results[0].object.as_ref().unwrap_err();
        assert_eq!(error.marker, "+typed");
        assert!(matches!(&error.kind, MarkerErrorKind::Lex(message)
            if message.contains("unable to parse float value")));
    }

    #[test]
    fn test_lexer_error_before_resolution_is_unknown_marker() {
        let registry = galaxy_registry();
        let results = parse_all("+nobody:home='unterminated\n", &registry);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].object.as_ref().unwrap_err().marker, UNKNOWN_MARKER);
    }

    #[test]
    fn test_marker_without_scope_produces_nothing() {
        let registry = galaxy_registry();
        assert!(parse_all("// +foo", &registry).is_empty());
    }

    #[test]
    fn test_undeclared_argument_abandons_marker() {
        let registry = galaxy_registry();
        assert!(parse_all("+galaxy:moon=europa", &registry).is_empty());
    }

    #[test]
    fn test_quoted_value_keeps_quotes_in_marker_text() {
        let registry = galaxy_registry();
        let results = parse_all("+galaxy:planet='the earth'", &registry);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].marker_text, "+galaxy:planet='the earth'");
        assert_eq!(
            results[0].object.as_ref().unwrap().string_arg("planet"),
            Some("the earth")
        );
    }

    #[test]
    fn test_results_arrive_in_source_order() {
        let registry = galaxy_registry();
        let source = "# +galaxy:planet=mercury\n# +galaxy:planet=venus\n# +galaxy:planet=earth";
        let planets: Vec<String> = parse_all(source, &registry)
            .into_iter()
            .map(|r| r.object.unwrap().string_arg("planet").unwrap().to_string())
            .collect();
        assert_eq!(planets, vec!["mercury", "venus", "earth"]);
    }

    #[test]
    fn test_optional_float_widens_from_integer() {
        let registry = galaxy_registry();
        let results = parse_all("+typed:count=1,ratio=2", &registry);
        let object = results[0].object.as_ref().unwrap();
        assert_eq!(object.get("ratio"), Some(&ArgValue::Float(2.0)));
    }
}
