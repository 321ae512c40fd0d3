//! Round-trip law: lexing, stringifying the non-synthetic token values, and
//! relexing yields the same non-synthetic token sequence.

use marq_tokenizer::{Lexer, TokenKind};
use proptest::prelude::*;

fn lex(source: &str) -> Vec<(TokenKind, String)> {
    Lexer::new(source)
        .run()
        .into_iter()
        .map(|t| (t.kind, t.value))
        .collect()
}

fn visible(tokens: &[(TokenKind, String)]) -> Vec<(TokenKind, String)> {
    tokens
        .iter()
        .filter(|(kind, _)| !kind.is_synthetic())
        .cloned()
        .collect()
}

fn stringify(tokens: &[(TokenKind, String)]) -> String {
    tokens
        .iter()
        .filter(|(kind, _)| !kind.is_synthetic() && *kind != TokenKind::Eof)
        .map(|(_, value)| value.as_str())
        .collect()
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9-]{0,7}",
        "[0-9]{1,4}",
        "[0-9]{1,3}\\.[0-9]{1,3}",
        Just("true".to_string()),
        Just("false".to_string()),
        "[a-z ]{0,10}".prop_map(|s| format!("'{s}'")),
    ]
}

proptest! {
    #[test]
    fn relex_preserves_token_stream(
        scopes in prop::collection::vec("[a-z]{1,8}", 1..3),
        first_value in value_strategy(),
        args in prop::collection::vec(
            ("[a-z]{1,8}", prop::option::of(value_strategy())),
            0..3,
        ),
    ) {
        let mut source = format!("+{}:first={}", scopes.join(":"), first_value);
        for (name, value) in &args {
            source.push(',');
            source.push_str(name);
            if let Some(value) = value {
                source.push('=');
                source.push_str(value);
            }
        }

        let original = lex(&source);
        prop_assert!(
            original.iter().all(|(kind, _)| !kind.is_diagnostic()),
            "generated marker should lex cleanly: {source}"
        );

        let relexed = lex(&stringify(&original));
        prop_assert_eq!(visible(&original), visible(&relexed));
    }
}
