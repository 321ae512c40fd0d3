//! Orchestration: build a parser per input, collect what it yields.

use crate::{MarkerResult, Parser, Registry};

/// Runs a fresh lexer/parser pair over each input string and collects every
/// result, errors included, in marker-occurrence order.
#[derive(Debug, Clone, Copy)]
pub struct Inspector<'a> {
    registry: &'a Registry,
}

impl<'a> Inspector<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Inspect one input string for markers.
    pub fn inspect(&self, source: &str) -> Vec<MarkerResult> {
        Parser::new(source, self.registry).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgType, Definition};

    #[test]
    fn test_each_input_gets_a_fresh_parser() {
        let mut registry = Registry::new();
        registry.add(Definition::new("+galaxy").arg("planet", ArgType::String));
        let inspector = Inspector::new(&registry);

        let first = inspector.inspect("+galaxy:planet=earth");
        let second = inspector.inspect("no markers here");
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }
}
