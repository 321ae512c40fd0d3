//! Block-style YAML parsing with comment attachment.
//!
//! A single forward pass over logical lines. Full-line comments become the
//! head comment of the entry that follows them; a trailing comment becomes
//! the line comment of the value on that line (or of the key, when the value
//! is a nested block); comments left over when a block closes become the
//! foot comment of the block's last key.

use marq_tokenizer::Position;
use tracing::trace;

use crate::{Document, Node, NodeId, NodeKind, ScalarStyle};

/// Error while scanning a YAML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Tabs are not valid YAML indentation.
    TabIndentation { line: usize },
    /// A line is indented deeper than its block allows.
    UnexpectedIndent { line: usize },
    /// A mapping line has no `key:` prefix.
    MissingKey { line: usize },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::TabIndentation { line } => {
                write!(f, "line {line}: tab used for indentation")
            }
            ScanError::UnexpectedIndent { line } => {
                write!(f, "line {line}: unexpected indentation")
            }
            ScanError::MissingKey { line } => {
                write!(f, "line {line}: expected a `key:` entry")
            }
        }
    }
}

impl std::error::Error for ScanError {}

#[derive(Debug, Clone, Copy)]
struct Line<'src> {
    indent: usize,
    content: &'src str,
    number: usize,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.content.is_empty()
    }

    fn is_comment(&self) -> bool {
        self.content.starts_with('#')
    }

    fn is_sequence_item(&self) -> bool {
        self.content == "-" || self.content.starts_with("- ")
    }
}

fn read_lines(source: &str) -> Result<Vec<Line<'_>>, ScanError> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let without_indent = raw.trim_start_matches(' ');
        if without_indent.starts_with('\t') {
            return Err(ScanError::TabIndentation { line: number });
        }
        let indent = raw.len() - without_indent.len();
        let content = without_indent.trim_end();
        if indent == 0 && (content == "---" || content == "...") {
            continue;
        }
        lines.push(Line {
            indent,
            content,
            number,
        });
    }
    Ok(lines)
}

struct YamlParser<'src> {
    lines: Vec<Line<'src>>,
    index: usize,
    next_id: u32,
}

impl Document {
    /// Parse a YAML document, attaching comments to the nodes they describe.
    pub fn parse(source: &str) -> Result<Self, ScanError> {
        let lines = read_lines(source)?;
        let mut parser = YamlParser {
            lines,
            index: 0,
            next_id: 0,
        };
        let root = parser.parse_root()?;
        trace!("parsed document with {} top-level children", root.children.len());
        Ok(Document { root })
    }
}

impl<'src> YamlParser<'src> {
    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> Option<Line<'src>> {
        self.lines.get(self.index).copied()
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    /// The next line that is neither blank nor a comment.
    fn peek_content(&self) -> Option<Line<'src>> {
        self.lines[self.index..]
            .iter()
            .copied()
            .find(|line| !line.is_blank() && !line.is_comment())
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(line) if line.is_blank()) {
            self.advance();
        }
    }

    /// Consume comment lines belonging to the block at `min_indent`.
    fn take_comments(&mut self, min_indent: usize) -> Vec<String> {
        let mut comments = Vec::new();
        loop {
            self.skip_blanks();
            match self.peek() {
                Some(line) if line.is_comment() && line.indent >= min_indent => {
                    comments.push(line.content.to_string());
                    self.advance();
                }
                _ => break,
            }
        }
        comments
    }

    fn parse_root(&mut self) -> Result<Node, ScanError> {
        match self.peek_content() {
            Some(first) => self.parse_block(first.indent),
            None => {
                // A comments-only (or empty) document.
                let comments = self.take_comments(0);
                let mut node = Node::new(self.alloc(), NodeKind::Mapping, Position::start());
                node.head_comment = comments.join("\n");
                Ok(node)
            }
        }
    }

    fn parse_block(&mut self, indent: usize) -> Result<Node, ScanError> {
        let sequence = matches!(self.peek_content(), Some(line) if line.is_sequence_item());
        if sequence {
            self.parse_sequence(indent)
        } else {
            self.parse_mapping(indent)
        }
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Node, ScanError> {
        let position = self.block_position(indent);
        let mut node = Node::new(self.alloc(), NodeKind::Mapping, position);

        loop {
            let pending = self.take_comments(indent);
            let Some(line) = self.peek() else {
                attach_trailing(&mut node, pending);
                break;
            };
            if line.is_comment() || line.indent < indent {
                // Dedent, or a comment owned by an outer block.
                attach_trailing(&mut node, pending);
                break;
            }
            if line.indent > indent {
                return Err(ScanError::UnexpectedIndent { line: line.number });
            }
            self.parse_entry(indent, pending, &mut node)?;
        }
        Ok(node)
    }

    fn parse_entry(
        &mut self,
        indent: usize,
        head: Vec<String>,
        mapping: &mut Node,
    ) -> Result<(), ScanError> {
        let Some(line) = self.peek() else {
            return Ok(());
        };
        let Some((key_text, rest)) = split_entry(line.content) else {
            return Err(ScanError::MissingKey { line: line.number });
        };
        self.advance();

        let mut key = self.scalar_node(key_text, Position::new(line.number, line.indent + 1));
        key.head_comment = head.join("\n");

        let (value_text, line_comment) = split_comment(rest);
        let value_text = value_text.trim();
        let value_position =
            Position::new(line.number, line.indent + key_text.len() + 3);

        let mut value_on_line = true;
        let mut value = if value_text.is_empty() {
            match self.peek_content() {
                Some(next) if next.indent > indent => {
                    value_on_line = false;
                    self.parse_block(next.indent)?
                }
                // A sequence may sit at the same indent as its key.
                Some(next) if next.indent == indent && next.is_sequence_item() => {
                    value_on_line = false;
                    self.parse_sequence(indent)?
                }
                _ => self.null_node(value_position),
            }
        } else if is_block_scalar_header(value_text) {
            value_on_line = false;
            self.parse_block_scalar(indent, value_position)
        } else {
            self.scalar_or_flow(value_text, value_position)
        };

        if let Some(comment) = line_comment {
            if value_on_line {
                value.line_comment = comment;
            } else {
                key.line_comment = comment;
            }
        }

        mapping.children.push(key);
        mapping.children.push(value);
        Ok(())
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Node, ScanError> {
        let position = self.block_position(indent);
        let mut node = Node::new(self.alloc(), NodeKind::Sequence, position);

        loop {
            let pending = self.take_comments(indent);
            let Some(line) = self.peek() else {
                attach_trailing(&mut node, pending);
                break;
            };
            if line.is_comment() || line.indent < indent || !line.is_sequence_item() {
                attach_trailing(&mut node, pending);
                break;
            }
            if line.indent > indent {
                return Err(ScanError::UnexpectedIndent { line: line.number });
            }

            let head = pending.join("\n");
            if line.content == "-" {
                self.advance();
                let mut item = match self.peek_content() {
                    Some(next) if next.indent > indent => self.parse_block(next.indent)?,
                    _ => self.null_node(Position::new(line.number, line.indent + 2)),
                };
                item.head_comment = head;
                node.children.push(item);
                continue;
            }

            let rest = &line.content[2..];
            let item_indent = line.indent + 2;
            if split_entry(rest).is_some() {
                // An inline mapping item: re-enter this line as the first
                // entry of a mapping two columns deeper.
                self.lines[self.index] = Line {
                    indent: item_indent,
                    content: rest,
                    number: line.number,
                };
                let mut item = self.parse_mapping(item_indent)?;
                if !head.is_empty() {
                    item.head_comment = head;
                }
                node.children.push(item);
            } else {
                self.advance();
                let (value_text, comment) = split_comment(rest);
                let mut item = self.scalar_or_flow(
                    value_text.trim(),
                    Position::new(line.number, line.indent + 3),
                );
                item.head_comment = head;
                if let Some(comment) = comment {
                    item.line_comment = comment;
                }
                node.children.push(item);
            }
        }
        Ok(node)
    }

    /// Collect the indented body of a `|` or `>` block scalar.
    fn parse_block_scalar(&mut self, parent_indent: usize, position: Position) -> Node {
        let mut collected: Vec<(usize, &'src str)> = Vec::new();
        loop {
            let Some(line) = self.peek() else {
                break;
            };
            if line.is_blank() {
                collected.push((0, ""));
                self.advance();
                continue;
            }
            if line.indent <= parent_indent {
                break;
            }
            collected.push((line.indent, line.content));
            self.advance();
        }
        while matches!(collected.last(), Some((_, content)) if content.is_empty()) {
            collected.pop();
        }

        let base = collected
            .iter()
            .filter(|(_, content)| !content.is_empty())
            .map(|(indent, _)| *indent)
            .min()
            .unwrap_or(0);
        let text = collected
            .iter()
            .map(|(indent, content)| {
                if content.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", " ".repeat(indent - base), content)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut node = Node::new(self.alloc(), NodeKind::Scalar, position);
        node.style = ScalarStyle::Literal;
        node.value = text;
        node
    }

    fn block_position(&self, indent: usize) -> Position {
        self.peek_content()
            .map(|line| Position::new(line.number, line.indent + 1))
            .unwrap_or(Position::new(1, indent + 1))
    }

    fn scalar_or_flow(&mut self, text: &str, position: Position) -> Node {
        if is_flow(text) {
            let mut node = Node::new(self.alloc(), NodeKind::Scalar, position);
            node.value = text.to_string();
            node.style = ScalarStyle::Flow;
            return node;
        }
        self.scalar_node(text, position)
    }

    fn scalar_node(&mut self, text: &str, position: Position) -> Node {
        let mut node = Node::new(self.alloc(), NodeKind::Scalar, position);
        if text.len() >= 2
            && let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"'))
        {
            node.style = ScalarStyle::Double;
            node.value = unescape_double(inner);
        } else if text.len() >= 2
            && let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\''))
        {
            node.style = ScalarStyle::Single;
            node.value = inner.replace("''", "'");
        } else {
            node.tag = resolve_tag(text).to_string();
            if node.tag != "!!null" {
                node.value = text.to_string();
            }
        }
        node
    }

    fn null_node(&mut self, position: Position) -> Node {
        let mut node = Node::new(self.alloc(), NodeKind::Scalar, position);
        node.tag = "!!null".to_string();
        node
    }
}

/// Append a comment block onto an existing comment, newline separated.
fn append_comment(existing: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !existing.is_empty() {
        existing.push('\n');
    }
    existing.push_str(text);
}

/// Attribute comments left over when a block closes.
fn attach_trailing(node: &mut Node, comments: Vec<String>) {
    if comments.is_empty() {
        return;
    }
    let text = comments.join("\n");
    match node.kind {
        NodeKind::Mapping if node.children.len() >= 2 => {
            let index = node.children.len() - 2;
            append_comment(&mut node.children[index].foot_comment, &text);
        }
        NodeKind::Sequence if !node.children.is_empty() => {
            if let Some(last) = node.children.last_mut() {
                append_comment(&mut last.foot_comment, &text);
            }
        }
        _ => append_comment(&mut node.head_comment, &text),
    }
}

/// Split a mapping line into key text and the remainder after the colon.
fn split_entry(content: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (index, c) in content.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                ':' => {
                    let rest = &content[index + 1..];
                    if rest.is_empty() || rest.starts_with(' ') {
                        return Some((content[..index].trim_end(), rest));
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// Split a trailing ` # comment` off a value, respecting quotes.
fn split_comment(rest: &str) -> (&str, Option<String>) {
    let mut quote: Option<char> = None;
    let mut boundary = true;
    for (index, c) in rest.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '#' if boundary => {
                    return (&rest[..index], Some(rest[index..].trim_end().to_string()));
                }
                _ => {}
            },
        }
        boundary = c == ' ';
    }
    (rest, None)
}

fn is_block_scalar_header(text: &str) -> bool {
    matches!(text, "|" | "|-" | "|+" | ">" | ">-" | ">+")
}

fn is_flow(text: &str) -> bool {
    (text.starts_with('[') && text.ends_with(']'))
        || (text.starts_with('{') && text.ends_with('}'))
}

fn resolve_tag(text: &str) -> &'static str {
    match text {
        "" | "~" | "null" => "!!null",
        "true" | "false" => "!!bool",
        _ if is_int(text) => "!!int",
        _ if is_float(text) => "!!float",
        _ => "!!str",
    }
}

pub(crate) fn is_int(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn is_float(text: &str) -> bool {
    (text.contains('.') || text.contains('e') || text.contains('E'))
        && text.parse::<f64>().is_ok()
}

fn unescape_double(inner: &str) -> String {
    if !inner.contains('\\') {
        return inner.to_string();
    }
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Document {
        Document::parse(source).unwrap()
    }

    #[test]
    fn test_flat_mapping() {
        let doc = parse("name: webapp\nreplicas: 2\nready: true\n");
        let root = &doc.root;
        assert_eq!(root.kind, NodeKind::Mapping);
        assert_eq!(root.children.len(), 6);
        assert_eq!(root.get("name").unwrap().value, "webapp");
        assert_eq!(root.get("replicas").unwrap().tag, "!!int");
        assert_eq!(root.get("ready").unwrap().tag, "!!bool");
    }

    #[test]
    fn test_nested_mapping() {
        let doc = parse("spec:\n  image: nginx\n  port: 8080\n");
        let spec = doc.root.get("spec").unwrap();
        assert_eq!(spec.kind, NodeKind::Mapping);
        assert_eq!(spec.get("image").unwrap().value, "nginx");
        assert_eq!(spec.get("port").unwrap().value, "8080");
    }

    #[test]
    fn test_sequence_of_scalars() {
        let doc = parse("ports:\n  - 80\n  - 443\n");
        let ports = doc.root.get("ports").unwrap();
        assert_eq!(ports.kind, NodeKind::Sequence);
        let values: Vec<&str> = ports.children.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["80", "443"]);
    }

    #[test]
    fn test_sequence_at_key_indent() {
        let doc = parse("args:\n- one\n- two\nafter: x\n");
        let args = doc.root.get("args").unwrap();
        assert_eq!(args.kind, NodeKind::Sequence);
        assert_eq!(args.children.len(), 2);
        assert_eq!(doc.root.get("after").unwrap().value, "x");
    }

    #[test]
    fn test_sequence_of_mappings() {
        let doc = parse("containers:\n  - name: app\n    image: nginx\n  - name: sidecar\n");
        let containers = doc.root.get("containers").unwrap();
        assert_eq!(containers.children.len(), 2);
        let first = &containers.children[0];
        assert_eq!(first.get("name").unwrap().value, "app");
        assert_eq!(first.get("image").unwrap().value, "nginx");
        assert_eq!(containers.children[1].get("name").unwrap().value, "sidecar");
    }

    #[test]
    fn test_head_comment_attaches_to_key() {
        let doc = parse("# the application name\n# spans two lines\nname: webapp\n");
        let key = &doc.root.children[0];
        assert_eq!(key.value, "name");
        assert_eq!(
            key.head_comment,
            "# the application name\n# spans two lines"
        );
    }

    #[test]
    fn test_line_comment_attaches_to_value() {
        let doc = parse("name: webapp  # +marq:field:name=myField,type=string\n");
        let value = doc.root.get("name").unwrap();
        assert_eq!(value.value, "webapp");
        assert_eq!(
            value.line_comment,
            "# +marq:field:name=myField,type=string"
        );
    }

    #[test]
    fn test_line_comment_on_nested_key() {
        let doc = parse("spec:  # about the spec\n  image: nginx\n");
        let key = &doc.root.children[0];
        assert_eq!(key.value, "spec");
        assert_eq!(key.line_comment, "# about the spec");
    }

    #[test]
    fn test_trailing_comment_is_foot_of_last_key() {
        let doc = parse("name: webapp\n# leftover note\n");
        let key = &doc.root.children[0];
        assert_eq!(key.foot_comment, "# leftover note");
    }

    #[test]
    fn test_quoted_scalars() {
        let doc = parse("a: \"x: y\"\nb: 'it''s'\nc: \"line\\nbreak\"\n");
        assert_eq!(doc.root.get("a").unwrap().value, "x: y");
        assert_eq!(doc.root.get("a").unwrap().style, ScalarStyle::Double);
        assert_eq!(doc.root.get("b").unwrap().value, "it's");
        assert_eq!(doc.root.get("c").unwrap().value, "line\nbreak");
    }

    #[test]
    fn test_hash_inside_quotes_is_not_a_comment() {
        let doc = parse("a: 'not # a comment'\n");
        let value = doc.root.get("a").unwrap();
        assert_eq!(value.value, "not # a comment");
        assert_eq!(value.line_comment, "");
    }

    #[test]
    fn test_null_values() {
        let doc = parse("a:\nb: ~\nc: null\n");
        for key in ["a", "b", "c"] {
            let value = doc.root.get(key).unwrap();
            assert_eq!(value.tag, "!!null", "for key {key}");
            assert_eq!(value.value, "");
        }
    }

    #[test]
    fn test_block_scalar() {
        let doc = parse("script: |\n  echo one\n  echo two\nafter: 1\n");
        let script = doc.root.get("script").unwrap();
        assert_eq!(script.value, "echo one\necho two");
        assert_eq!(script.style, ScalarStyle::Literal);
        assert_eq!(doc.root.get("after").unwrap().value, "1");
    }

    #[test]
    fn test_flow_collection_is_verbatim_text() {
        let doc = parse("args: [one, two]\n");
        let args = doc.root.get("args").unwrap();
        assert_eq!(args.style, ScalarStyle::Flow);
        assert_eq!(args.value, "[one, two]");
    }

    #[test]
    fn test_document_markers_are_skipped() {
        let doc = parse("---\nname: webapp\n");
        assert_eq!(doc.root.get("name").unwrap().value, "webapp");
    }

    #[test]
    fn test_tab_indentation_is_an_error() {
        assert_eq!(
            Document::parse("a:\n\tb: 1\n").unwrap_err(),
            ScanError::TabIndentation { line: 2 }
        );
    }

    #[test]
    fn test_node_ids_are_unique_and_findable() {
        let doc = parse("spec:\n  image: nginx\n");
        let image_value = doc.root.get("spec").unwrap().get("image").unwrap();
        let found = doc.node(image_value.id).unwrap();
        assert_eq!(found.value, "nginx");
    }
}
