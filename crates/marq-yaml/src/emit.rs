//! Structural re-emission of YAML documents.
//!
//! Block style, two-space indentation, comments preserved. Byte-for-byte
//! fidelity with the parsed source is not a goal; structural fidelity and
//! comment placement are.

use crate::parser::{is_float, is_int};
use crate::{Document, Node, NodeKind, ScalarStyle};

impl Document {
    /// Serialize the document.
    pub fn emit(&self) -> String {
        let mut out = String::new();
        write_comment_block(&self.root.head_comment, 0, &mut out);
        match self.root.kind {
            NodeKind::Mapping => emit_entries(&self.root, 0, &mut out, false),
            NodeKind::Sequence => emit_sequence(&self.root, 0, &mut out),
            NodeKind::Scalar => {
                out.push_str(&scalar_text(&self.root));
                out.push('\n');
            }
        }
        write_comment_block(&self.root.foot_comment, 0, &mut out);
        out
    }
}

fn push_indent(indent: usize, out: &mut String) {
    for _ in 0..indent {
        out.push(' ');
    }
}

/// Write a stored comment block, one `#` line per stored line.
fn write_comment_block(comment: &str, indent: usize, out: &mut String) {
    for line in comment.split('\n') {
        if line.is_empty() {
            continue;
        }
        push_indent(indent, out);
        if line.starts_with('#') {
            out.push_str(line);
        } else {
            out.push_str("# ");
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn emit_entries(node: &Node, indent: usize, out: &mut String, inline_first: bool) {
    let mut first = true;
    for (key, value) in node.mapping_pairs() {
        let inline = inline_first && first;
        if !inline {
            write_comment_block(&key.head_comment, indent, out);
            push_indent(indent, out);
        }
        out.push_str(&scalar_text(key));
        out.push(':');

        match value.kind {
            NodeKind::Scalar if value.style == ScalarStyle::Literal => {
                out.push_str(" |-");
                write_line_comment(key, value, out);
                out.push('\n');
                for line in value.value.split('\n') {
                    if !line.is_empty() {
                        push_indent(indent + 2, out);
                        out.push_str(line);
                    }
                    out.push('\n');
                }
            }
            NodeKind::Scalar => {
                if value.tag != "!!null" {
                    out.push(' ');
                    out.push_str(&scalar_text(value));
                }
                write_line_comment(key, value, out);
                out.push('\n');
            }
            NodeKind::Mapping | NodeKind::Sequence => {
                if !key.line_comment.is_empty() {
                    out.push_str("  ");
                    out.push_str(&key.line_comment);
                }
                out.push('\n');
                if value.kind == NodeKind::Mapping {
                    emit_entries(value, indent + 2, out, false);
                } else {
                    emit_sequence(value, indent + 2, out);
                }
            }
        }

        write_comment_block(&key.foot_comment, indent, out);
        first = false;
    }
}

fn write_line_comment(key: &Node, value: &Node, out: &mut String) {
    let comment = if !value.line_comment.is_empty() {
        &value.line_comment
    } else {
        &key.line_comment
    };
    if !comment.is_empty() {
        out.push_str("  ");
        out.push_str(comment);
    }
}

fn emit_sequence(node: &Node, indent: usize, out: &mut String) {
    for item in &node.children {
        write_comment_block(&item.head_comment, indent, out);
        match item.kind {
            NodeKind::Scalar => {
                push_indent(indent, out);
                out.push('-');
                if item.tag != "!!null" {
                    out.push(' ');
                    out.push_str(&scalar_text(item));
                }
                if !item.line_comment.is_empty() {
                    out.push_str("  ");
                    out.push_str(&item.line_comment);
                }
                out.push('\n');
            }
            NodeKind::Mapping => {
                // The first entry rides on the dash line.
                if let Some(first_key) = item.children.first() {
                    write_comment_block(&first_key.head_comment, indent, out);
                }
                push_indent(indent, out);
                out.push_str("- ");
                emit_entries(item, indent + 2, out, true);
            }
            NodeKind::Sequence => {
                push_indent(indent, out);
                out.push('-');
                out.push('\n');
                emit_sequence(item, indent + 2, out);
            }
        }
        write_comment_block(&item.foot_comment, indent, out);
    }
}

fn scalar_text(node: &Node) -> String {
    if node.tag == "!!var" {
        return node.value.clone();
    }
    match node.style {
        ScalarStyle::Flow => node.value.clone(),
        ScalarStyle::Double => quote_double(&node.value),
        ScalarStyle::Single => quote_single(&node.value),
        _ => {
            if node.value.contains('\n') {
                quote_double(&node.value)
            } else if needs_quote(node) {
                quote_single(&node.value)
            } else {
                node.value.clone()
            }
        }
    }
}

/// Whether a plain rendering of this scalar would change meaning on reparse.
fn needs_quote(node: &Node) -> bool {
    if node.tag != "!!str" {
        return false;
    }
    let value = &node.value;
    value.is_empty()
        || value.starts_with([
            ' ', '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'',
            '"', '%', '@', '`',
        ])
        || value.ends_with(' ')
        || value.contains(": ")
        || value.ends_with(':')
        || value.contains(" #")
        || matches!(value.as_str(), "true" | "false" | "null" | "~")
        || is_int(value)
        || is_float(value)
}

fn quote_single(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_double(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
