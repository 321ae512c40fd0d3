//! Diagnostic rendering for marker errors.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::{MarkerError, MarkerErrorKind};

impl MarkerError {
    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source
    /// context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename, source);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        source: &str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let offset = self.position.byte_offset(source);
        let range = offset..(offset + 1).min(source.len()).max(offset);

        let report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(format!("marker {}: {}", self.marker, self.kind));

        match &self.kind {
            MarkerErrorKind::Lex(_) => report
                .with_label(
                    Label::new((filename, range))
                        .with_message("lexing stopped here")
                        .with_color(Color::Red),
                )
                .with_help("check the marker's quoting and literal syntax"),

            MarkerErrorKind::UnknownArgument(_) => report.with_label(
                Label::new((filename, range))
                    .with_message("not declared by this marker")
                    .with_color(Color::Red),
            ),

            MarkerErrorKind::TypeMismatch { expected, .. } => report
                .with_label(
                    Label::new((filename, range))
                        .with_message("wrong value type")
                        .with_color(Color::Red),
                )
                .with_help(format!("this argument expects a {expected} value")),

            MarkerErrorKind::Unmarshal { .. } => report.with_label(
                Label::new((filename, range))
                    .with_message("rejected value")
                    .with_color(Color::Red),
            ),

            MarkerErrorKind::InvalidLiteral { expected, .. } => report.with_label(
                Label::new((filename, range))
                    .with_message(format!("not a {expected} literal"))
                    .with_color(Color::Red),
            ),

            MarkerErrorKind::MissingArguments(names) => report
                .with_label(
                    Label::new((filename, range))
                        .with_message("marker ends here")
                        .with_color(Color::Red),
                )
                .with_help(format!("provide: {}", names.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marq_tokenizer::Position;

    #[test]
    fn test_render_includes_message_and_help() {
        let source = "# +galaxy:planet=earth\n";
        let error = MarkerError {
            marker: "+galaxy".into(),
            position: Position::new(1, 3),
            kind: MarkerErrorKind::MissingArguments(vec!["name".into()]),
        };
        let rendered = error.render("config.yaml", source);
        assert!(rendered.contains("missing required arguments"));
        assert!(rendered.contains("provide: name"));
    }
}
