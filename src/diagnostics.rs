//! Rendering of accumulated parse diagnostics.
//!
//! Each error becomes one `Error on line L, column C: MSG` line. Output is
//! capped: after [`MAX_REPORTED_ERRORS`] lines the report ends with a
//! `Too many errors, quitting.` trailer and the rest are dropped.

use crate::error::ParseError;

/// Maximum number of parse errors reported before giving up.
pub const MAX_REPORTED_ERRORS: usize = 100;

/// Renders the error list as the user-facing stderr report.
pub fn render_parse_errors(errors: &[ParseError]) -> String {
    let mut out = String::new();
    for err in errors.iter().take(MAX_REPORTED_ERRORS) {
        out.push_str(&err.to_string());
        out.push('\n');
    }
    if errors.len() > MAX_REPORTED_ERRORS {
        out.push_str("Too many errors, quitting.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, ParseErrorKind};

    #[test]
    fn renders_one_line_per_error() {
        let errors = vec![
            ParseError::new(ParseErrorKind::InvalidCharacter('G'), 1, 2),
            ParseError::new(ParseErrorKind::NotEnoughCommands, 3, 4),
        ];
        let report = render_parse_errors(&errors);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Error on line 1, column 2: invalid command character 'G'"
        );
        assert_eq!(
            lines[1],
            "Error on line 3, column 4: chunk doesn't have enough commands"
        );
    }

    #[test]
    fn caps_at_one_hundred_errors() {
        let errors: Vec<ParseError> = (0..150)
            .map(|i| ParseError::new(ParseErrorKind::TooManyCommands, 1, i + 1))
            .collect();
        let report = render_parse_errors(&errors);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), MAX_REPORTED_ERRORS + 1);
        assert_eq!(lines[MAX_REPORTED_ERRORS], "Too many errors, quitting.");
    }
}
