use std::sync::LazyLock;

use regex::Regex;

/// `<indent><marker> [<mark>] <date>: <remainder>`, every piece optional.
/// The whitespace after each piece is captured so the line can be rebuilt
/// byte for byte.
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^(\s*)(?:([*-]|\d+\.)(\s*))?(?:(\[.\])(\s+))?(?:((?:\d{4}-)?\d{2}-\d{2}):(\s+))?(.*)$",
    )
    .unwrap()
});

/// One raw line split into its structural pieces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    pub indentation: String,
    /// `-`, `*` or `N.`
    pub list_marker: String,
    pub marker_separator: String,
    /// `[` + mark + `]`, or empty
    pub checkbox: String,
    pub checkbox_separator: String,
    /// `YYYY-MM-DD` or `MM-DD`, without the colon
    pub date: String,
    pub date_separator: String,
    /// Everything after the structural prefix, verbatim
    pub remainder: String,
}

impl ParsedLine {
    /// The character inside the checkbox brackets
    pub fn checkbox_mark(&self) -> Option<char> {
        self.checkbox.chars().nth(1)
    }

    pub fn has_checkbox(&self) -> bool {
        !self.checkbox.is_empty()
    }

    /// Force the checkbox to `[mark]`, creating it if the line had none.
    pub fn set_checkbox(&mut self, mark: char) {
        self.checkbox = format!("[{}]", mark);
        if self.checkbox_separator.is_empty() {
            self.checkbox_separator = " ".to_string();
        }
        if !self.list_marker.is_empty() && self.marker_separator.is_empty() {
            self.marker_separator = " ".to_string();
        }
    }

    /// Drop the checkbox, turning a todo back into a plain list item.
    pub fn clear_checkbox(&mut self) {
        self.checkbox.clear();
        self.checkbox_separator.clear();
        if !self.list_marker.is_empty() && self.marker_separator.is_empty() {
            self.marker_separator = " ".to_string();
        }
    }
}

/// Parse a raw line. Total over all inputs: a line that does not fit the
/// shape comes back as a bare remainder.
pub fn parse_line(raw: &str) -> ParsedLine {
    let Some(caps) = LINE_RE.captures(raw) else {
        return ParsedLine {
            remainder: raw.to_string(),
            ..ParsedLine::default()
        };
    };
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();
    ParsedLine {
        indentation: group(1),
        list_marker: group(2),
        marker_separator: group(3),
        checkbox: group(4),
        checkbox_separator: group(5),
        date: group(6),
        date_separator: group(7),
        remainder: group(8),
    }
}

/// Rebuild a line. Absent pieces contribute nothing, not even a separator.
pub fn line_to_string(line: &ParsedLine) -> String {
    let mut out = String::with_capacity(line.remainder.len() + 16);
    out.push_str(&line.indentation);
    if !line.list_marker.is_empty() {
        out.push_str(&line.list_marker);
        out.push_str(&line.marker_separator);
    }
    if !line.checkbox.is_empty() {
        out.push_str(&line.checkbox);
        out.push_str(&line.checkbox_separator);
    }
    if !line.date.is_empty() {
        out.push_str(&line.date);
        out.push(':');
        if line.date_separator.is_empty() {
            out.push(' ');
        } else {
            out.push_str(&line.date_separator);
        }
    }
    out.push_str(&line.remainder);
    out
}

/// Indentation weight: one per space, four per tab.
pub fn indent_level(indentation: &str) -> usize {
    indentation
        .chars()
        .map(|c| match c {
            ' ' => 1,
            '\t' => 4,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pieces(line: &ParsedLine) -> (&str, &str, &str, &str, &str) {
        (
            line.indentation.as_str(),
            line.list_marker.as_str(),
            line.checkbox.as_str(),
            line.date.as_str(),
            line.remainder.as_str(),
        )
    }

    #[test]
    fn test_plain_line() {
        let parsed = parse_line("This is a simple line");
        assert_eq!(pieces(&parsed), ("", "", "", "", "This is a simple line"));
    }

    #[test]
    fn test_indented_line() {
        let parsed = parse_line("  This is an indented line");
        assert_eq!(pieces(&parsed), ("  ", "", "", "", "This is an indented line"));
    }

    #[test]
    fn test_list_markers() {
        assert_eq!(parse_line("- bullet").list_marker, "-");
        assert_eq!(parse_line("* star").list_marker, "*");
        assert_eq!(parse_line("12. numbered").list_marker, "12.");
        assert_eq!(parse_line("12. numbered").remainder, "numbered");
    }

    #[test]
    fn test_checkbox_and_date() {
        let parsed = parse_line("    * [x] 2023-12-25: Complete holiday shopping");
        assert_eq!(
            pieces(&parsed),
            ("    ", "*", "[x]", "2023-12-25", "Complete holiday shopping")
        );
        assert_eq!(parsed.checkbox_mark(), Some('x'));

        let short = parse_line("- [ ] 12-25: Christmas todo");
        assert_eq!(short.date, "12-25");
        assert_eq!(short.remainder, "Christmas todo");
    }

    #[test]
    fn test_checkbox_needs_trailing_whitespace() {
        let parsed = parse_line("- [x]");
        assert_eq!(parsed.checkbox, "");
        assert_eq!(parsed.remainder, "[x]");
    }

    #[test]
    fn test_bracket_mark() {
        let parsed = parse_line("- []] dropped");
        assert_eq!(parsed.checkbox, "[]]");
        assert_eq!(parsed.checkbox_mark(), Some(']'));
    }

    #[test]
    fn test_round_trip_identity() {
        for line in [
            "",
            "   ",
            "\t",
            "plain text",
            "- [ ] Simple todo",
            "-  [x]   spaced   out  ",
            "  * [>] 2024-01-01:   dated",
            "\t\t- [!] tabbed @due(2024-01-01)",
            "1.[ ] no gap after marker",
            "10.5 apples",
            "- [ ] ",
            "- [x]",
            "- [ ] trailing carriage return\r",
            "12-25: not a checkbox",
            "- [d] [due:: 2024-01-01] [[2024-02-02]]",
            "ünïcödé - [ ] text",
            "- [ ] 2024-1-1: not a date",
        ] {
            assert_eq!(line_to_string(&parse_line(line)), line, "round trip of {:?}", line);
        }
    }

    #[test]
    fn test_line_to_string_skips_empty_pieces() {
        let line = ParsedLine {
            indentation: "  ".into(),
            list_marker: "-".into(),
            marker_separator: " ".into(),
            checkbox: "[ ]".into(),
            checkbox_separator: " ".into(),
            date: "2023-12-25".into(),
            date_separator: " ".into(),
            remainder: "Todo item".into(),
        };
        assert_eq!(line_to_string(&line), "  - [ ] 2023-12-25: Todo item");

        let bare = ParsedLine {
            remainder: "Simple line".into(),
            ..ParsedLine::default()
        };
        assert_eq!(line_to_string(&bare), "Simple line");
    }

    #[test]
    fn test_set_and_clear_checkbox() {
        let mut line = parse_line("- Regular list item");
        line.set_checkbox(' ');
        assert_eq!(line_to_string(&line), "- [ ] Regular list item");
        line.clear_checkbox();
        assert_eq!(line_to_string(&line), "- Regular list item");

        let mut glued = parse_line("1.[x] no gap");
        glued.clear_checkbox();
        assert_eq!(line_to_string(&glued), "1. no gap");
    }

    #[test]
    fn test_indent_level() {
        assert_eq!(indent_level(""), 0);
        assert_eq!(indent_level("    "), 4);
        assert_eq!(indent_level("\t"), 4);
        assert_eq!(indent_level("\t  "), 6);
    }
}
