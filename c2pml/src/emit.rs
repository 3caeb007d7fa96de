// emit.rs - Indented Promela text buffer
//
// Every component writes through an `OutputBuffer`. Lines carry a nesting
// level; the indentation width is only applied when the buffer is rendered.

use std::fmt::Write as _;

/// A single generated line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub indent: usize,
    pub text: String,
}

/// Append-only sequence of generated lines
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    lines: Vec<Line>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, indent: usize, text: impl Into<String>) {
        self.lines.push(Line {
            indent,
            text: text.into(),
        });
    }

    pub fn blank(&mut self) {
        self.emit(0, "");
    }

    /// Emit a `/* ... */` comment. A `*/` inside the text would end the
    /// comment early, so it is defused.
    pub fn comment(&mut self, indent: usize, text: &str) {
        let text = text.replace("*/", "* /");
        self.emit(indent, format!("/* {} */", text));
    }

    /// Marker for a construct that has no model counterpart
    pub fn unsupported(&mut self, indent: usize, what: &str) {
        self.comment(indent, &format!("unsupported: {}", what));
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether anything other than comments was emitted after `mark`
    /// (a previous [`OutputBuffer::len`])
    pub fn emitted_code_since(&self, mark: usize) -> bool {
        self.lines[mark.min(self.lines.len())..]
            .iter()
            .any(|line| !line.text.is_empty() && !line.text.starts_with("/*"))
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Flatten into text, `indent_width` spaces per nesting level
    pub fn render(&self, indent_width: usize) -> String {
        let mut text = String::new();
        for line in &self.lines {
            if !line.text.is_empty() {
                let _ = write!(
                    text,
                    "{:width$}{}",
                    "",
                    line.text,
                    width = line.indent * indent_width
                );
            }
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_indentation() {
        let mut out = OutputBuffer::new();
        out.emit(0, "do");
        out.emit(0, ":: (i < 3) ->");
        out.emit(1, "i = i + 1;");
        out.blank();
        assert_eq!(out.render(4), "do\n:: (i < 3) ->\n    i = i + 1;\n\n");
        assert_eq!(out.render(2), "do\n:: (i < 3) ->\n  i = i + 1;\n\n");
    }

    #[test]
    fn test_comment_cannot_close_early() {
        let mut out = OutputBuffer::new();
        out.unsupported(1, "a */ b");
        assert_eq!(out.lines()[0].text, "/* unsupported: a * / b */");
        assert_eq!(out.lines()[0].indent, 1);
    }

    #[test]
    fn test_emitted_code_ignores_comments() {
        let mut out = OutputBuffer::new();
        out.emit(0, "if");
        let mark = out.len();
        out.unsupported(1, "goto");
        assert!(!out.emitted_code_since(mark));
        out.emit(1, "skip;");
        assert!(out.emitted_code_since(mark));
    }
}
