/// Line buffer for generated code.
#[derive(Debug, Default)]
pub struct Output {
    lines: Vec<String>,
    current_line: String,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add text to the current line
    pub fn push(&mut self, text: &str) {
        self.current_line.push_str(text);
    }

    /// End the current line
    pub fn newline(&mut self) {
        self.current_line.push('\n');
        self.lines.push(std::mem::take(&mut self.current_line));
    }

    /// Add `text` as one or more complete lines
    pub fn line(&mut self, text: &str) {
        self.push(text);
        self.newline();
    }

    /// Number of completed lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Finish and return the generated code
    pub fn finish(mut self) -> String {
        if !self.current_line.is_empty() {
            self.lines.push(std::mem::take(&mut self.current_line));
        }
        self.lines.concat()
    }
}
