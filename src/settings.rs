/// Options controlling how decoded resources are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    /// Pretty-print JSON output.
    indent: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings { indent: true }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    /// Sets whether the JSON output should be indented.
    pub fn indent(mut self, pretty: bool) -> Self {
        self.indent = pretty;
        self
    }

    pub fn should_indent(&self) -> bool {
        self.indent
    }
}
