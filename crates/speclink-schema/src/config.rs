/// Controls instance validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaConfig {
    /// When true, known `format` values are asserted; unknown formats always pass.
    pub formats: bool,
    /// Maximum nesting of `allOf`/`anyOf`/`oneOf`/`not` applications at one
    /// instance location before validation aborts. Descending into array
    /// items or object properties does not count.
    pub max_depth: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            formats: true,
            max_depth: 256,
        }
    }
}
