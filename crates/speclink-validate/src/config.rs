use speclink_schema::SchemaConfig;

/// Controls document validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateConfig {
    /// Validate `example` and `examples` values against their schemas.
    pub examples: bool,
    /// Validate schema `default` values against their schemas.
    pub defaults: bool,
    /// Check path-template placeholders against declared path parameters.
    pub path_parameters: bool,
    /// Settings for the schema validator used on examples and defaults.
    pub schema: SchemaConfig,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            examples: true,
            defaults: true,
            path_parameters: true,
            schema: SchemaConfig::default(),
        }
    }
}
