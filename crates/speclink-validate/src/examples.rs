use std::sync::Arc;

use indexmap::IndexMap;
use speclink_model::{Example, Ref, Schema, Value};
use speclink_schema::SchemaError;

use crate::document::Checker;
use crate::location::Location;

impl Checker<'_> {
    /// Example values attached next to a schema: a single `example` and a
    /// named `examples` map, as on media types, parameters and headers.
    pub(crate) fn examples(
        &mut self,
        at: &Location,
        schema: Option<&Ref<Schema>>,
        example: Option<&Value>,
        examples: &IndexMap<String, Ref<Example>>,
    ) {
        for (name, cell) in examples {
            self.cell(&at.at("examples").at(name), cell);
        }
        if !self.config.examples {
            return;
        }
        let Some(schema) = schema.and_then(Ref::get) else {
            return;
        };
        if let Some(value) = example {
            self.instance(&at.at("example"), &schema, value, "example");
        }
        for (name, cell) in examples {
            let Some(example) = cell.get() else {
                continue;
            };
            if let Some(value) = &example.value {
                self.instance(&at.at("examples").at(name), &schema, value, "example");
            }
        }
    }

    /// A schema's own `example` and `default`.
    pub(crate) fn schema_values(&mut self, at: &Location, schema: &Arc<Schema>) {
        if self.config.examples {
            if let Some(value) = &schema.example {
                self.instance(&at.at("example"), schema, value, "example");
            }
        }
        if self.config.defaults {
            if let Some(value) = &schema.default_value {
                self.instance(&at.at("default"), schema, value, "default");
            }
        }
    }

    fn instance(&mut self, at: &Location, schema: &Schema, value: &Value, label: &str) {
        match self.schemas.validate(schema, value) {
            Ok(()) => {}
            Err(SchemaError::Invalid(violations)) => {
                for violation in violations {
                    self.issue(at, format!("{label} does not match its schema: {violation}"));
                }
            }
            Err(err) => self.issue(at, format!("{label} could not be validated: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use speclink_model::Document;

    use crate::{validate, validate_with, ValidateConfig};

    fn document(components: serde_json::Value) -> Document {
        Document::from_value(json!({
            "openapi": "3.0.3",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": components
        }))
        .unwrap()
    }

    #[test]
    fn schema_example_and_default_are_checked() {
        let doc = document(json!({"schemas": {
            "Age": {"type": "integer", "minimum": 0, "example": -1, "default": "ten"}
        }}));
        let errors = validate(&doc).unwrap_err();
        let example: Vec<_> = errors.at("components.schemas.Age.example").collect();
        assert_eq!(example.len(), 1);
        assert!(example[0].message.contains("(minimum)"));
        let default: Vec<_> = errors.at("components.schemas.Age.default").collect();
        assert_eq!(default.len(), 1);
        assert!(default[0].message.contains("(type)"));
    }

    #[test]
    fn example_checks_can_be_switched_off() {
        let doc = document(json!({"schemas": {
            "Age": {"type": "integer", "example": "old", "default": "ten"}
        }}));
        let config = ValidateConfig {
            examples: false,
            defaults: false,
            ..ValidateConfig::default()
        };
        assert!(validate_with(&doc, &config).is_ok());
    }

    #[test]
    fn parameter_examples_map_is_checked() {
        let doc = document(json!({"parameters": {
            "Limit": {
                "name": "limit",
                "in": "query",
                "schema": {"type": "integer", "maximum": 100},
                "examples": {"small": {"value": 10}, "huge": {"value": 1000}}
            }
        }}));
        let errors = validate(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        let issue = errors.iter().next().unwrap();
        assert_eq!(issue.location, "components.parameters.Limit.examples.huge");
        assert!(issue.message.contains("(maximum)"));
    }
}
