use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use regex::Regex;
use serde_json::{Map, Value};
use speclink_model::{AdditionalProperties, Ref, Schema, SchemaType};
use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{Result, SchemaError, Violation, Violations};
use crate::format::{self, Check};
use crate::path::InstancePath;

/// Tolerance for `multipleOf` on floating-point instances.
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

/// Validates instances against resolved schema objects.
///
/// Every applicable keyword is evaluated and every failure collected.
/// Compiled `pattern` expressions are cached for the validator's lifetime.
#[derive(Debug, Default)]
pub struct SchemaValidator {
    config: SchemaConfig,
    patterns: Mutex<HashMap<String, Regex>>,
}

impl SchemaValidator {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            patterns: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Validate `instance` against `schema`.
    pub fn validate(&self, schema: &Schema, instance: &Value) -> Result<()> {
        let mut eval = Eval::new(self, InstancePath::root());
        eval.schema(schema, instance, 0)?;
        if eval.violations.is_empty() {
            return Ok(());
        }
        debug!(violations = eval.violations.len(), "instance failed schema");
        Err(SchemaError::Invalid(Violations(eval.violations)))
    }

    /// Validate against the schema a cell is bound to.
    pub fn validate_ref(&self, schema: &Ref<Schema>, instance: &Value) -> Result<()> {
        let schema = resolved(schema, &InstancePath::root())?;
        self.validate(&schema, instance)
    }

    /// Whether `pattern` compiles.
    pub fn check_pattern(&self, pattern: &str) -> Result<()> {
        self.regex(pattern).map(|_| ())
    }

    fn regex(&self, pattern: &str) -> Result<Regex> {
        let mut patterns = self.patterns.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = patterns.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern).map_err(|source| SchemaError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        patterns.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

fn resolved(cell: &Ref<Schema>, path: &InstancePath) -> Result<Arc<Schema>> {
    cell.get().ok_or_else(|| SchemaError::Unresolved {
        reference: cell.reference().unwrap_or_default().to_string(),
        path: path.to_string(),
    })
}

struct Eval<'v> {
    validator: &'v SchemaValidator,
    path: InstancePath,
    violations: Vec<Violation>,
}

impl<'v> Eval<'v> {
    fn new(validator: &'v SchemaValidator, path: InstancePath) -> Self {
        Self {
            validator,
            path,
            violations: Vec::new(),
        }
    }

    fn fail(&mut self, keyword: &'static str, message: String) {
        self.violations.push(Violation {
            path: self.path.to_string(),
            keyword,
            message,
        });
    }

    fn schema(&mut self, schema: &Schema, instance: &Value, depth: usize) -> Result<()> {
        let max_depth = self.validator.config.max_depth;
        if depth > max_depth {
            return Err(SchemaError::TooDeep {
                path: self.path.to_string(),
                max_depth,
            });
        }
        if instance.is_null() && schema.is_nullable() {
            return Ok(());
        }

        self.types(schema, instance);
        self.enumeration(schema, instance);
        match instance {
            Value::Number(_) => self.number(schema, instance),
            Value::String(text) => self.string(schema, text)?,
            Value::Array(items) => self.array(schema, items, depth)?,
            Value::Object(map) => self.object(schema, map, depth)?,
            _ => {}
        }
        if self.validator.config.formats {
            if let Some(name) = &schema.format {
                self.format(name, instance)?;
            }
        }
        self.composition(schema, instance, depth)
    }

    /// Validate `instance` against a subschema, optionally one level deeper in the instance.
    ///
    /// `depth` counts schemas applied at the current instance location; it
    /// starts over whenever the instance path grows.
    fn child(
        &mut self,
        cell: &Ref<Schema>,
        token: Option<String>,
        instance: &Value,
        depth: usize,
    ) -> Result<()> {
        let pushed = token.is_some();
        if let Some(token) = token {
            self.path.push(token);
        }
        let depth = if pushed { 0 } else { depth + 1 };
        let result =
            resolved(cell, &self.path).and_then(|schema| self.schema(&schema, instance, depth));
        if pushed {
            self.path.pop();
        }
        result
    }

    /// Whether `instance` satisfies a subschema, without recording its failures.
    fn passes(&self, cell: &Ref<Schema>, instance: &Value, depth: usize) -> Result<bool> {
        let schema = resolved(cell, &self.path)?;
        let mut scratch = Eval::new(self.validator, self.path.clone());
        scratch.schema(&schema, instance, depth + 1)?;
        Ok(scratch.violations.is_empty())
    }

    fn types(&mut self, schema: &Schema, instance: &Value) {
        let Some(types) = &schema.schema_type else {
            return;
        };
        if types
            .as_slice()
            .iter()
            .any(|schema_type| conforms(*schema_type, instance))
        {
            return;
        }
        let expected: Vec<&str> = types.as_slice().iter().map(|t| t.as_str()).collect();
        self.fail(
            "type",
            format!(
                "expected {}, found {}",
                expected.join(" or "),
                kind_name(instance)
            ),
        );
    }

    fn enumeration(&mut self, schema: &Schema, instance: &Value) {
        let Some(values) = &schema.enum_values else {
            return;
        };
        if !values.iter().any(|candidate| equal(candidate, instance)) {
            self.fail("enum", format!("{instance} is not one of the allowed values"));
        }
    }

    fn number(&mut self, schema: &Schema, instance: &Value) {
        let Some(n) = instance.as_f64() else {
            return;
        };
        if let Some(minimum) = schema.minimum {
            if schema.exclusive_minimum == Some(true) {
                if n <= minimum {
                    self.fail(
                        "exclusiveMinimum",
                        format!("{instance} is not greater than {minimum}"),
                    );
                }
            } else if n < minimum {
                self.fail("minimum", format!("{instance} is less than the minimum {minimum}"));
            }
        }
        if let Some(maximum) = schema.maximum {
            if schema.exclusive_maximum == Some(true) {
                if n >= maximum {
                    self.fail(
                        "exclusiveMaximum",
                        format!("{instance} is not less than {maximum}"),
                    );
                }
            } else if n > maximum {
                self.fail(
                    "maximum",
                    format!("{instance} is greater than the maximum {maximum}"),
                );
            }
        }
        if let Some(divisor) = schema.multiple_of {
            if divisor > 0.0 {
                let quotient = n / divisor;
                if (quotient - quotient.round()).abs() > MULTIPLE_OF_EPSILON {
                    self.fail(
                        "multipleOf",
                        format!("{instance} is not a multiple of {divisor}"),
                    );
                }
            }
        }
    }

    fn string(&mut self, schema: &Schema, text: &str) -> Result<()> {
        let length = text.chars().count() as u64;
        if let Some(min) = schema.min_length {
            if length < min {
                self.fail(
                    "minLength",
                    format!("string has {length} characters, fewer than the minimum {min}"),
                );
            }
        }
        if let Some(max) = schema.max_length {
            if length > max {
                self.fail(
                    "maxLength",
                    format!("string has {length} characters, more than the maximum {max}"),
                );
            }
        }
        if let Some(pattern) = &schema.pattern {
            if !self.validator.regex(pattern)?.is_match(text) {
                self.fail(
                    "pattern",
                    format!("{text:?} does not match pattern {pattern:?}"),
                );
            }
        }
        Ok(())
    }

    fn array(&mut self, schema: &Schema, items: &[Value], depth: usize) -> Result<()> {
        if let Some(cell) = &schema.items {
            for (index, item) in items.iter().enumerate() {
                self.child(cell, Some(index.to_string()), item, depth)?;
            }
        }
        let count = items.len() as u64;
        if let Some(min) = schema.min_items {
            if count < min {
                self.fail(
                    "minItems",
                    format!("array has {count} items, fewer than the minimum {min}"),
                );
            }
        }
        if let Some(max) = schema.max_items {
            if count > max {
                self.fail(
                    "maxItems",
                    format!("array has {count} items, more than the maximum {max}"),
                );
            }
        }
        if schema.unique_items == Some(true) {
            if let Some((first, second)) = duplicate(items) {
                self.fail(
                    "uniqueItems",
                    format!("items {first} and {second} are equal"),
                );
            }
        }
        Ok(())
    }

    fn object(&mut self, schema: &Schema, map: &Map<String, Value>, depth: usize) -> Result<()> {
        for name in &schema.required {
            if !map.contains_key(name) {
                self.fail("required", format!("missing required property {name:?}"));
            }
        }
        for (name, value) in map {
            if let Some(cell) = schema.properties.get(name) {
                self.child(cell, Some(name.clone()), value, depth)?;
                continue;
            }
            match &schema.additional_properties {
                Some(AdditionalProperties::Schema(cell)) => {
                    self.child(cell, Some(name.clone()), value, depth)?;
                }
                Some(AdditionalProperties::Allowed(false)) => {
                    self.fail(
                        "additionalProperties",
                        format!("property {name:?} is not allowed"),
                    );
                }
                _ => {}
            }
        }
        let count = map.len() as u64;
        if let Some(min) = schema.min_properties {
            if count < min {
                self.fail(
                    "minProperties",
                    format!("object has {count} properties, fewer than the minimum {min}"),
                );
            }
        }
        if let Some(max) = schema.max_properties {
            if count > max {
                self.fail(
                    "maxProperties",
                    format!("object has {count} properties, more than the maximum {max}"),
                );
            }
        }
        Ok(())
    }

    fn format(&mut self, name: &str, instance: &Value) -> Result<()> {
        match format::check(name, instance) {
            Check::Unknown | Check::Done(None) => {}
            Check::Done(Some(message)) => self.fail("format", message),
            Check::Pattern(pattern) => {
                if let Value::String(text) = instance {
                    if !self.validator.regex(pattern)?.is_match(text) {
                        self.fail("format", format!("{text:?} is not a valid {name}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn composition(&mut self, schema: &Schema, instance: &Value, depth: usize) -> Result<()> {
        for cell in &schema.all_of {
            self.child(cell, None, instance, depth)?;
        }

        if !schema.any_of.is_empty() {
            let mut matched = false;
            for cell in &schema.any_of {
                if self.passes(cell, instance, depth)? {
                    matched = true;
                    break;
                }
            }
            if !matched {
                self.fail(
                    "anyOf",
                    format!(
                        "value matches none of the {} anyOf schemas",
                        schema.any_of.len()
                    ),
                );
            }
        }

        if !schema.one_of.is_empty() {
            self.one_of(schema, instance, depth)?;
        }

        if let Some(cell) = &schema.not {
            if self.passes(cell, instance, depth)? {
                self.fail("not", "value matches the schema it must not match".to_string());
            }
        }
        Ok(())
    }

    fn one_of(&mut self, schema: &Schema, instance: &Value, depth: usize) -> Result<()> {
        match discriminated(schema, instance) {
            Some(Ok(cell)) => return self.child(cell, None, instance, depth),
            Some(Err(message)) => {
                self.fail("discriminator", message);
                return Ok(());
            }
            None => {}
        }

        let mut matched = 0;
        for cell in &schema.one_of {
            if self.passes(cell, instance, depth)? {
                matched += 1;
            }
        }
        if matched != 1 {
            self.fail(
                "oneOf",
                format!(
                    "value matches {matched} of the {} oneOf schemas, expected exactly one",
                    schema.one_of.len()
                ),
            );
        }
        Ok(())
    }
}

/// The `oneOf` branch a discriminator selects, when the instance names one.
///
/// Branches are matched by their `$ref`; with only inline branches there is
/// nothing to select and `oneOf` counts matches instead.
fn discriminated<'s>(
    schema: &'s Schema,
    instance: &Value,
) -> Option<std::result::Result<&'s Ref<Schema>, String>> {
    let discriminator = schema.discriminator.as_ref()?;
    if !schema.one_of.iter().any(Ref::is_reference) {
        return None;
    }
    let value = instance
        .get(discriminator.property_name.as_str())?
        .as_str()?;
    let mapped = discriminator.mapping.get(value).map(String::as_str);
    let target = mapped.unwrap_or(value);
    let branch = schema.one_of.iter().find(|cell| {
        cell.reference().is_some_and(|reference| {
            reference == target || reference.rsplit('/').next() == Some(target)
        })
    });
    Some(branch.ok_or_else(|| {
        format!(
            "discriminator {:?} value {value:?} selects none of the oneOf schemas",
            discriminator.property_name
        )
    }))
}

fn conforms(schema_type: SchemaType, instance: &Value) -> bool {
    match schema_type {
        SchemaType::String => instance.is_string(),
        SchemaType::Number => instance.is_number(),
        SchemaType::Integer => is_integer(instance),
        SchemaType::Boolean => instance.is_boolean(),
        SchemaType::Array => instance.is_array(),
        SchemaType::Object => instance.is_object(),
        SchemaType::Null => instance.is_null(),
    }
}

fn is_integer(instance: &Value) -> bool {
    instance.is_i64()
        || instance.is_u64()
        || instance
            .as_f64()
            .is_some_and(|n| n.is_finite() && n.fract() == 0.0)
}

fn kind_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) if is_integer(instance) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deep equality that compares numbers by value, so `1` equals `1.0`.
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            x.as_f64() == y.as_f64()
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, x)| y.get(key).is_some_and(|y| equal(x, y)))
        }
        _ => a == b,
    }
}

fn duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (first, a) in items.iter().enumerate() {
        for (offset, b) in items[first + 1..].iter().enumerate() {
            if equal(a, b) {
                return Some((first, first + 1 + offset));
            }
        }
    }
    None
}
