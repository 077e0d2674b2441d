//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` configuration against a [`Schema`] before
//! any API call is made. Validation failures carry the attribute path so the
//! host can point at the offending line in configuration.

use crate::schema::{Attribute, Block, Diagnostic, Kind, NestedBlock, Nesting, Schema, Severity};
use serde_json::Value;
use std::collections::HashMap;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (the provider sets these)
/// - Attribute types must match the schema
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON value against a schema, returning `Err` with the
/// diagnostics when invalid.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        // Null is valid for optional blocks, nothing further to check
        Value::Null => return,
        _ => {
            diagnostics.push(
                Diagnostic::error("expected object")
                    .with_detail(format!("got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        }
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested(nested, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // The provider owns computed-only attributes; whatever is in state is
    // not the practitioner's input.
    if !attr.usage.accepts_input() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.usage.is_required() {
                diagnostics.push(
                    Diagnostic::error(format!("missing required attribute '{}'", path))
                        .with_detail("this attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => {
            validate_kind(&attr.kind, v, path, diagnostics);
        }
    }
}

fn validate_kind(kind: &Kind, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    match kind {
        Kind::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        }
        Kind::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        }
        Kind::Float64 => {
            if !value.is_number() {
                diagnostics.push(type_error(path, "float64", value));
            }
        }
        Kind::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        }
        // Sets are carried as JSON arrays, same as lists
        Kind::List(element) | Kind::Set(element) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_kind(element, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        }
        Kind::Map(value_kind) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_kind(value_kind, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        }
        Kind::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        }
    }
}

fn validate_object(
    attrs: &HashMap<String, Kind>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Object attributes within a type carry no usage flags, so presence
    // is not enforced, only types.
    for (name, kind) in attrs {
        let attr_path = join_path(path, name);
        if let Some(value) = obj.get(name) {
            validate_kind(kind, value, &attr_path, diagnostics);
        }
    }
}

fn validate_nested(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting {
        Nesting::Single => validate_single(nested, value, path, diagnostics),
        Nesting::List | Nesting::Set => validate_many(nested, value, path, diagnostics),
    }
}

fn validate_single(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!("missing required block '{}'", path))
                        .with_detail("at least one block is required")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => {
            validate_block(&nested.block, v, path, diagnostics);
        }
    }
}

fn validate_many(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        }
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // max_items of 0 means unlimited
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        }
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("expected list for block '{}'", path))
                    .with_detail(format!("got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        }
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if n.as_i64().is_some() {
                true
            } else if let Some(f) = n.as_f64() {
                // A float that is actually a whole number is accepted
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        }
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        summary: format!("invalid type for attribute '{}'", path),
        detail: Some(format!("expected {}, got {}", expected, value_type_name(got))),
        attribute: Some(path.to_string()),
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().attr("name", Attribute::required(Kind::String));

        assert!(validate(&schema, &json!({"name": "web-1"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));

        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().attr("cores", Attribute::optional(Kind::Int64));

        assert!(validate(&schema, &json!({"cores": 4})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"cores": null})).is_empty());

        let diagnostics = validate(&schema, &json!({"cores": "four"}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().attr("id", Attribute::computed(Kind::String));

        assert!(validate(&schema, &json!({})).is_empty());
        // Whatever the provider stored is not validated as input
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().attr("ram", Attribute::required(Kind::Int64));

        assert!(validate(&schema, &json!({"ram": 2048})).is_empty());
        assert!(validate(&schema, &json!({"ram": 2048.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"ram": 2048.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"ram": "2048"})).len(), 1);
    }

    #[test]
    fn test_validate_list() {
        let schema = Schema::v0().attr(
            "ips",
            Attribute::required(Kind::list(Kind::String)),
        );

        assert!(validate(&schema, &json!({"ips": ["1.2.3.4", "5.6.7.8"]})).is_empty());
        assert!(validate(&schema, &json!({"ips": []})).is_empty());

        let diagnostics = validate(&schema, &json!({"ips": ["1.2.3.4", 5]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("ips.1"));

        assert_eq!(validate(&schema, &json!({"ips": "1.2.3.4"})).len(), 1);
    }

    #[test]
    fn test_validate_map() {
        let schema = Schema::v0().attr(
            "labels",
            Attribute::optional(Kind::map(Kind::String)),
        );

        assert!(validate(&schema, &json!({"labels": {"env": "prod"}})).is_empty());

        let diagnostics = validate(&schema, &json!({"labels": {"env": "prod", "count": 2}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("labels.count"));
    }

    #[test]
    fn test_validate_nested_block_single() {
        let schema = Schema::v0().nested(
            "endpoint",
            NestedBlock::single(
                Block::new()
                    .attr("host", Attribute::required(Kind::String))
                    .attr("port", Attribute::optional(Kind::Int64)),
            ),
        );

        assert!(validate(&schema, &json!({"endpoint": {"host": "1.2.3.4", "port": 51820}}))
            .is_empty());
        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"endpoint": {"port": 51820}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("endpoint.host"));
    }

    #[test]
    fn test_validate_nested_block_list() {
        let schema = Schema::v0().nested(
            "nic",
            NestedBlock::list(Block::new().attr("lan", Attribute::required(Kind::Int64)))
                .at_least(1)
                .at_most(3),
        );

        assert!(validate(&schema, &json!({"nic": [{"lan": 1}, {"lan": 2}]})).is_empty());

        let diagnostics = validate(&schema, &json!({"nic": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"nic": [{"lan": 1}, {"lan": 2}, {"lan": 3}, {"lan": 4}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 3"));

        let diagnostics = validate(&schema, &json!({"nic": [{"lan": "one"}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("nic.0.lan"));
    }

    #[test]
    fn test_validate_deeply_nested() {
        let schema = Schema::v0().nested(
            "nic",
            NestedBlock::list(
                Block::new()
                    .attr("lan", Attribute::required(Kind::Int64))
                    .nested(
                        "firewall",
                        NestedBlock::list(
                            Block::new().attr("protocol", Attribute::required(Kind::String)),
                        ),
                    ),
            ),
        );

        assert!(validate(
            &schema,
            &json!({"nic": [{"lan": 1, "firewall": [{"protocol": "TCP"}]}]}),
        )
        .is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"nic": [{"lan": 1, "firewall": [{"protocol": 6}]}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute.as_deref(),
            Some("nic.0.firewall.0.protocol")
        );
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = Schema::v0()
            .attr("name", Attribute::required(Kind::String))
            .attr("cores", Attribute::required(Kind::Int64))
            .attr("public", Attribute::required(Kind::Bool));

        let diagnostics = validate(
            &schema,
            &json!({"name": 1, "cores": "two", "public": "yes"}),
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_validate_object_type() {
        let mut fields = HashMap::new();
        fields.insert("host".to_string(), Kind::String);
        fields.insert("port".to_string(), Kind::Int64);

        let schema = Schema::v0().attr("endpoint", Attribute::optional(Kind::Object(fields)));

        assert!(validate(&schema, &json!({"endpoint": {"host": "1.2.3.4", "port": 51820}}))
            .is_empty());

        let diagnostics = validate(&schema, &json!({"endpoint": {"port": "51820"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("endpoint.port"));
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().attr("name", Attribute::required(Kind::String));

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("expected object"));
    }

    #[test]
    fn test_validate_result_helper() {
        let schema = Schema::v0().attr("name", Attribute::required(Kind::String));

        assert!(validate_result(&schema, &json!({"name": "web-1"})).is_ok());
        assert!(is_valid(&schema, &json!({"name": "web-1"})));
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }
}
