//! Schema types describing the provider, resource, and data source surface.
//!
//! Every resource and data source declares its attribute schema with these
//! types. The schema drives configuration validation, plan computation, and
//! the schema the host retrieves over the plugin protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A 64-bit floating point number.
    Float64,
    /// A boolean value.
    Bool,
    /// A list of values of a single type.
    List(Box<Kind>),
    /// A set of unique values of a single type.
    Set(Box<Kind>),
    /// A map from string keys to values of a single type.
    Map(Box<Kind>),
    /// An object with a fixed set of attributes.
    Object(HashMap<String, Kind>),
}

impl Kind {
    /// Create a list type.
    pub fn list(element: Kind) -> Self {
        Self::List(Box::new(element))
    }

    /// Create a set type.
    pub fn set(element: Kind) -> Self {
        Self::Set(Box::new(element))
    }

    /// Create a map type.
    pub fn map(value: Kind) -> Self {
        Self::Map(Box::new(value))
    }
}

/// How an attribute participates in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    /// Must be set by the practitioner.
    Required,
    /// May be set by the practitioner.
    Optional,
    /// Set by the provider only (read-only).
    Computed,
    /// May be set by the practitioner, computed by the provider otherwise.
    OptionalComputed,
}

impl Usage {
    /// Whether the attribute must be present in configuration.
    pub fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }

    /// Whether the provider fills this attribute in.
    pub fn is_computed(self) -> bool {
        matches!(self, Self::Computed | Self::OptionalComputed)
    }

    /// Whether the practitioner is allowed to set this attribute.
    pub fn accepts_input(self) -> bool {
        !matches!(self, Self::Computed)
    }
}

/// Describes a single attribute in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// The type of the attribute.
    pub kind: Kind,
    /// How the attribute participates in configuration.
    pub usage: Usage,
    /// The attribute is hidden in logs and UI output.
    #[serde(default)]
    pub sensitive: bool,
    /// Changing this attribute forces resource replacement.
    #[serde(default)]
    pub force_new: bool,
    /// Human-readable description of the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default value applied during planning when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl Attribute {
    fn new(kind: Kind, usage: Usage) -> Self {
        Self {
            kind,
            usage,
            sensitive: false,
            force_new: false,
            description: None,
            default: None,
        }
    }

    /// Create a required attribute.
    pub fn required(kind: Kind) -> Self {
        Self::new(kind, Usage::Required)
    }

    /// Create an optional attribute.
    pub fn optional(kind: Kind) -> Self {
        Self::new(kind, Usage::Optional)
    }

    /// Create a computed attribute (read-only, set by the provider).
    pub fn computed(kind: Kind) -> Self {
        Self::new(kind, Usage::Computed)
    }

    /// Create an optional attribute that the provider computes when unset.
    pub fn optional_computed(kind: Kind) -> Self {
        Self::new(kind, Usage::OptionalComputed)
    }

    /// Mark this attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Mark this attribute as forcing replacement when changed.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Set the description for this attribute.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default value applied during planning.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// The nesting mode for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    /// A single nested block (at most one).
    #[default]
    Single,
    /// A list of nested blocks (zero or more, ordered).
    List,
    /// A set of nested blocks (zero or more, unordered, unique).
    Set,
}

/// A group of attributes and nested blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The attributes within this block.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Attribute>,
    /// Nested blocks within this block.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub blocks: HashMap<String, NestedBlock>,
    /// Human-readable description of the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Block {
    /// Create a new empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute to this block.
    pub fn attr(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Add a nested block to this block.
    pub fn nested(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Set the description for this block.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A nested block with its nesting mode and item constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    /// The block definition.
    #[serde(flatten)]
    pub block: Block,
    /// How the block is nested.
    #[serde(default)]
    pub nesting: Nesting,
    /// Minimum number of blocks required.
    #[serde(default)]
    pub min_items: u32,
    /// Maximum number of blocks allowed (0 = unlimited).
    #[serde(default)]
    pub max_items: u32,
    /// Changing this block forces resource replacement.
    #[serde(default)]
    pub force_new: bool,
}

impl NestedBlock {
    /// Create a single nested block (0 or 1 allowed).
    pub fn single(block: Block) -> Self {
        Self {
            block,
            nesting: Nesting::Single,
            min_items: 0,
            max_items: 1,
            force_new: false,
        }
    }

    /// Create a list of nested blocks.
    pub fn list(block: Block) -> Self {
        Self {
            block,
            nesting: Nesting::List,
            min_items: 0,
            max_items: 0,
            force_new: false,
        }
    }

    /// Create a set of nested blocks.
    pub fn set(block: Block) -> Self {
        Self {
            block,
            nesting: Nesting::Set,
            min_items: 0,
            max_items: 0,
            force_new: false,
        }
    }

    /// Require at least `min` blocks.
    pub fn at_least(mut self, min: u32) -> Self {
        self.min_items = min;
        self
    }

    /// Allow at most `max` blocks.
    pub fn at_most(mut self, max: u32) -> Self {
        self.max_items = max;
        self
    }

    /// Mark this block as forcing replacement when changed.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}

/// Schema for a resource or data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// The version of this schema (for state upgrades).
    #[serde(default)]
    pub version: u64,
    /// The root block containing all attributes and nested blocks.
    #[serde(flatten)]
    pub block: Block,
}

impl Schema {
    /// Create a schema at version 0.
    pub fn v0() -> Self {
        Self::default()
    }

    /// Create a schema at the given version.
    pub fn versioned(version: u64) -> Self {
        Self {
            version,
            block: Block::new(),
        }
    }

    /// Add an attribute to the schema.
    pub fn attr(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attribute);
        self
    }

    /// Add a nested block to the schema.
    pub fn nested(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block.blocks.insert(name.into(), block);
        self
    }
}

/// The full schema of the provider: its own configuration plus every
/// registered resource and data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Schema for provider configuration.
    #[serde(default)]
    pub provider: Schema,
    /// Schemas for each resource type.
    #[serde(default)]
    pub resources: HashMap<String, Schema>,
    /// Schemas for each data source type.
    #[serde(default)]
    pub data_sources: HashMap<String, Schema>,
}

impl ProviderSchema {
    /// Create a new empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    /// Add a resource schema.
    pub fn resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Add a data source schema.
    pub fn data_source(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_constructors() {
        assert!(matches!(Kind::list(Kind::String), Kind::List(_)));
        assert!(matches!(Kind::set(Kind::Int64), Kind::Set(_)));
        assert!(matches!(Kind::map(Kind::Bool), Kind::Map(_)));
    }

    #[test]
    fn test_usage_flags() {
        assert!(Usage::Required.is_required());
        assert!(!Usage::Required.is_computed());
        assert!(Usage::Required.accepts_input());

        assert!(Usage::Computed.is_computed());
        assert!(!Usage::Computed.accepts_input());

        assert!(Usage::OptionalComputed.is_computed());
        assert!(Usage::OptionalComputed.accepts_input());
    }

    #[test]
    fn test_attribute_builders() {
        let attr = Attribute::required(Kind::String)
            .describe("the server name")
            .force_new();

        assert_eq!(attr.kind, Kind::String);
        assert_eq!(attr.usage, Usage::Required);
        assert!(attr.force_new);
        assert_eq!(attr.description.as_deref(), Some("the server name"));

        let attr = Attribute::optional(Kind::Int64).with_default(serde_json::json!(3600));
        assert_eq!(attr.default, Some(serde_json::json!(3600)));

        let attr = Attribute::required(Kind::String).sensitive();
        assert!(attr.sensitive);
    }

    #[test]
    fn test_schema_builder() {
        let schema = Schema::v0()
            .attr("name", Attribute::required(Kind::String))
            .attr("id", Attribute::computed(Kind::String))
            .nested(
                "nic",
                NestedBlock::list(Block::new().attr("lan", Attribute::required(Kind::Int64))),
            );

        assert_eq!(schema.version, 0);
        assert!(schema.block.attributes.contains_key("name"));
        assert!(schema.block.attributes.contains_key("id"));
        assert!(schema.block.blocks.contains_key("nic"));
    }

    #[test]
    fn test_provider_schema() {
        let schema = ProviderSchema::new()
            .provider_config(
                Schema::v0().attr("token", Attribute::optional(Kind::String).sensitive()),
            )
            .resource(
                "ionoscloud_server",
                Schema::v0().attr("name", Attribute::required(Kind::String)),
            )
            .data_source(
                "ionoscloud_server",
                Schema::v0().attr("name", Attribute::optional(Kind::String)),
            );

        assert!(schema.provider.block.attributes.contains_key("token"));
        assert!(schema.resources.contains_key("ionoscloud_server"));
        assert!(schema.data_sources.contains_key("ionoscloud_server"));
    }

    #[test]
    fn test_nested_block_modes() {
        let single = NestedBlock::single(Block::new());
        assert_eq!(single.nesting, Nesting::Single);
        assert_eq!(single.max_items, 1);

        let list = NestedBlock::list(Block::new()).at_least(1).at_most(8);
        assert_eq!(list.nesting, Nesting::List);
        assert_eq!(list.min_items, 1);
        assert_eq!(list.max_items, 8);
    }

    #[test]
    fn test_diagnostic() {
        let err = Diagnostic::error("invalid configuration")
            .with_detail("cores must be positive")
            .with_attribute("cores");

        assert_eq!(err.severity, Severity::Error);
        assert_eq!(err.summary, "invalid configuration");
        assert_eq!(err.detail.as_deref(), Some("cores must be positive"));
        assert_eq!(err.attribute.as_deref(), Some("cores"));
    }
}
