//! Schema node and document model.
//!
//! [`SchemaNode`] is a closed tagged union: a [`Reference`] to a named
//! component or an [`Inline`](SchemaNode::Inline) structural description.
//! [`Document`] carries the shared component catalog and the paths section.
//! Both round-trip OpenAPI-style JSON; unknown keys survive through the
//! flattened `extensions` maps, and all maps preserve insertion order so
//! output is deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of a component schema reference.
pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// The type kind of an inline schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

/// A structural description of a data shape: named or anonymous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    Reference(Reference),
    Inline(Box<InlineSchema>),
    /// Bare boolean schema (`additionalProperties: true`).
    Bool(bool),
}

impl SchemaNode {
    /// A reference to the named component.
    pub fn reference(name: &str) -> Self {
        SchemaNode::Reference(Reference::to_component(name))
    }

    /// The branch used to signal "this value may be null" inside a
    /// two-branch composition.
    pub fn null_marker() -> Self {
        SchemaNode::Inline(Box::new(InlineSchema {
            schema_type: Some(SchemaType::Null),
            ..InlineSchema::default()
        }))
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            SchemaNode::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_inline(&self) -> Option<&InlineSchema> {
        match self {
            SchemaNode::Inline(s) => Some(s),
            _ => None,
        }
    }

    /// True for a branch carrying no structural information, used solely
    /// to signal nullability.
    pub fn is_nullability_marker(&self) -> bool {
        match self {
            SchemaNode::Inline(s) => s.is_structurally_empty(),
            _ => false,
        }
    }

    /// For a two-branch `oneOf` where exactly one branch is a nullability
    /// marker, returns the other branch.
    pub fn nullable_inner(&self) -> Option<&SchemaNode> {
        let inline = self.as_inline()?;
        if inline.one_of.len() != 2 {
            return None;
        }
        match (
            inline.one_of[0].is_nullability_marker(),
            inline.one_of[1].is_nullability_marker(),
        ) {
            (true, false) => Some(&inline.one_of[1]),
            (false, true) => Some(&inline.one_of[0]),
            _ => None,
        }
    }
}

/// A reference to a named component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// The raw `$ref` target (e.g. `#/components/schemas/Todo`).
    #[serde(rename = "$ref")]
    pub target: String,
}

impl Reference {
    /// Build a reference to the named component.
    pub fn to_component(name: &str) -> Self {
        Self {
            target: format!("{COMPONENT_REF_PREFIX}{name}"),
        }
    }

    /// The component name, when the target points into the component
    /// catalog.
    pub fn component_name(&self) -> Option<&str> {
        self.target.strip_prefix(COMPONENT_REF_PREFIX)
    }
}

/// An anonymous schema node.
///
/// Every field is optional; unknown wire keys (including `x-` extensions)
/// land in `extensions`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineSchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,

    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Lower numeric bound, string-encoded to preserve precision.
    #[serde(with = "bound", skip_serializing_if = "Option::is_none")]
    pub minimum: Option<String>,

    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,

    /// Upper numeric bound, string-encoded to preserve precision.
    #[serde(with = "bound", skip_serializing_if = "Option::is_none")]
    pub maximum: Option<String>,

    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaNode>>,

    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,

    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,

    #[serde(rename = "anyOf", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<SchemaNode>>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl InlineSchema {
    /// An inline node with the given type and nothing else.
    pub fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// True when the node carries no structural information: no type (or
    /// only `null`), no constraints, no sub-structure, no extensions.
    pub fn is_structurally_empty(&self) -> bool {
        self.schema_type.map_or(true, |t| t == SchemaType::Null)
            && self.format.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.items.is_none()
            && self.properties.is_empty()
            && self.required.is_empty()
            && self.additional_properties.is_none()
            && self.one_of.is_empty()
            && self.all_of.is_empty()
            && self.any_of.is_empty()
            && self.not.is_none()
            && self.enum_values.is_empty()
            && self.description.is_none()
            && self.extensions.is_empty()
    }

    /// True for a dictionary shape: object with `additionalProperties`
    /// and no declared properties.
    pub fn is_dictionary(&self) -> bool {
        self.additional_properties.is_some() && self.properties.is_empty()
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Serialize string-encoded numeric bounds as raw JSON numbers.
mod bound {
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Number;

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(s) => {
                let number: Number = s
                    .parse()
                    .map_err(|_| S::Error::custom(format!("invalid numeric bound: {s}")))?;
                serializer.serialize_some(&number)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let number = Option::<Number>::deserialize(deserializer)?;
        Ok(number.map(|n| n.to_string()))
    }
}

/// The component catalog section of a document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, SchemaNode>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.extensions.is_empty()
    }
}

/// An API description document: shared components plus paths.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Non-structural top-level keys (`openapi`, `info`, `servers`, ...).
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a component schema by name.
    pub fn component(&self, name: &str) -> Option<&SchemaNode> {
        self.components.schemas.get(name)
    }
}

/// One path template: shared parameters plus per-method operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl PathItem {
    /// Iterate the operations present on this path, in method order.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// A single operation: parameters, optional request body, status-keyed
/// responses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub encoding: IndexMap<String, Encoding>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Multipart encoding entry; its headers carry schemas of their own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Encoding {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Header>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Header>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}
