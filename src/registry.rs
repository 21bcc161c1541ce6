//! Type descriptors, enum metadata, and rule sources.
//!
//! The engine never reflects over application types at runtime. Instead,
//! callers register an explicit descriptor per declared type and any number
//! of [`RuleSource`] providers; the aggregator queries the providers in
//! registration order. [`StaticRuleSource`] is the explicit-builder style
//! of declaration; attribute-style and fluent-style frontends implement the
//! same trait.

use std::any::TypeId;

use indexmap::IndexMap;

use crate::error::SourceError;
use crate::ops::RuleOperation;
use crate::rules::{PropertyPath, ValidationRule};

/// Shape of a single declared property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyShape {
    /// A primitive leaf (string, number, bool, ...).
    Scalar,
    /// A nested object of a registered type.
    Nested(TypeId),
    /// A collection whose elements have the given shape.
    Collection(Box<PropertyShape>),
}

/// One property of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub shape: PropertyShape,
}

impl PropertyDescriptor {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: PropertyShape::Scalar,
        }
    }

    pub fn nested<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: PropertyShape::Nested(TypeId::of::<T>()),
        }
    }

    /// A collection of nested objects of type `T`.
    pub fn collection_of<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: PropertyShape::Collection(Box::new(PropertyShape::Nested(TypeId::of::<T>()))),
        }
    }

    pub fn collection_of_scalars(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: PropertyShape::Collection(Box::new(PropertyShape::Scalar)),
        }
    }
}

/// A declared data type: its identity, its component name, and its
/// properties in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_id: TypeId,
    /// Component name this type maps to in the document.
    pub name: String,
    pub properties: Vec<PropertyDescriptor>,
    /// Type-level override of whether rule messages are echoed into
    /// property descriptions. `None` defers to the global option.
    pub append_rules: Option<bool>,
}

impl TypeDescriptor {
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: name.into(),
            properties: Vec::new(),
            append_rules: None,
        }
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn append_rules(mut self, append: bool) -> Self {
        self.append_rules = Some(append);
        self
    }
}

/// One member of a registered enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
    pub description: Option<String>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The value set of a registered enum type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: EnumValue) -> Self {
        self.values.push(value);
        self
    }
}

/// Registry of type and enum descriptors, resolved once at startup.
///
/// Iteration follows registration order, so document builds are
/// deterministic.
#[derive(Debug, Default)]
pub struct Registry {
    types: IndexMap<TypeId, TypeDescriptor>,
    enums: IndexMap<TypeId, EnumDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type descriptor, replacing any earlier registration for
    /// the same type.
    pub fn register_type(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.types.insert(descriptor.type_id, descriptor);
        self
    }

    /// Register the value set for enum type `T`.
    pub fn register_enum<T: 'static>(&mut self, descriptor: EnumDescriptor) -> &mut Self {
        self.enums.insert(TypeId::of::<T>(), descriptor);
        self
    }

    pub fn type_descriptor(&self, type_id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(&type_id)
    }

    pub fn enum_descriptor(&self, type_id: TypeId) -> Option<&EnumDescriptor> {
        self.enums.get(&type_id)
    }

    /// Registered type descriptors, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }
}

/// A single property's contribution from one rule source: rules, queued
/// operations, and an optional append-to-description override.
#[derive(Debug, Clone, Default)]
pub struct PropertyRules {
    pub rules: Vec<ValidationRule>,
    pub operations: Vec<RuleOperation>,
    pub append_override: Option<bool>,
}

/// Everything one rule source declares for one type, keyed by property
/// path.
#[derive(Debug, Clone, Default)]
pub struct TypeRules {
    pub properties: IndexMap<PropertyPath, PropertyRules>,
}

impl TypeRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.properties
            .entry(rule.path.clone())
            .or_default()
            .rules
            .push(rule);
        self
    }

    pub fn with_operation(mut self, path: impl Into<PropertyPath>, operation: RuleOperation) -> Self {
        self.properties
            .entry(path.into())
            .or_default()
            .operations
            .push(operation);
        self
    }

    pub fn with_append_override(mut self, path: impl Into<PropertyPath>, append: bool) -> Self {
        self.properties
            .entry(path.into())
            .or_default()
            .append_override = Some(append);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A provider of validation rules for declared types.
///
/// Providers are queried in registration order; a provider that cannot
/// introspect a given type returns a [`SourceError`] and is skipped for
/// that type only.
pub trait RuleSource: Send + Sync {
    /// Provider name, used in skip log lines.
    fn name(&self) -> &str;

    /// Emit everything this provider declares for the given type. A type
    /// the provider knows nothing about yields empty [`TypeRules`].
    fn emit(&self, descriptor: &TypeDescriptor) -> Result<TypeRules, SourceError>;
}

/// Explicit-builder rule declarations, registered per type up front.
#[derive(Default)]
pub struct StaticRuleSource {
    name: String,
    types: IndexMap<TypeId, TypeRules>,
}

impl StaticRuleSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: IndexMap::new(),
        }
    }

    /// Declare rules for type `T`.
    pub fn rules_for<T: 'static>(mut self, rules: TypeRules) -> Self {
        self.types.insert(TypeId::of::<T>(), rules);
        self
    }
}

impl RuleSource for StaticRuleSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, descriptor: &TypeDescriptor) -> Result<TypeRules, SourceError> {
        Ok(self
            .types
            .get(&descriptor.type_id)
            .cloned()
            .unwrap_or_default())
    }
}
