//! Schema synthesis - rewrites a property's schema node from its rules.
//!
//! Given the property's original node (inline, referenced, possibly
//! nullable-wrapped) and its final rule list, synthesis produces the
//! replacement node embedding type, format, bounds, pattern, enum metadata,
//! and a human-readable constraint summary. Reusable named schemas are
//! preserved by reference; only primitive and array properties are inlined.

use std::any::TypeId;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::EnrichError;
use crate::registry::{EnumDescriptor, Registry};
use crate::rules::{RangeBound, RuleKind, ValidationRule};
use crate::schema::{InlineSchema, Reference, SchemaNode, SchemaType};

/// Whether rule messages are echoed into the property description.
///
/// The per-property override wins over the type-level default; the caller
/// folds the global default into `type_default`.
#[derive(Debug, Clone, Copy)]
pub struct AppendPolicy {
    pub type_default: bool,
    pub property_override: Option<bool>,
}

impl AppendPolicy {
    pub fn new(type_default: bool) -> Self {
        Self {
            type_default,
            property_override: None,
        }
    }

    pub fn with_override(type_default: bool, property_override: Option<bool>) -> Self {
        Self {
            type_default,
            property_override,
        }
    }

    fn effective(&self) -> bool {
        self.property_override.unwrap_or(self.type_default)
    }
}

/// Lookup context for synthesis: the component catalog (for classifying
/// references) and the registry (for enum value sets).
#[derive(Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub components: &'a IndexMap<String, SchemaNode>,
    pub registry: &'a Registry,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(components: &'a IndexMap<String, SchemaNode>, registry: &'a Registry) -> Self {
        Self {
            components,
            registry,
        }
    }
}

/// Synthesize the replacement schema node for a property.
///
/// # Errors
///
/// [`EnrichError::UnknownEnumType`] when an enum constraint references an
/// unregistered enum type. All other inputs synthesize totally.
pub fn synthesize(
    original: &SchemaNode,
    rules: &[ValidationRule],
    policy: AppendPolicy,
    cx: &SynthesisContext<'_>,
) -> Result<SchemaNode, EnrichError> {
    // Unwrap a nullability wrapper; the real schema is the other branch.
    let (unwrapped, mut rewrap) = match original.nullable_inner() {
        Some(inner) => (inner, true),
        None => (original, false),
    };

    // No re-wrap when the referenced definition itself encodes
    // nullability.
    if rewrap {
        if let Some(name) = unwrapped.as_reference().and_then(Reference::component_name) {
            if cx
                .components
                .get(name)
                .map_or(false, |c| c.nullable_inner().is_some())
            {
                rewrap = false;
            }
        }
    }

    let synthesized = match unwrapped {
        SchemaNode::Reference(reference) => synthesize_reference(reference, rules, policy, cx)?,
        SchemaNode::Inline(inline) => synthesize_inline(inline, rules, policy, cx)?,
        // A bare boolean schema carries nothing to preserve.
        SchemaNode::Bool(_) => inline_primitive(Base::default(), rules, policy, cx)?,
    };

    if rewrap {
        Ok(SchemaNode::Inline(Box::new(InlineSchema {
            one_of: vec![SchemaNode::null_marker(), synthesized],
            ..InlineSchema::default()
        })))
    } else {
        Ok(synthesized)
    }
}

/// What a reference resolves to, for deciding passthrough vs inlining.
enum RefClass {
    Scalar {
        schema_type: Option<SchemaType>,
        format: Option<String>,
    },
    Collection {
        items: Option<SchemaNode>,
    },
    Dictionary {
        additional_properties: Option<SchemaNode>,
    },
    Enumeration {
        schema_type: Option<SchemaType>,
        format: Option<String>,
    },
    /// Object-like, unresolvable, or otherwise not inlinable.
    Opaque,
}

fn classify_reference(reference: &Reference, cx: &SynthesisContext<'_>) -> RefClass {
    let Some(name) = reference.component_name() else {
        return RefClass::Opaque;
    };
    let Some(component) = cx.components.get(name) else {
        return RefClass::Opaque;
    };

    // Classify through the component's own nullability wrapper, if any.
    let node = component.nullable_inner().unwrap_or(component);
    let Some(inline) = node.as_inline() else {
        return RefClass::Opaque;
    };

    if !inline.enum_values.is_empty() {
        return RefClass::Enumeration {
            schema_type: inline.schema_type,
            format: inline.format.clone(),
        };
    }
    if inline.schema_type == Some(SchemaType::Array) || inline.items.is_some() {
        return RefClass::Collection {
            items: inline.items.as_deref().cloned(),
        };
    }
    if inline.is_dictionary() {
        return RefClass::Dictionary {
            additional_properties: inline.additional_properties.as_deref().cloned(),
        };
    }
    match inline.schema_type {
        Some(
            SchemaType::String | SchemaType::Integer | SchemaType::Number | SchemaType::Boolean,
        ) => RefClass::Scalar {
            schema_type: inline.schema_type,
            format: inline.format.clone(),
        },
        _ => RefClass::Opaque,
    }
}

fn synthesize_reference(
    reference: &Reference,
    rules: &[ValidationRule],
    policy: AppendPolicy,
    cx: &SynthesisContext<'_>,
) -> Result<SchemaNode, EnrichError> {
    match classify_reference(reference, cx) {
        RefClass::Scalar {
            schema_type,
            format,
        } => inline_primitive(
            Base {
                schema_type,
                format,
                ..Base::default()
            },
            rules,
            policy,
            cx,
        ),
        RefClass::Collection { items } => inline_primitive(
            Base {
                schema_type: Some(SchemaType::Array),
                items,
                ..Base::default()
            },
            rules,
            policy,
            cx,
        ),
        RefClass::Dictionary {
            additional_properties,
        } => inline_primitive(
            Base {
                schema_type: Some(SchemaType::Object),
                additional_properties,
                ..Base::default()
            },
            rules,
            policy,
            cx,
        ),
        // An enum reference is only inlined when an enum rule will rebuild
        // its value set; otherwise the named schema stays referenced.
        RefClass::Enumeration {
            schema_type,
            format,
        } if has_enum_rule(rules) => inline_primitive(
            Base {
                schema_type,
                format,
                ..Base::default()
            },
            rules,
            policy,
            cx,
        ),
        RefClass::Enumeration { .. } | RefClass::Opaque => {
            Ok(custom_ref_passthrough(reference, rules, policy))
        }
    }
}

/// Preserve a reusable named schema: wrap the reference in `allOf` and
/// rewrite only the description.
fn custom_ref_passthrough(
    reference: &Reference,
    rules: &[ValidationRule],
    policy: AppendPolicy,
) -> SchemaNode {
    let lead = has_required(rules).then_some("Is required");
    let description = assemble_description(rules, lead, None, policy);

    SchemaNode::Inline(Box::new(InlineSchema {
        all_of: vec![SchemaNode::Reference(reference.clone())],
        description,
        ..InlineSchema::default()
    }))
}

fn synthesize_inline(
    inline: &InlineSchema,
    rules: &[ValidationRule],
    policy: AppendPolicy,
    cx: &SynthesisContext<'_>,
) -> Result<SchemaNode, EnrichError> {
    // Complex shapes (declared properties, compositions) pass through
    // verbatim with only the description rewritten.
    let object_typed = matches!(inline.schema_type, None | Some(SchemaType::Object));
    let structured = !inline.properties.is_empty()
        || !inline.all_of.is_empty()
        || !inline.one_of.is_empty()
        || !inline.any_of.is_empty();
    if object_typed && structured {
        return Ok(complex_object_passthrough(inline, rules, policy));
    }

    inline_primitive(
        Base {
            schema_type: inline.schema_type,
            format: inline.format.clone(),
            items: inline.items.as_deref().cloned(),
            enum_values: inline.enum_values.clone(),
            additional_properties: inline.additional_properties.as_deref().cloned(),
        },
        rules,
        policy,
        cx,
    )
}

fn complex_object_passthrough(
    inline: &InlineSchema,
    rules: &[ValidationRule],
    policy: AppendPolicy,
) -> SchemaNode {
    let lead = has_required(rules).then_some("Required");
    let description = assemble_description(rules, lead, None, policy);

    let mut node = inline.clone();
    if description.is_some() {
        node.description = description;
    }
    SchemaNode::Inline(Box::new(node))
}

/// Structural seed for an inlined primitive/array node, taken from the
/// original inline node or a resolved reference.
#[derive(Default)]
struct Base {
    schema_type: Option<SchemaType>,
    format: Option<String>,
    items: Option<SchemaNode>,
    enum_values: Vec<Value>,
    additional_properties: Option<SchemaNode>,
}

fn inline_primitive(
    base: Base,
    rules: &[ValidationRule],
    policy: AppendPolicy,
    cx: &SynthesisContext<'_>,
) -> Result<SchemaNode, EnrichError> {
    // Rule-implied type wins over whatever the original encoded.
    let rule_type = rules.iter().find_map(|r| implied_type(&r.kind));
    let effective_type = rule_type.or(base.schema_type);

    let mut node = InlineSchema {
        schema_type: effective_type,
        // A format only survives alongside the type that declared it.
        format: if base.schema_type == effective_type {
            base.format
        } else {
            None
        },
        items: if effective_type == Some(SchemaType::Array) {
            base.items.map(Box::new)
        } else {
            None
        },
        enum_values: base.enum_values,
        additional_properties: base.additional_properties.map(Box::new),
        ..InlineSchema::default()
    };

    let mut enum_description = None;
    for rule in rules {
        apply_rule(rule, &mut node, &mut enum_description, cx)?;
    }

    node.description = assemble_description(rules, None, enum_description.as_deref(), policy);
    Ok(SchemaNode::Inline(Box::new(node)))
}

fn apply_rule(
    rule: &ValidationRule,
    node: &mut InlineSchema,
    enum_description: &mut Option<String>,
    cx: &SynthesisContext<'_>,
) -> Result<(), EnrichError> {
    match &rule.kind {
        // Required, custom predicates, and descriptions have no structural
        // encoding on the node itself.
        RuleKind::Required | RuleKind::Custom { .. } | RuleKind::Description { .. } => {}

        RuleKind::StringLength { min, max } => {
            if min.is_some() {
                node.min_length = *min;
            }
            if max.is_some() {
                node.max_length = *max;
            }
        }
        RuleKind::Pattern { regex } => {
            node.pattern = Some(regex.clone());
        }
        RuleKind::Email => {
            node.format = Some("email".to_string());
        }
        RuleKind::Url => {
            node.format = Some("uri".to_string());
        }
        RuleKind::Range {
            min,
            max,
            exclusive_min,
            exclusive_max,
        } => {
            if let Some(bound) = min {
                node.minimum = Some(bound.encode());
                node.exclusive_minimum = *exclusive_min;
            }
            if let Some(bound) = max {
                node.maximum = Some(bound.encode());
                node.exclusive_maximum = *exclusive_max;
            }
        }
        RuleKind::EnumConstraint {
            enum_type_id,
            declared_type_id,
        } => {
            let descriptor = cx.registry.enum_descriptor(*enum_type_id).ok_or_else(|| {
                EnrichError::UnknownEnumType {
                    path: rule.path.to_string(),
                }
            })?;
            apply_enum(descriptor, *declared_type_id, node, enum_description);
        }
    }
    Ok(())
}

fn apply_enum(
    descriptor: &EnumDescriptor,
    declared_type_id: TypeId,
    node: &mut InlineSchema,
    enum_description: &mut Option<String>,
) {
    let textual = is_textual(declared_type_id);

    node.enum_values = descriptor
        .values
        .iter()
        .map(|v| {
            if textual {
                Value::String(v.name.clone())
            } else {
                Value::from(v.value)
            }
        })
        .collect();

    let names: Vec<&str> = descriptor.values.iter().map(|v| v.name.as_str()).collect();
    node.extensions.insert(
        "x-enum-varnames".to_string(),
        Value::Array(names.iter().map(|n| Value::String((*n).to_string())).collect()),
    );

    let mut descriptions = serde_json::Map::new();
    for value in &descriptor.values {
        if let Some(text) = &value.description {
            descriptions.insert(value.name.clone(), Value::String(text.clone()));
        }
    }
    if !descriptions.is_empty() {
        node.extensions
            .insert("x-enum-descriptions".to_string(), Value::Object(descriptions));
    }

    *enum_description = Some(format!("Enum: {}", names.join(", ")));
}

/// The schema type a rule variant implies, if any.
fn implied_type(kind: &RuleKind) -> Option<SchemaType> {
    match kind {
        RuleKind::StringLength { .. }
        | RuleKind::Pattern { .. }
        | RuleKind::Email
        | RuleKind::Url => Some(SchemaType::String),
        RuleKind::Range { min, max, .. } => {
            let integral = [min, max]
                .into_iter()
                .flatten()
                .all(RangeBound::is_integral);
            Some(if integral {
                SchemaType::Integer
            } else {
                SchemaType::Number
            })
        }
        RuleKind::EnumConstraint {
            declared_type_id, ..
        } => Some(if is_textual(*declared_type_id) {
            SchemaType::String
        } else {
            SchemaType::Integer
        }),
        _ => None,
    }
}

fn is_textual(type_id: TypeId) -> bool {
    type_id == TypeId::of::<String>()
        || type_id == TypeId::of::<&'static str>()
        || type_id == TypeId::of::<str>()
}

fn has_required(rules: &[ValidationRule]) -> bool {
    rules.iter().any(|r| matches!(r.kind, RuleKind::Required))
}

fn has_enum_rule(rules: &[ValidationRule]) -> bool {
    rules
        .iter()
        .any(|r| matches!(r.kind, RuleKind::EnumConstraint { .. }))
}

/// Assemble the description: enum text first, else an explicit description
/// rule, then the `Validation rules:` block when the effective append flag
/// (or a per-rule override) allows.
fn assemble_description(
    rules: &[ValidationRule],
    lead: Option<&str>,
    enum_description: Option<&str>,
    policy: AppendPolicy,
) -> Option<String> {
    let explicit = rules.iter().find_map(|r| match &r.kind {
        RuleKind::Description { text } => Some(text.as_str()),
        _ => None,
    });
    let base = enum_description.or(explicit);

    let effective = policy.effective();
    let mut bullets: Vec<&str> = Vec::new();
    for rule in rules {
        if matches!(rule.kind, RuleKind::Description { .. }) {
            continue;
        }
        if !rule.append_to_description.unwrap_or(effective) {
            continue;
        }
        // Custom text is documentation-only; don't repeat the description.
        if matches!(rule.kind, RuleKind::Custom { .. }) && base == Some(rule.message.as_str()) {
            continue;
        }
        if lead == Some(rule.message.as_str()) {
            continue;
        }
        if !bullets.contains(&rule.message.as_str()) {
            bullets.push(rule.message.as_str());
        }
    }

    let mut sections: Vec<String> = Vec::new();
    if let Some(lead) = lead {
        sections.push(lead.to_string());
    }
    if let Some(base) = base {
        sections.push(base.to_string());
    }
    if !bullets.is_empty() {
        let mut block = String::from("Validation rules:");
        for bullet in &bullets {
            block.push_str("\n- ");
            block.push_str(bullet);
        }
        sections.push(block);
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}
