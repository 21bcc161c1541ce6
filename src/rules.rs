//! Validation rule model.
//!
//! A [`ValidationRule`] is a single declared constraint on a property:
//! a property path, a constraint kind, a human-readable message, and an
//! optional override of whether the rule is echoed into documentation text.
//!
//! Rule construction enforces the model invariants (no bound-less length or
//! range rules, no empty pattern/custom/description text), so a rule that
//! exists is always well-formed.

use std::any::TypeId;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// A dot/bracket-separated path identifying a property.
///
/// Nested properties use dots (`"Order.Customer.Email"`); collection
/// elements use an `[*]` marker (`"Items[*].Sku"`). Immutable once
/// constructed; equality is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath(String);

impl PropertyPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the dot-separated segments (`"Items[*].Sku"` yields
    /// `"Items[*]"`, `"Sku"`).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// True when the path names a direct property (a single segment).
    pub fn is_direct(&self) -> bool {
        !self.0.contains('.')
    }

    /// The first segment with any element marker stripped
    /// (`"Items[*].Sku"` yields `"Items"`).
    pub fn head(&self) -> &str {
        let first = self.0.split('.').next().unwrap_or(&self.0);
        first.strip_suffix("[*]").unwrap_or(first)
    }

    /// Prefix `child` with this path (`"Order".join("Email")` is
    /// `"Order.Email"`). An empty prefix yields `child` unchanged.
    pub fn join(&self, child: &PropertyPath) -> PropertyPath {
        if self.0.is_empty() {
            child.clone()
        } else {
            PropertyPath(format!("{}.{}", self.0, child.0))
        }
    }

    /// The element path for a collection property (`"Items"` yields
    /// `"Items[*]"`).
    pub fn element(&self) -> PropertyPath {
        PropertyPath(format!("{}[*]", self.0))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PropertyPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A numeric bound for a range rule.
///
/// Decimal bounds are kept string-encoded so arbitrary-precision values
/// survive into the schema unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeBound {
    Int(i64),
    Float(f64),
    Decimal(String),
}

impl RangeBound {
    /// True for bounds that imply an integer-typed schema.
    pub fn is_integral(&self) -> bool {
        matches!(self, RangeBound::Int(_))
    }

    /// The bound as the string form written into the schema node.
    pub fn encode(&self) -> String {
        match self {
            RangeBound::Int(v) => v.to_string(),
            RangeBound::Float(v) => v.to_string(),
            RangeBound::Decimal(s) => s.clone(),
        }
    }

    fn check(&self, path: &PropertyPath) -> Result<(), RuleError> {
        match self {
            RangeBound::Decimal(s) => {
                if s.parse::<serde_json::Number>().is_err() {
                    return Err(RuleError::InvalidDecimal {
                        path: path.to_string(),
                        value: s.clone(),
                    });
                }
            }
            RangeBound::Float(v) => {
                if !v.is_finite() {
                    return Err(RuleError::InvalidDecimal {
                        path: path.to_string(),
                        value: v.to_string(),
                    });
                }
            }
            RangeBound::Int(_) => {}
        }
        Ok(())
    }
}

impl From<i32> for RangeBound {
    fn from(v: i32) -> Self {
        RangeBound::Int(i64::from(v))
    }
}

impl From<i64> for RangeBound {
    fn from(v: i64) -> Self {
        RangeBound::Int(v)
    }
}

impl From<f32> for RangeBound {
    fn from(v: f32) -> Self {
        RangeBound::Float(f64::from(v))
    }
}

impl From<f64> for RangeBound {
    fn from(v: f64) -> Self {
        RangeBound::Float(v)
    }
}

/// The constraint carried by a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// The property must be present.
    Required,
    /// String length bounds; at least one bound must be declared.
    StringLength { min: Option<u32>, max: Option<u32> },
    /// The value must match a regex.
    Pattern { regex: String },
    /// The value must be an e-mail address.
    Email,
    /// The value must be a URL.
    Url,
    /// Numeric bounds; at least one bound must be declared.
    Range {
        min: Option<RangeBound>,
        max: Option<RangeBound>,
        exclusive_min: bool,
        exclusive_max: bool,
    },
    /// The value is a member of a registered enum type.
    ///
    /// `declared_type_id` identifies the property's declared type, which
    /// decides whether enum literals are emitted as strings or numbers.
    EnumConstraint {
        enum_type_id: TypeId,
        declared_type_id: TypeId,
    },
    /// A predicate this engine cannot check; documentation only.
    Custom { description: String },
    /// Explicit description text for the property.
    Description { text: String },
}

/// A single declared constraint on a property.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub path: PropertyPath,
    pub kind: RuleKind,
    /// Human-readable message, also the target key for rule operations.
    pub message: String,
    /// Per-rule override of whether the message is echoed into the
    /// property description. `None` defers to the type-level default.
    pub append_to_description: Option<bool>,
}

impl ValidationRule {
    /// Construct a rule, enforcing the kind's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] for a `StringLength` or `Range` with both
    /// bounds absent, an empty `Pattern`/`Custom`/`Description` string, or
    /// a decimal bound that is not a valid number.
    pub fn new(
        path: impl Into<PropertyPath>,
        kind: RuleKind,
        message: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let path = path.into();

        match &kind {
            RuleKind::StringLength { min: None, max: None } => {
                return Err(RuleError::MissingLengthBounds {
                    path: path.to_string(),
                });
            }
            RuleKind::Range { min, max, .. } => {
                if min.is_none() && max.is_none() {
                    return Err(RuleError::MissingRangeBounds {
                        path: path.to_string(),
                    });
                }
                for bound in [min, max].into_iter().flatten() {
                    bound.check(&path)?;
                }
            }
            RuleKind::Pattern { regex } if regex.is_empty() => {
                return Err(RuleError::EmptyPattern {
                    path: path.to_string(),
                });
            }
            RuleKind::Custom { description } if description.is_empty() => {
                return Err(RuleError::EmptyCustomDescription {
                    path: path.to_string(),
                });
            }
            RuleKind::Description { text } if text.is_empty() => {
                return Err(RuleError::EmptyText {
                    path: path.to_string(),
                });
            }
            _ => {}
        }

        Ok(Self {
            path,
            kind,
            message: message.into(),
            append_to_description: None,
        })
    }

    /// Override whether this rule's message is echoed into the description.
    pub fn append_to_description(mut self, append: bool) -> Self {
        self.append_to_description = Some(append);
        self
    }

    /// Re-anchor the rule under a parent property path.
    pub(crate) fn prefixed(mut self, prefix: &PropertyPath) -> Self {
        self.path = prefix.join(&self.path);
        self
    }

    // --- Convenience constructors ---

    /// Infallible constructor for kinds without invariants.
    fn unchecked(path: impl Into<PropertyPath>, kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
            append_to_description: None,
        }
    }

    pub fn required(path: impl Into<PropertyPath>, message: impl Into<String>) -> Self {
        Self::unchecked(path, RuleKind::Required, message)
    }

    pub fn string_length(
        path: impl Into<PropertyPath>,
        min: Option<u32>,
        max: Option<u32>,
        message: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Self::new(path, RuleKind::StringLength { min, max }, message)
    }

    pub fn pattern(
        path: impl Into<PropertyPath>,
        regex: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Self::new(path, RuleKind::Pattern { regex: regex.into() }, message)
    }

    pub fn email(path: impl Into<PropertyPath>, message: impl Into<String>) -> Self {
        Self::unchecked(path, RuleKind::Email, message)
    }

    pub fn url(path: impl Into<PropertyPath>, message: impl Into<String>) -> Self {
        Self::unchecked(path, RuleKind::Url, message)
    }

    /// An inclusive numeric range. Use [`ValidationRule::new`] with
    /// [`RuleKind::Range`] for exclusive bounds.
    pub fn range(
        path: impl Into<PropertyPath>,
        min: Option<RangeBound>,
        max: Option<RangeBound>,
        message: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Self::new(
            path,
            RuleKind::Range {
                min,
                max,
                exclusive_min: false,
                exclusive_max: false,
            },
            message,
        )
    }

    /// An enum-membership constraint for enum type `E` declared as
    /// property type `P`.
    pub fn enumeration<E: 'static, P: 'static>(
        path: impl Into<PropertyPath>,
        message: impl Into<String>,
    ) -> Self {
        Self::unchecked(
            path,
            RuleKind::EnumConstraint {
                enum_type_id: TypeId::of::<E>(),
                declared_type_id: TypeId::of::<P>(),
            },
            message,
        )
    }

    /// A documentation-only custom predicate; the description doubles as
    /// the rule message.
    pub fn custom(
        path: impl Into<PropertyPath>,
        description: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let description = description.into();
        Self::new(
            path,
            RuleKind::Custom {
                description: description.clone(),
            },
            description,
        )
    }

    pub fn description(
        path: impl Into<PropertyPath>,
        text: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let text = text.into();
        Self::new(path, RuleKind::Description { text: text.clone() }, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_and_head() {
        let path = PropertyPath::new("Order.Customer.Email");
        assert_eq!(path.segments().collect::<Vec<_>>(), ["Order", "Customer", "Email"]);
        assert_eq!(path.head(), "Order");
        assert!(!path.is_direct());
        assert!(PropertyPath::new("Title").is_direct());
    }

    #[test]
    fn path_head_strips_element_marker() {
        assert_eq!(PropertyPath::new("Items[*].Sku").head(), "Items");
        assert_eq!(PropertyPath::new("Items[*]").head(), "Items");
    }

    #[test]
    fn path_join_and_element() {
        let prefix = PropertyPath::new("Order");
        assert_eq!(
            prefix.join(&PropertyPath::new("Email")).as_str(),
            "Order.Email"
        );
        assert_eq!(
            PropertyPath::new("").join(&PropertyPath::new("Email")).as_str(),
            "Email"
        );
        assert_eq!(PropertyPath::new("Items").element().as_str(), "Items[*]");
    }

    #[test]
    fn path_equality_is_exact() {
        assert_ne!(PropertyPath::new("title"), PropertyPath::new("Title"));
        assert_eq!(PropertyPath::new("Title"), PropertyPath::new("Title"));
    }

    #[test]
    fn string_length_requires_a_bound() {
        let result = ValidationRule::string_length("Title", None, None, "msg");
        assert!(matches!(result, Err(RuleError::MissingLengthBounds { .. })));

        assert!(ValidationRule::string_length("Title", Some(1), None, "msg").is_ok());
        assert!(ValidationRule::string_length("Title", None, Some(200), "msg").is_ok());
    }

    #[test]
    fn range_requires_a_bound() {
        let result = ValidationRule::range("Count", None, None, "msg");
        assert!(matches!(result, Err(RuleError::MissingRangeBounds { .. })));

        let rule = ValidationRule::range("Count", Some(1.into()), None, "msg").unwrap();
        assert!(matches!(
            rule.kind,
            RuleKind::Range { min: Some(RangeBound::Int(1)), .. }
        ));
    }

    #[test]
    fn decimal_bound_must_be_numeric() {
        let result = ValidationRule::range(
            "Price",
            Some(RangeBound::Decimal("0.01".into())),
            Some(RangeBound::Decimal("not-a-number".into())),
            "msg",
        );
        assert!(matches!(
            result,
            Err(RuleError::InvalidDecimal { value, .. }) if value == "not-a-number"
        ));
    }

    #[test]
    fn non_finite_float_bound_rejected() {
        let result = ValidationRule::range("Score", Some(f64::NAN.into()), None, "msg");
        assert!(matches!(result, Err(RuleError::InvalidDecimal { .. })));
    }

    #[test]
    fn decimal_bound_keeps_precision() {
        let bound = RangeBound::Decimal("0.300000000000000000000001".into());
        assert_eq!(bound.encode(), "0.300000000000000000000001");
    }

    #[test]
    fn empty_pattern_rejected() {
        let result = ValidationRule::pattern("Code", "", "msg");
        assert!(matches!(result, Err(RuleError::EmptyPattern { .. })));
    }

    #[test]
    fn empty_custom_and_description_rejected() {
        assert!(matches!(
            ValidationRule::custom("X", ""),
            Err(RuleError::EmptyCustomDescription { .. })
        ));
        assert!(matches!(
            ValidationRule::description("X", ""),
            Err(RuleError::EmptyText { .. })
        ));
    }

    #[test]
    fn append_override_defaults_to_none() {
        let rule = ValidationRule::required("Title", "Is required");
        assert_eq!(rule.append_to_description, None);

        let rule = rule.append_to_description(false);
        assert_eq!(rule.append_to_description, Some(false));
    }

    #[test]
    fn enumeration_captures_type_ids() {
        struct Priority;
        let rule = ValidationRule::enumeration::<Priority, i32>("Priority", "Invalid priority");
        match rule.kind {
            RuleKind::EnumConstraint {
                enum_type_id,
                declared_type_id,
            } => {
                assert_eq!(enum_type_id, TypeId::of::<Priority>());
                assert_eq!(declared_type_id, TypeId::of::<i32>());
            }
            other => panic!("expected enum constraint, got {:?}", other),
        }
    }
}
