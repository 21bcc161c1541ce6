//! Rule aggregation - collects rules from every source for a type.
//!
//! Aggregation queries each registered [`RuleSource`] in order, concatenates
//! what they emit per property path, expands nested object and collection
//! element types, and finally applies each property's queued operations.
//! Results are memoized per type for the process lifetime; rules for a type
//! never change after first discovery.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::EnrichError;
use crate::ops::{apply_operations, RuleOperation};
use crate::registry::{PropertyShape, Registry, RuleSource};
use crate::rules::{PropertyPath, ValidationRule};

/// A property's final aggregated state: its rule list after operations,
/// and its append-to-description override if any source declared one.
#[derive(Debug, Clone, Default)]
pub struct PropertyState {
    pub rules: Vec<ValidationRule>,
    pub append_override: Option<bool>,
}

/// Aggregated rules for one type, keyed by property path.
///
/// Paths into nested types are prefixed (`Customer.Email`, `Items[*].Sku`).
#[derive(Debug, Clone, Default)]
pub struct AggregatedRules {
    pub properties: IndexMap<PropertyPath, PropertyState>,
}

impl AggregatedRules {
    pub fn get(&self, path: &PropertyPath) -> Option<&PropertyState> {
        self.properties.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyPath, &PropertyState)> {
        self.properties.iter()
    }
}

/// Working state for one property while sources are still contributing.
#[derive(Default)]
struct PendingProperty {
    rules: Vec<ValidationRule>,
    operations: Vec<RuleOperation>,
    append_override: Option<bool>,
}

/// Collects and memoizes validation rules per declared type.
pub struct RuleAggregator {
    registry: Arc<Registry>,
    sources: Vec<Arc<dyn RuleSource>>,
    cache: DashMap<TypeId, Arc<AggregatedRules>>,
}

impl RuleAggregator {
    pub fn new(registry: Arc<Registry>, sources: Vec<Arc<dyn RuleSource>>) -> Self {
        Self {
            registry,
            sources,
            cache: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Aggregate rules for the given type, computing at most once per type
    /// even under concurrent first access.
    ///
    /// A type with zero discoverable rules yields an empty map.
    ///
    /// # Errors
    ///
    /// [`EnrichError::UnknownType`] when no descriptor is registered for
    /// `type_id`; operation failures propagate as configuration errors.
    pub fn aggregate(&self, type_id: TypeId) -> Result<Arc<AggregatedRules>, EnrichError> {
        if let Some(hit) = self.cache.get(&type_id) {
            return Ok(Arc::clone(&hit));
        }

        // The entry holds its shard lock while computing, so concurrent
        // first callers race to one computation.
        let entry = self
            .cache
            .entry(type_id)
            .or_try_insert_with(|| {
                let mut in_progress = HashSet::new();
                self.compute(type_id, &mut in_progress).map(Arc::new)
            })?;
        Ok(Arc::clone(&entry))
    }

    /// Convenience form of [`aggregate`](Self::aggregate) for a known type.
    pub fn aggregate_for<T: 'static>(&self) -> Result<Arc<AggregatedRules>, EnrichError> {
        self.aggregate(TypeId::of::<T>())
    }

    fn compute(
        &self,
        type_id: TypeId,
        in_progress: &mut HashSet<TypeId>,
    ) -> Result<AggregatedRules, EnrichError> {
        let descriptor = self
            .registry
            .type_descriptor(type_id)
            .ok_or(EnrichError::UnknownType)?;

        in_progress.insert(type_id);

        let mut pending: IndexMap<PropertyPath, PendingProperty> = IndexMap::new();

        // Sources contribute in registration order; rules for the same
        // property concatenate rather than merge by kind, so conflicting
        // declarations both appear.
        for source in &self.sources {
            match source.emit(descriptor) {
                Ok(contribution) => {
                    for (path, property) in contribution.properties {
                        let slot = pending.entry(path).or_default();
                        slot.rules.extend(property.rules);
                        slot.operations.extend(property.operations);
                        if property.append_override.is_some() {
                            slot.append_override = property.append_override;
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        source = source.name(),
                        type_name = %descriptor.name,
                        error = %err,
                        "rule source skipped for type"
                    );
                }
            }
        }

        // Expand nested object and collection-element types, prefixing
        // their paths under the owning property.
        for property in &descriptor.properties {
            let Some((nested_id, prefix)) = nested_target(&property.shape, &property.name) else {
                continue;
            };
            if in_progress.contains(&nested_id) {
                debug!(
                    type_name = %descriptor.name,
                    property = %property.name,
                    "skipping self-referential nested type"
                );
                continue;
            }
            if self.registry.type_descriptor(nested_id).is_none() {
                continue;
            }

            let nested = self.compute(nested_id, in_progress)?;
            for (path, state) in nested.properties {
                let full = prefix.join(&path);
                let slot = pending.entry(full).or_default();
                slot.rules
                    .extend(state.rules.into_iter().map(|r| r.prefixed(&prefix)));
                if state.append_override.is_some() {
                    slot.append_override = state.append_override;
                }
            }
        }

        in_progress.remove(&type_id);

        // Operations run only now, after every source has contributed.
        let mut properties = IndexMap::new();
        for (path, mut property) in pending {
            apply_operations(&mut property.rules, &property.operations, &path)?;
            if property.rules.is_empty() && property.append_override.is_none() {
                continue;
            }
            properties.insert(
                path,
                PropertyState {
                    rules: property.rules,
                    append_override: property.append_override,
                },
            );
        }

        Ok(AggregatedRules { properties })
    }
}

/// For a nested or collection-of-nested shape, the target type and the
/// path prefix rules from that type are anchored under.
fn nested_target(shape: &PropertyShape, name: &str) -> Option<(TypeId, PropertyPath)> {
    match shape {
        PropertyShape::Scalar => None,
        PropertyShape::Nested(id) => Some((*id, PropertyPath::new(name))),
        PropertyShape::Collection(inner) => {
            let (id, prefix) = nested_target(inner, name)?;
            Some((id, prefix.element()))
        }
    }
}
