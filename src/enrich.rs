//! Whole-document enrichment: discovery, synthesis, pruning.
//!
//! [`Enricher`] owns the registry, the rule sources, and the per-type rule
//! cache. Enriching a document runs three phases: aggregate rules for every
//! registered type that appears in the component catalog, rewrite each
//! constrained property schema, then prune unreachable components. A
//! caller-supplied cancellation flag is checked only between phases, never
//! mid-traversal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::aggregator::{AggregatedRules, RuleAggregator};
use crate::error::EnrichError;
use crate::pruner::prune;
use crate::registry::{Registry, RuleSource};
use crate::schema::{Document, SchemaNode};
use crate::synthesizer::{synthesize, AppendPolicy, SynthesisContext};

/// Document-build options.
#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    /// Global default for echoing rule messages into property
    /// descriptions. Types and properties can override it.
    pub append_rule_descriptions: bool,
    /// Whether to prune unreachable components after synthesis.
    pub prune_unreachable: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            append_rule_descriptions: true,
            prune_unreachable: true,
        }
    }
}

/// Enriches documents with validation-derived constraints.
///
/// One enricher serves any number of documents; independent documents may
/// be enriched from different threads concurrently. The only shared state
/// is the per-type rule cache, which populates at most once per type.
pub struct Enricher {
    registry: Arc<Registry>,
    aggregator: RuleAggregator,
    options: EnrichOptions,
}

impl Enricher {
    pub fn new(
        registry: Arc<Registry>,
        sources: Vec<Arc<dyn RuleSource>>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            aggregator: RuleAggregator::new(Arc::clone(&registry), sources),
            registry,
            options,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Enrich the document in place: embed rule-derived constraints into
    /// property schemas, then prune unreachable components.
    ///
    /// # Errors
    ///
    /// Configuration errors (unmatched operations, unresolvable enum
    /// types) abort the build.
    pub fn enrich(&self, document: &mut Document) -> Result<(), EnrichError> {
        self.enrich_cancellable(document, &AtomicBool::new(false))
    }

    /// Like [`enrich`](Self::enrich), but checks `cancelled` between the
    /// discovery, synthesis, and pruning phases.
    pub fn enrich_cancellable(
        &self,
        document: &mut Document,
        cancelled: &AtomicBool,
    ) -> Result<(), EnrichError> {
        // Discovery: aggregate rules for every registered type present in
        // the catalog. Results are memoized across documents.
        let mut discovered: Vec<(String, bool, Arc<AggregatedRules>)> = Vec::new();
        for descriptor in self.registry.types() {
            if !document.components.schemas.contains_key(&descriptor.name) {
                continue;
            }
            let aggregated = self.aggregator.aggregate(descriptor.type_id)?;
            if aggregated.is_empty() {
                continue;
            }
            let type_default = descriptor
                .append_rules
                .unwrap_or(self.options.append_rule_descriptions);
            discovered.push((descriptor.name.clone(), type_default, aggregated));
        }

        if cancelled.load(Ordering::Relaxed) {
            return Err(EnrichError::Cancelled);
        }

        // Synthesis: replacements are computed against the pre-synthesis
        // catalog, then applied. Properties are independent of each other.
        let mut replacements: Vec<(String, String, SchemaNode)> = Vec::new();
        {
            let cx = SynthesisContext::new(&document.components.schemas, &self.registry);
            for (component_name, type_default, aggregated) in &discovered {
                let Some(component) = document
                    .components
                    .schemas
                    .get(component_name)
                    .and_then(SchemaNode::as_inline)
                else {
                    continue;
                };

                for (path, state) in aggregated.iter() {
                    // Dotted paths are rewritten on their own component.
                    if !path.is_direct() || state.rules.is_empty() {
                        continue;
                    }
                    let Some(original) = component.properties.get(path.as_str()) else {
                        debug!(
                            component = %component_name,
                            property = %path,
                            "rule declared for a property the schema does not carry"
                        );
                        continue;
                    };

                    let policy = AppendPolicy::with_override(*type_default, state.append_override);
                    let node = synthesize(original, &state.rules, policy, &cx)?;
                    replacements.push((component_name.clone(), path.as_str().to_string(), node));
                }
            }
        }
        for (component_name, property, node) in replacements {
            if let Some(SchemaNode::Inline(inline)) =
                document.components.schemas.get_mut(&component_name)
            {
                // Replacing an existing key keeps its position.
                inline.properties.insert(property, node);
            }
        }

        if cancelled.load(Ordering::Relaxed) {
            return Err(EnrichError::Cancelled);
        }

        // Pruning runs strictly after all synthesis for the document.
        if self.options.prune_unreachable {
            prune(document);
        }

        Ok(())
    }
}
