//! OpenAPI Document Enrichment
//!
//! Augments a generated API description with validation-derived schema
//! constraints and removes components unreachable from the document's
//! operations.
//!
//! Rules for a declared type are collected from registered [`RuleSource`]
//! providers, edited by queued [`RuleOperation`]s, and embedded into the
//! type's property schemas (type, format, bounds, pattern, enum metadata,
//! plus a human-readable constraint summary). The reachability pruner then
//! walks every structural reference from every operation and deletes
//! whatever no operation can reach.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use oas_enrich::{
//!     Enricher, EnrichOptions, PropertyDescriptor, Registry, StaticRuleSource,
//!     TypeDescriptor, TypeRules, ValidationRule,
//! };
//!
//! struct Todo;
//!
//! let mut registry = Registry::new();
//! registry.register_type(
//!     TypeDescriptor::of::<Todo>("Todo")
//!         .with_property(PropertyDescriptor::scalar("Title")),
//! );
//!
//! let rules = StaticRuleSource::new("builder").rules_for::<Todo>(
//!     TypeRules::new()
//!         .with_rule(ValidationRule::required("Title", "Is required"))
//!         .with_rule(
//!             ValidationRule::string_length("Title", Some(1), Some(200),
//!                 "Must be 1 to 200 characters").unwrap(),
//!         ),
//! );
//!
//! let enricher = Enricher::new(
//!     Arc::new(registry),
//!     vec![Arc::new(rules)],
//!     EnrichOptions::default(),
//! );
//!
//! let mut document: oas_enrich::Document = serde_json::from_value(serde_json::json!({
//!     "paths": {
//!         "/todos": {
//!             "post": {
//!                 "requestBody": {
//!                     "content": {
//!                         "application/json": {
//!                             "schema": { "$ref": "#/components/schemas/Todo" }
//!                         }
//!                     }
//!                 },
//!                 "responses": { "201": { "description": "Created" } }
//!             }
//!         }
//!     },
//!     "components": {
//!         "schemas": {
//!             "Todo": {
//!                 "type": "object",
//!                 "properties": { "Title": { "type": "string" } }
//!             },
//!             "Unused": { "type": "object" }
//!         }
//!     }
//! })).unwrap();
//!
//! enricher.enrich(&mut document).unwrap();
//!
//! let todo = document.component("Todo").unwrap().as_inline().unwrap();
//! let title = todo.properties["Title"].as_inline().unwrap();
//! assert_eq!(title.min_length, Some(1));
//! assert_eq!(title.max_length, Some(200));
//!
//! // The component nothing references is gone.
//! assert!(document.component("Unused").is_none());
//! ```
//!
//! # Phases
//!
//! | Phase | What happens | Shared state |
//! |-------|--------------|--------------|
//! | Discovery | rules aggregated per type, memoized | per-type cache |
//! | Synthesis | property schemas rewritten in place | none |
//! | Pruning | unreachable components deleted | none |
//!
//! Configuration errors (an operation that matches nothing, an
//! unregistered enum type, bound-less rules) abort the document build;
//! they indicate bugs in the declared rules, not runtime conditions. A
//! rule source that cannot introspect one type is skipped for that type
//! and the omission logged.

mod aggregator;
mod enrich;
mod error;
mod loader;
mod ops;
mod pruner;
mod registry;
mod rules;
mod schema;
mod synthesizer;

pub use aggregator::{AggregatedRules, PropertyState, RuleAggregator};
pub use enrich::{EnrichOptions, Enricher};
pub use error::{DocumentError, EnrichError, RuleError, SourceError};
pub use loader::{load_document, load_document_str};
pub use ops::{apply_operations, RuleOperation};
pub use pruner::{prune, reachable_components};
pub use registry::{
    EnumDescriptor, EnumValue, PropertyDescriptor, PropertyRules, PropertyShape, Registry,
    RuleSource, StaticRuleSource, TypeDescriptor, TypeRules,
};
pub use rules::{PropertyPath, RangeBound, RuleKind, ValidationRule};
pub use schema::{
    Components, Document, Encoding, Header, InlineSchema, MediaType, Operation, Parameter,
    PathItem, Reference, RequestBody, Response, SchemaNode, SchemaType, COMPONENT_REF_PREFIX,
};
pub use synthesizer::{synthesize, AppendPolicy, SynthesisContext};
