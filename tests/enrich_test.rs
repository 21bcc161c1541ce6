//! Integration tests for document enrichment and pruning.

use std::sync::Arc;

use oas_enrich::{
    prune, Document, EnrichOptions, Enricher, EnumDescriptor, EnumValue, PropertyDescriptor,
    Registry, RuleOperation, StaticRuleSource, TypeDescriptor, TypeRules, ValidationRule,
};
use serde_json::json;

fn document(value: serde_json::Value) -> Document {
    serde_json::from_value(value).unwrap()
}

// === Synthesis scenarios ===

mod synthesis_scenarios {
    use super::*;

    struct Todo;
    struct Priority;

    fn todo_document() -> Document {
        document(json!({
            "paths": {
                "/todos": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Todo" }
                                }
                            }
                        },
                        "responses": { "201": { "description": "Created" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Todo": {
                        "type": "object",
                        "properties": {
                            "Title": { "type": "string" },
                            "Priority": { "type": "integer" },
                            "DueInDays": {
                                "oneOf": [{ "type": "null" }, { "type": "integer" }]
                            }
                        }
                    }
                }
            }
        }))
    }

    fn enricher(rules: TypeRules) -> Enricher {
        let mut registry = Registry::new();
        registry.register_type(
            TypeDescriptor::of::<Todo>("Todo")
                .with_property(PropertyDescriptor::scalar("Title"))
                .with_property(PropertyDescriptor::scalar("Priority"))
                .with_property(PropertyDescriptor::scalar("DueInDays")),
        );
        registry.register_enum::<Priority>(
            EnumDescriptor::new("Priority")
                .with_value(EnumValue::new("Low", 0).describe("Low priority task"))
                .with_value(EnumValue::new("Medium", 1)),
        );

        let source = StaticRuleSource::new("builder").rules_for::<Todo>(rules);
        Enricher::new(
            Arc::new(registry),
            vec![Arc::new(source)],
            EnrichOptions::default(),
        )
    }

    #[test]
    fn required_and_length_rules_embed_with_message_block() {
        let mut doc = todo_document();
        enricher(
            TypeRules::new()
                .with_rule(ValidationRule::required("Title", "Is required"))
                .with_rule(
                    ValidationRule::string_length(
                        "Title",
                        Some(1),
                        Some(200),
                        "Must be 1 to 200 characters",
                    )
                    .unwrap(),
                ),
        )
        .enrich(&mut doc)
        .unwrap();

        let todo = doc.component("Todo").unwrap().as_inline().unwrap();
        let title = todo.properties["Title"].as_inline().unwrap();

        assert_eq!(title.min_length, Some(1));
        assert_eq!(title.max_length, Some(200));
        assert!(title.description.as_deref().unwrap().ends_with(
            "Validation rules:\n- Is required\n- Must be 1 to 200 characters"
        ));
    }

    #[test]
    fn nullable_property_keeps_exactly_one_marker() {
        let rule =
            ValidationRule::range("DueInDays", Some(0.into()), Some(365.into()), "0 to 365")
                .unwrap();
        let mut doc = todo_document();
        enricher(TypeRules::new().with_rule(rule.clone()))
            .enrich(&mut doc)
            .unwrap();

        let todo = doc.component("Todo").unwrap().as_inline().unwrap();
        let due = todo.properties["DueInDays"].as_inline().unwrap();
        assert_eq!(due.one_of.len(), 2);
        assert!(due.one_of[0].is_nullability_marker());

        let real = due.one_of[1].as_inline().unwrap();
        assert_eq!(real.minimum.as_deref(), Some("0"));
        assert_eq!(real.maximum.as_deref(), Some("365"));

        // Enriching again does not wrap a second time.
        let mut again = doc.clone();
        enricher(TypeRules::new().with_rule(rule))
            .enrich(&mut again)
            .unwrap();
        let due = again.component("Todo").unwrap().as_inline().unwrap().properties["DueInDays"]
            .as_inline()
            .unwrap();
        assert_eq!(due.one_of.len(), 2);
    }

    #[test]
    fn enum_enrichment_emits_values_names_and_descriptions() {
        let mut doc = todo_document();
        enricher(TypeRules::new().with_rule(ValidationRule::enumeration::<Priority, i32>(
            "Priority",
            "Invalid priority",
        )))
        .enrich(&mut doc)
        .unwrap();

        let todo = doc.component("Todo").unwrap().as_inline().unwrap();
        let priority = todo.properties["Priority"].as_inline().unwrap();

        assert_eq!(priority.enum_values, vec![json!(0), json!(1)]);
        assert_eq!(
            priority.extensions["x-enum-varnames"],
            json!(["Low", "Medium"])
        );
        assert_eq!(
            priority.extensions["x-enum-descriptions"],
            json!({ "Low": "Low priority task" })
        );
    }

    #[test]
    fn operations_edit_discovered_rules_before_synthesis() {
        let mut doc = todo_document();
        enricher(
            TypeRules::new()
                .with_rule(ValidationRule::required("Title", "Is required"))
                .with_operation("Title", RuleOperation::alter("Is required", "Title is mandatory")),
        )
        .enrich(&mut doc)
        .unwrap();

        let todo = doc.component("Todo").unwrap().as_inline().unwrap();
        let description = todo.properties["Title"]
            .as_inline()
            .unwrap()
            .description
            .as_deref()
            .unwrap();
        assert!(description.contains("Title is mandatory"));
        assert!(!description.contains("Is required"));
    }
}

// === Pruning properties ===

mod pruning {
    use super::*;

    #[test]
    fn only_operation_reachable_components_survive() {
        // Components {A, B, C}: only A referenced from an operation, A
        // references B, C is unreachable.
        let mut doc = document(json!({
            "paths": {
                "/a": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/A" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "A": {
                        "type": "object",
                        "properties": { "b": { "$ref": "#/components/schemas/B" } }
                    },
                    "B": { "type": "string" },
                    "C": { "type": "string" }
                }
            }
        }));

        prune(&mut doc);

        let names: Vec<&str> = doc.components.schemas.keys().map(String::as_str).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn prune_twice_equals_prune_once() {
        let mut doc = document(json!({
            "paths": {
                "/x": {
                    "get": {
                        "parameters": [
                            { "name": "id", "in": "path", "required": true,
                              "schema": { "$ref": "#/components/schemas/Id" } }
                        ],
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Id": { "type": "string" },
                    "Orphan": { "type": "object" },
                    "OrphanChild": { "type": "string" }
                }
            }
        }));

        prune(&mut doc);
        let once = doc.clone();
        prune(&mut doc);

        assert_eq!(doc, once);
    }

    #[test]
    fn self_referential_component_retained_and_walk_terminates() {
        let mut doc = document(json!({
            "paths": {
                "/tree": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/TreeNode" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "TreeNode": {
                        "type": "object",
                        "properties": {
                            "value": { "type": "string" },
                            "children": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/TreeNode" }
                            }
                        }
                    }
                }
            }
        }));

        prune(&mut doc);
        assert!(doc.component("TreeNode").is_some());
    }
}

// === Pipeline behavior ===

mod pipeline {
    use super::*;

    struct Order;
    struct Customer;

    fn order_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register_type(
            TypeDescriptor::of::<Order>("Order")
                .with_property(PropertyDescriptor::scalar("Reference"))
                .with_property(PropertyDescriptor::nested::<Customer>("Customer")),
        );
        registry.register_type(
            TypeDescriptor::of::<Customer>("Customer")
                .with_property(PropertyDescriptor::scalar("Email")),
        );
        registry
    }

    fn order_document() -> Document {
        document(json!({
            "paths": {
                "/orders": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Order" }
                                }
                            }
                        },
                        "responses": { "201": { "description": "Created" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Order": {
                        "type": "object",
                        "properties": {
                            "Reference": { "type": "string" },
                            "Customer": { "$ref": "#/components/schemas/Customer" }
                        }
                    },
                    "Customer": {
                        "type": "object",
                        "properties": { "Email": { "type": "string" } }
                    },
                    "Abandoned": { "type": "object" }
                }
            }
        }))
    }

    #[test]
    fn nested_type_components_enrich_through_their_own_registration() {
        let source = StaticRuleSource::new("builder")
            .rules_for::<Order>(
                TypeRules::new().with_rule(ValidationRule::required("Customer", "Is required")),
            )
            .rules_for::<Customer>(
                TypeRules::new()
                    .with_rule(ValidationRule::email("Email", "Must be a valid email")),
            );

        let enricher = Enricher::new(
            Arc::new(order_registry()),
            vec![Arc::new(source)],
            EnrichOptions::default(),
        );

        let mut doc = order_document();
        enricher.enrich(&mut doc).unwrap();

        // The object-typed reference property keeps its named schema.
        let order = doc.component("Order").unwrap().as_inline().unwrap();
        let customer_prop = order.properties["Customer"].as_inline().unwrap();
        assert_eq!(customer_prop.all_of.len(), 1);
        assert!(customer_prop
            .description
            .as_deref()
            .unwrap()
            .starts_with("Is required"));

        // The referenced component's own property was rewritten.
        let customer = doc.component("Customer").unwrap().as_inline().unwrap();
        let email = customer.properties["Email"].as_inline().unwrap();
        assert_eq!(email.format.as_deref(), Some("email"));

        // And the unreferenced component is gone.
        assert!(doc.component("Abandoned").is_none());
    }

    #[test]
    fn shared_enricher_caches_rules_across_documents() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static EMITS: AtomicUsize = AtomicUsize::new(0);

        struct Counting;
        impl oas_enrich::RuleSource for Counting {
            fn name(&self) -> &str {
                "counting"
            }
            fn emit(
                &self,
                _: &TypeDescriptor,
            ) -> Result<TypeRules, oas_enrich::SourceError> {
                EMITS.fetch_add(1, Ordering::SeqCst);
                Ok(TypeRules::new()
                    .with_rule(ValidationRule::required("Reference", "Is required")))
            }
        }

        let enricher = Arc::new(Enricher::new(
            Arc::new(order_registry()),
            vec![Arc::new(Counting)],
            EnrichOptions::default(),
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let enricher = Arc::clone(&enricher);
                std::thread::spawn(move || {
                    let mut doc = order_document();
                    enricher.enrich(&mut doc).unwrap();
                    doc
                })
            })
            .collect();

        let results: Vec<Document> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every document enriched identically.
        for window in results.windows(2) {
            assert_eq!(window[0], window[1]);
        }
        // Despite four concurrent builds, rules were computed once per
        // type: Order (plus its nested Customer expansion) and Customer.
        assert_eq!(EMITS.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn discovery_failure_degrades_instead_of_aborting() {
        struct Failing;
        impl oas_enrich::RuleSource for Failing {
            fn name(&self) -> &str {
                "failing"
            }
            fn emit(
                &self,
                _: &TypeDescriptor,
            ) -> Result<TypeRules, oas_enrich::SourceError> {
                Err(oas_enrich::SourceError::new("failing", "no metadata"))
            }
        }

        let working = StaticRuleSource::new("builder").rules_for::<Order>(
            TypeRules::new()
                .with_rule(ValidationRule::string_length("Reference", Some(8), Some(8), "Exactly 8").unwrap()),
        );

        let enricher = Enricher::new(
            Arc::new(order_registry()),
            vec![Arc::new(Failing), Arc::new(working)],
            EnrichOptions::default(),
        );

        let mut doc = order_document();
        enricher.enrich(&mut doc).unwrap();

        let order = doc.component("Order").unwrap().as_inline().unwrap();
        let reference = order.properties["Reference"].as_inline().unwrap();
        assert_eq!(reference.min_length, Some(8));
    }
}
