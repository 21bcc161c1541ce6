//! Component reachability pruning - mark-and-sweep over the schema graph.
//!
//! The walk starts from every schema an operation can reach (parameters,
//! request bodies, responses, headers, multipart-encoding headers) and
//! follows every structural edge. Components no walk reaches are deleted.
//! Cyclic schemas are expected; a visited-names set keeps the walk finite.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::schema::{Document, Operation, Parameter, Response, SchemaNode};

/// Delete every component no operation can reach.
///
/// Live components keep their relative order. Running `prune` on an
/// already-pruned document is a no-op.
pub fn prune(document: &mut Document) {
    let live = reachable_components(document);

    let before = document.components.schemas.len();
    document
        .components
        .schemas
        .retain(|name, _| live.contains(name));

    let removed = before - document.components.schemas.len();
    if removed > 0 {
        debug!(removed, retained = live.len(), "pruned unreachable components");
    }
}

/// The set of component names reachable from the document's operations.
pub fn reachable_components(document: &Document) -> HashSet<String> {
    let mut visited = HashSet::new();
    let components = &document.components.schemas;

    for path_item in document.paths.values() {
        for parameter in &path_item.parameters {
            visit_parameter(parameter, components, &mut visited);
        }
        for (_, operation) in path_item.operations() {
            visit_operation(operation, components, &mut visited);
        }
    }

    visited
}

fn visit_operation(
    operation: &Operation,
    components: &IndexMap<String, SchemaNode>,
    visited: &mut HashSet<String>,
) {
    for parameter in &operation.parameters {
        visit_parameter(parameter, components, visited);
    }

    if let Some(body) = &operation.request_body {
        for media in body.content.values() {
            if let Some(schema) = &media.schema {
                visit_schema(schema, components, visited);
            }
            for encoding in media.encoding.values() {
                for header in encoding.headers.values() {
                    if let Some(schema) = &header.schema {
                        visit_schema(schema, components, visited);
                    }
                }
            }
        }
    }

    for response in operation.responses.values() {
        visit_response(response, components, visited);
    }
}

fn visit_parameter(
    parameter: &Parameter,
    components: &IndexMap<String, SchemaNode>,
    visited: &mut HashSet<String>,
) {
    if let Some(schema) = &parameter.schema {
        visit_schema(schema, components, visited);
    }
}

fn visit_response(
    response: &Response,
    components: &IndexMap<String, SchemaNode>,
    visited: &mut HashSet<String>,
) {
    for header in response.headers.values() {
        if let Some(schema) = &header.schema {
            visit_schema(schema, components, visited);
        }
    }
    for media in response.content.values() {
        if let Some(schema) = &media.schema {
            visit_schema(schema, components, visited);
        }
        for encoding in media.encoding.values() {
            for header in encoding.headers.values() {
                if let Some(schema) = &header.schema {
                    visit_schema(schema, components, visited);
                }
            }
        }
    }
}

/// Follow every structural edge out of a schema node.
///
/// A reference marks its component live and the walk continues into that
/// component's node, unless the name was already visited (cycles).
fn visit_schema(
    node: &SchemaNode,
    components: &IndexMap<String, SchemaNode>,
    visited: &mut HashSet<String>,
) {
    match node {
        SchemaNode::Reference(reference) => {
            let Some(name) = reference.component_name() else {
                return;
            };
            if !visited.insert(name.to_string()) {
                return;
            }
            if let Some(component) = components.get(name) {
                visit_schema(component, components, visited);
            }
        }
        SchemaNode::Inline(inline) => {
            for property in inline.properties.values() {
                visit_schema(property, components, visited);
            }
            if let Some(items) = &inline.items {
                visit_schema(items, components, visited);
            }
            if let Some(additional) = &inline.additional_properties {
                visit_schema(additional, components, visited);
            }
            for branch in inline
                .one_of
                .iter()
                .chain(&inline.all_of)
                .chain(&inline.any_of)
            {
                visit_schema(branch, components, visited);
            }
            if let Some(not) = &inline.not {
                visit_schema(not, components, visited);
            }
        }
        SchemaNode::Bool(_) => {}
    }
}
