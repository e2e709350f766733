//! Plan generator.
//!
//! This module converts a validated [`crate::graph::StackGraph`] into the
//! JSON plan consumed by the orchestration engine, plus a DOT rendering of
//! the dependency edges for the `graph` subcommand. Both outputs are
//! deterministic — resources appear in declaration order and edge lists are
//! deduplicated in first-reference order — so they can be snapshot-tested.

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

use crate::graph::StackGraph;
use crate::resource::{Props, ResourceKind, ResourceName, Value};

/// Version tag stamped into every emitted plan.
pub const PLAN_FORMAT_VERSION: &str = "1";

/// Plan serialization failure.
#[derive(Debug, Error)]
#[error("failed to serialise plan")]
pub struct PlanGenError(#[from] serde_json::Error);

#[derive(Serialize)]
struct Plan<'a> {
    format: &'static str,
    stack: &'a str,
    resources: Vec<PlanResource<'a>>,
    exports: IndexMap<&'a str, &'a Value>,
}

#[derive(Serialize)]
struct PlanResource<'a> {
    kind: ResourceKind,
    name: &'a ResourceName,
    properties: &'a Props,
}

/// Generate the engine plan as a pretty-printed JSON string.
///
/// # Errors
///
/// Returns [`PlanGenError`] when serialization fails, which only happens if
/// a property map contains a key that cannot be encoded.
pub fn generate(graph: &StackGraph) -> Result<String, PlanGenError> {
    let plan = Plan {
        format: PLAN_FORMAT_VERSION,
        stack: graph.stack(),
        resources: graph
            .declarations()
            .map(|decl| PlanResource {
                kind: decl.kind(),
                name: decl.name(),
                properties: decl.properties(),
            })
            .collect(),
        exports: graph.exports().collect(),
    };
    Ok(serde_json::to_string_pretty(&plan)?)
}

/// Render the dependency graph in DOT format.
///
/// Each declaration becomes a node labelled with its kind; each distinct
/// consumer/producer pair becomes one edge, regardless of how many
/// attributes are referenced.
#[must_use]
pub fn dot(graph: &StackGraph) -> String {
    DotGraph(graph).to_string()
}

/// Wrapper struct to display a graph in DOT syntax.
struct DotGraph<'a>(&'a StackGraph);

impl Display for DotGraph<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {} {{", DotId(self.0.stack()))?;
        writeln!(f, "    rankdir = LR;")?;
        for decl in self.0.declarations() {
            writeln!(
                f,
                "    {} [shape=box, label=\"{}\\n{}\"];",
                DotId(decl.name().as_str()),
                decl.kind(),
                decl.name(),
            )?;
        }
        let mut seen = HashSet::new();
        for decl in self.0.declarations() {
            for producer in decl.dependencies().iter().dedup() {
                if !seen.insert((decl.name().clone(), (*producer).clone())) {
                    continue;
                }
                writeln!(
                    f,
                    "    {} -> {};",
                    DotId(decl.name().as_str()),
                    DotId(producer.as_str()),
                )?;
            }
        }
        writeln!(f, "}}")
    }
}

/// Quote an identifier for DOT output.
struct DotId<'a>(&'a str);

impl Display for DotId<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.chars() {
            if c == '"' || c == '\\' {
                write!(f, "\\")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use rstest::rstest;

    fn two_node_graph() -> StackGraph {
        let mut graph = StackGraph::new("dev");
        let rg = graph
            .declare(
                ResourceKind::ResourceGroup,
                "rg",
                props! { "location" => "westeurope" },
            )
            .expect("declare");
        graph
            .declare(
                ResourceKind::VirtualNetwork,
                "vnet",
                props! {
                    "resource_group_name" => rg.output("name"),
                    "location" => rg.output("location"),
                },
            )
            .expect("declare");
        graph
            .export("resourceGroupName", rg.output("name"))
            .expect("export");
        graph
    }

    #[rstest]
    fn generate_emits_resources_in_declaration_order() {
        let graph = two_node_graph();
        let plan = generate(&graph).expect("plan");
        let json: serde_json::Value = serde_json::from_str(&plan).expect("json");

        assert_eq!(json["format"], PLAN_FORMAT_VERSION);
        assert_eq!(json["stack"], "dev");
        assert_eq!(json["resources"][0]["kind"], "resource-group");
        assert_eq!(json["resources"][1]["kind"], "virtual-network");
        assert_eq!(
            json["resources"][1]["properties"]["resource_group_name"]["$ref"]["resource"],
            "rg"
        );
        assert_eq!(json["exports"]["resourceGroupName"]["$ref"]["path"], "name");
    }

    #[rstest]
    fn generate_is_deterministic() {
        let graph = two_node_graph();
        assert_eq!(
            generate(&graph).expect("plan"),
            generate(&graph).expect("plan")
        );
    }

    #[rstest]
    fn dot_deduplicates_edges() {
        let graph = two_node_graph();
        let rendered = dot(&graph);
        let expected = concat!(
            "digraph \"dev\" {\n",
            "    rankdir = LR;\n",
            "    \"rg\" [shape=box, label=\"resource-group\\nrg\"];\n",
            "    \"vnet\" [shape=box, label=\"virtual-network\\nvnet\"];\n",
            "    \"vnet\" -> \"rg\";\n",
            "}\n"
        );
        assert_eq!(rendered, expected);
    }
}
