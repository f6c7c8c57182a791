// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! DAG (Directed Acyclic Graph) builder for workflow dependencies
//!
//! Builds and validates the data-dependency graph of a workflow. Steps run
//! in the order they were appended, so beyond acyclicity every consumed
//! output must come from a step appended earlier.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::errors::HypoflowError;
use crate::pipeline::builder::StepPlan;
use crate::pipeline::context::Dependency;

/// Kind of edge between two steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Output is required input
    Data,
    /// Output is read if present
    OptionalData,
    /// Output is read by the gate predicate
    Gate,
}

/// Builder for step dependency DAGs
pub struct DagBuilder {
    graph: DiGraph<usize, EdgeKind>,
    id_to_index: HashMap<String, NodeIndex>,
    index_to_id: HashMap<NodeIndex, String>,
}

impl DagBuilder {
    /// Create a new DAG builder
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_to_index: HashMap::new(),
            index_to_id: HashMap::new(),
        }
    }

    /// Build a DAG from step plans given in execution order
    pub fn build(plans: &[StepPlan]) -> Result<Self, HypoflowError> {
        let mut builder = Self::new();

        // Add all steps as nodes
        for (position, plan) in plans.iter().enumerate() {
            if builder.id_to_index.contains_key(plan.id) {
                return Err(HypoflowError::DuplicateStep {
                    step: plan.id.to_string(),
                });
            }
            let node = builder.graph.add_node(position);
            builder.id_to_index.insert(plan.id.to_string(), node);
            builder.index_to_id.insert(node, plan.id.to_string());
        }

        // Add dependency edges
        for plan in plans {
            let step_node = builder.id_to_index[plan.id];

            let data = plan.dependencies.iter().map(|dep| {
                let kind = if dep.is_optional() {
                    EdgeKind::OptionalData
                } else {
                    EdgeKind::Data
                };
                (dep, kind)
            });
            let gate = plan
                .gate
                .iter()
                .flat_map(|(_, reads)| reads.iter().map(|dep| (dep, EdgeKind::Gate)));

            for (dep, kind) in data.chain(gate) {
                let dep_node = *builder.id_to_index.get(dep.step_id()).ok_or_else(|| {
                    HypoflowError::UnknownDependency {
                        step: plan.id.to_string(),
                        dependency: dep.step_id().to_string(),
                    }
                })?;

                if !builder.graph.contains_edge(dep_node, step_node) {
                    builder.graph.add_edge(dep_node, step_node, kind);
                }
            }
        }

        builder.validate_acyclic()?;
        builder.validate_order(plans)?;

        Ok(builder)
    }

    /// Validate that the graph is acyclic
    fn validate_acyclic(&self) -> Result<(), HypoflowError> {
        toposort(&self.graph, None).map(|_| ()).map_err(|cycle| {
            HypoflowError::CircularDependency {
                steps: self.find_cycle_members(cycle.node_id()),
            }
        })
    }

    /// Validate that producers run before consumers and that required
    /// inputs never come from a gated step
    fn validate_order(&self, plans: &[StepPlan]) -> Result<(), HypoflowError> {
        for edge in self.graph.edge_references() {
            let producer = &plans[self.graph[edge.source()]];
            let consumer = &plans[self.graph[edge.target()]];

            if self.graph[edge.source()] >= self.graph[edge.target()] {
                return Err(HypoflowError::ForwardDependency {
                    step: consumer.id.to_string(),
                    dependency: producer.id.to_string(),
                });
            }

            if producer.is_gated() && *edge.weight() != EdgeKind::OptionalData {
                return Err(HypoflowError::RequiredGatedDependency {
                    step: consumer.id.to_string(),
                    dependency: producer.id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Find all steps in the strongly connected component containing `start`
    fn find_cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let mut members: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .find(|component| component.contains(&start))
            .unwrap_or_else(|| vec![start]);

        members.sort_by_key(|n| self.graph[*n]);
        members
            .into_iter()
            .map(|n| self.index_to_id[&n].clone())
            .collect()
    }

    /// Step ids in a topological order
    pub fn topological_order_ids(&self) -> Result<Vec<String>, HypoflowError> {
        toposort(&self.graph, None)
            .map(|nodes| {
                nodes
                    .into_iter()
                    .map(|n| self.index_to_id[&n].clone())
                    .collect()
            })
            .map_err(|cycle| HypoflowError::CircularDependency {
                steps: self.find_cycle_members(cycle.node_id()),
            })
    }

    /// Get dependencies for a step (steps whose output it reads)
    pub fn dependencies(&self, step_id: &str) -> Option<Vec<String>> {
        self.neighbors(step_id, petgraph::Direction::Incoming)
    }

    /// Get dependents for a step (steps that read its output)
    pub fn dependents(&self, step_id: &str) -> Option<Vec<String>> {
        self.neighbors(step_id, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, step_id: &str, direction: petgraph::Direction) -> Option<Vec<String>> {
        let node = self.id_to_index.get(step_id)?;
        let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(*node, direction).collect();
        nodes.sort_by_key(|n| self.graph[*n]);
        Some(nodes.into_iter().map(|n| self.index_to_id[&n].clone()).collect())
    }

    /// Check if step A depends (directly or transitively) on step B
    pub fn depends_on(&self, step_a: &str, step_b: &str) -> bool {
        let Some(node_a) = self.id_to_index.get(step_a) else {
            return false;
        };
        let Some(node_b) = self.id_to_index.get(step_b) else {
            return false;
        };

        petgraph::algo::has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    /// Nodes sorted by execution position
    fn nodes_in_order(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by_key(|n| self.graph[*n]);
        nodes
    }

    /// Edges sorted by (source, target) execution position
    fn edges_in_order(&self) -> Vec<(&str, &str, EdgeKind)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()], e))
            .collect();
        edges.sort_by_key(|(s, t, _)| (*s, *t));
        edges
            .into_iter()
            .map(|(_, _, e)| {
                (
                    self.index_to_id[&e.source()].as_str(),
                    self.index_to_id[&e.target()].as_str(),
                    *e.weight(),
                )
            })
            .collect()
    }

    /// Generate Mermaid diagram of the DAG
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.nodes_in_order() {
            let id = &self.index_to_id[&node];
            out.push_str(&format!("    {}[{}]\n", id, id));
        }

        for (from, to, kind) in self.edges_in_order() {
            let arrow = match kind {
                EdgeKind::Data => "-->",
                EdgeKind::OptionalData => "-.->",
                EdgeKind::Gate => "-->|when|",
            };
            out.push_str(&format!("    {} {} {}\n", from, arrow, to));
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph workflow {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to, kind) in self.edges_in_order() {
            let attrs = match kind {
                EdgeKind::Data => "",
                EdgeKind::OptionalData => " [style=dashed]",
                EdgeKind::Gate => " [label=\"when\", color=gray]",
            };
            out.push_str(&format!("    \"{}\" -> \"{}\"{};\n", from, to, attrs));
        }

        // Isolated nodes (no edges)
        for node in self.nodes_in_order() {
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", self.index_to_id[&node]));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self, plans: &[StepPlan]) -> String {
        let mut out = String::new();

        for (i, plan) in plans.iter().enumerate() {
            out.push_str(&format!("{}. {} ({})", i + 1, plan.id, plan.name));

            if !plan.dependencies.is_empty() {
                let deps: Vec<String> = plan
                    .dependencies
                    .iter()
                    .map(|d| match d {
                        Dependency::Required(id) => id.to_string(),
                        Dependency::Optional(id) => format!("{}?", id),
                    })
                    .collect();
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            if let Some((label, _)) = &plan.gate {
                out.push_str(&format!(" [when: {}]", label));
            }

            out.push('\n');
        }

        out
    }
}

impl Default for DagBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(id: &'static str, deps: Vec<Dependency>) -> StepPlan {
        StepPlan {
            id,
            name: id,
            description: "",
            dependencies: deps,
            gate: None,
        }
    }

    fn gated(id: &'static str, reads: Vec<Dependency>) -> StepPlan {
        StepPlan {
            gate: Some(("check".into(), reads)),
            ..plan(id, vec![])
        }
    }

    use Dependency::{Optional, Required};

    #[test]
    fn test_linear_dag() {
        let plans = vec![
            plan("a", vec![]),
            plan("b", vec![Required("a")]),
            plan("c", vec![Required("b")]),
        ];

        let dag = DagBuilder::build(&plans).unwrap();
        assert_eq!(dag.topological_order_ids().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_diamond_dag() {
        let plans = vec![
            plan("a", vec![]),
            plan("b", vec![Required("a")]),
            plan("c", vec![Required("a")]),
            plan("d", vec![Required("b"), Required("c")]),
        ];

        let dag = DagBuilder::build(&plans).unwrap();
        let order = dag.topological_order_ids().unwrap();

        assert_eq!(order[0], "a");
        assert_eq!(order[3], "d");
        assert_eq!(dag.dependencies("d").unwrap(), vec!["b", "c"]);
        assert_eq!(dag.dependents("a").unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_circular_dependency_detection() {
        let plans = vec![plan("a", vec![Required("b")]), plan("b", vec![Required("a")])];

        let result = DagBuilder::build(&plans);
        assert!(matches!(
            result,
            Err(HypoflowError::CircularDependency { ref steps }) if steps == &["a", "b"]
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let plans = vec![plan("a", vec![Required("a")])];
        assert!(matches!(
            DagBuilder::build(&plans),
            Err(HypoflowError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_unknown_dependency() {
        let plans = vec![plan("a", vec![Required("nonexistent")])];

        let result = DagBuilder::build(&plans);
        assert!(matches!(result, Err(HypoflowError::UnknownDependency { .. })));
    }

    #[test]
    fn test_forward_dependency() {
        let plans = vec![plan("a", vec![Required("b")]), plan("b", vec![])];

        let result = DagBuilder::build(&plans);
        assert!(matches!(
            result,
            Err(HypoflowError::ForwardDependency { ref step, ref dependency })
                if step == "a" && dependency == "b"
        ));
    }

    #[test]
    fn test_duplicate_step() {
        let plans = vec![plan("a", vec![]), plan("a", vec![])];
        assert!(matches!(
            DagBuilder::build(&plans),
            Err(HypoflowError::DuplicateStep { .. })
        ));
    }

    #[test]
    fn test_required_input_from_gated_step_is_rejected() {
        let plans = vec![
            plan("a", vec![]),
            gated("b", vec![Required("a")]),
            plan("c", vec![Required("b")]),
        ];

        assert!(matches!(
            DagBuilder::build(&plans),
            Err(HypoflowError::RequiredGatedDependency { .. })
        ));
    }

    #[test]
    fn test_optional_input_from_gated_step_is_accepted() {
        let plans = vec![
            plan("a", vec![]),
            gated("b", vec![Required("a")]),
            plan("c", vec![Required("a"), Optional("b")]),
        ];

        let dag = DagBuilder::build(&plans).unwrap();
        assert!(dag.depends_on("c", "b"));
        assert!(dag.depends_on("b", "a"));
        assert!(!dag.depends_on("a", "c"));
    }

    #[test]
    fn test_mermaid_output() {
        let plans = vec![
            plan("a", vec![]),
            gated("b", vec![Required("a")]),
            plan("c", vec![Required("a"), Optional("b")]),
        ];

        let mermaid = DagBuilder::build(&plans).unwrap().to_mermaid();

        assert!(mermaid.starts_with("graph TD\n"));
        assert!(mermaid.contains("a -->|when| b"));
        assert!(mermaid.contains("a --> c"));
        assert!(mermaid.contains("b -.-> c"));
    }

    #[test]
    fn test_dot_output_lists_isolated_nodes() {
        let plans = vec![plan("a", vec![]), plan("lonely", vec![]), plan("b", vec![Required("a")])];

        let dot = DagBuilder::build(&plans).unwrap().to_dot();
        assert!(dot.contains("\"a\" -> \"b\";"));
        assert!(dot.contains("    \"lonely\";"));
    }

    #[test]
    fn test_text_output() {
        let plans = vec![
            plan("a", vec![]),
            gated("b", vec![Required("a")]),
            plan("c", vec![Required("a"), Optional("b")]),
        ];

        let text = DagBuilder::build(&plans).unwrap().to_text(&plans);
        assert_eq!(
            text,
            "1. a (a)\n2. b (b) [when: check]\n3. c (c) [depends: a, b?]\n"
        );
    }
}
