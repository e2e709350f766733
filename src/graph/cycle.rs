//! Cycle detection utilities for the resource graph.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::resource::{ResourceDeclaration, ResourceName};

/// Tracks the visitation state of a node during cycle detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

pub(crate) struct CycleDetectionReport {
    pub(crate) cycle: Option<Vec<ResourceName>>,
    pub(crate) missing_dependencies: Vec<(ResourceName, ResourceName)>,
}

pub(crate) fn analyse(
    resources: &IndexMap<ResourceName, ResourceDeclaration>,
) -> CycleDetectionReport {
    let mut detector = CycleDetector::new(resources);
    let mut cycle = None;
    for node in resources.keys() {
        if detector.is_visited(node) {
            continue;
        }
        if let Some(found) = detector.visit(node.clone()) {
            cycle = Some(found);
            break;
        }
    }
    CycleDetectionReport {
        cycle,
        missing_dependencies: detector.missing_dependencies,
    }
}

struct CycleDetector<'a> {
    resources: &'a IndexMap<ResourceName, ResourceDeclaration>,
    stack: Vec<ResourceName>,
    states: HashMap<ResourceName, VisitState>,
    missing_dependencies: Vec<(ResourceName, ResourceName)>,
}

impl<'a> CycleDetector<'a> {
    fn new(resources: &'a IndexMap<ResourceName, ResourceDeclaration>) -> Self {
        Self {
            resources,
            stack: Vec::new(),
            states: HashMap::new(),
            missing_dependencies: Vec::new(),
        }
    }

    fn is_visited(&self, node: &ResourceName) -> bool {
        matches!(self.states.get(node), Some(VisitState::Visited))
    }

    fn visit(&mut self, node: ResourceName) -> Option<Vec<ResourceName>> {
        match self.states.get(&node) {
            Some(VisitState::Visited) => return None,
            Some(VisitState::Visiting) => {
                let idx = self
                    .stack
                    .iter()
                    .position(|n| n == &node)
                    .unwrap_or_else(|| {
                        debug_assert!(false, "visiting node must be on the stack");
                        0
                    });
                let mut cycle: Vec<ResourceName> = self.stack.iter().skip(idx).cloned().collect();
                cycle.push(node);
                return Some(canonicalize_cycle(cycle));
            }
            None => {
                self.states.insert(node.clone(), VisitState::Visiting);
            }
        }

        self.stack.push(node.clone());

        if let Some(declaration) = self.resources.get(&node) {
            for dep in declaration.dependencies() {
                if !self.resources.contains_key(dep) {
                    tracing::debug!(
                        missing = %dep,
                        dependent = %node,
                        "skipping dependency missing from registry during cycle detection",
                    );
                    self.missing_dependencies.push((node.clone(), dep.clone()));
                    continue;
                }

                if let Some(cycle) = self.visit(dep.clone()) {
                    return Some(cycle);
                }
            }
        }

        self.stack.pop();
        self.states.insert(node, VisitState::Visited);
        None
    }

    #[cfg(test)]
    fn missing_dependencies(&self) -> &[(ResourceName, ResourceName)] {
        &self.missing_dependencies
    }

    #[cfg(test)]
    fn find_cycle(
        resources: &'a IndexMap<ResourceName, ResourceDeclaration>,
    ) -> Option<Vec<ResourceName>> {
        analyse(resources).cycle
    }
}

fn canonicalize_cycle(mut cycle: Vec<ResourceName>) -> Vec<ResourceName> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.as_str().cmp(b.as_str()))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::resource::{AttrRef, ResourceKind, Value};

    fn name(text: &str) -> ResourceName {
        ResourceName::from(text)
    }

    fn declaration(deps: &[&str], target: &str) -> ResourceDeclaration {
        let mut properties = props! {};
        for (i, dep) in deps.iter().enumerate() {
            properties.insert(
                format!("dep_{i}"),
                Value::Ref(AttrRef {
                    resource: name(dep),
                    path: "id".into(),
                }),
            );
        }
        ResourceDeclaration::new(ResourceKind::Subnet, name(target), properties)
    }

    fn registry(entries: &[(&str, &[&str])]) -> IndexMap<ResourceName, ResourceDeclaration> {
        entries
            .iter()
            .map(|(target, deps)| (name(target), declaration(deps, target)))
            .collect()
    }

    #[test]
    fn cycle_detector_detects_self_edge_cycle() {
        let resources = registry(&[("a", &["a"])]);

        let cycle = CycleDetector::find_cycle(&resources).expect("cycle");
        assert_eq!(cycle, vec![name("a"), name("a")]);
    }

    #[test]
    fn cycle_detector_marks_nodes_visited_after_traversal() {
        let resources = registry(&[("a", &["b"]), ("b", &[])]);

        let mut detector = CycleDetector::new(&resources);
        assert!(detector.visit(name("a")).is_none());
        assert!(detector.is_visited(&name("a")));
        assert!(detector.is_visited(&name("b")));
        assert!(
            detector.stack.is_empty(),
            "stack should be empty after complete traversal",
        );
    }

    #[test]
    fn cycle_detector_records_missing_dependencies() {
        let resources = registry(&[("a", &["b"])]);

        let mut detector = CycleDetector::new(&resources);
        assert!(detector.visit(name("a")).is_none());

        assert_eq!(detector.missing_dependencies(), &[(name("a"), name("b"))]);
    }

    #[test]
    fn find_cycle_identifies_cycle() {
        let resources = registry(&[("a", &["b"]), ("b", &["a"])]);

        let cycle = CycleDetector::find_cycle(&resources).expect("cycle");
        assert_eq!(cycle, vec![name("a"), name("b"), name("a")]);
    }

    #[test]
    fn canonicalize_cycle_rotates_smallest_node() {
        let cycle = vec![name("c"), name("a"), name("b"), name("c")];
        let canonical = canonicalize_cycle(cycle);
        let expected = vec![name("a"), name("b"), name("c"), name("a")];
        assert_eq!(canonical, expected);
    }

    #[test]
    fn canonicalize_cycle_handles_reverse_direction() {
        let cycle = vec![name("c"), name("b"), name("a"), name("c")];
        let canonical = canonicalize_cycle(cycle);
        let expected = vec![name("a"), name("c"), name("b"), name("a")];
        assert_eq!(canonical, expected);
    }
}
