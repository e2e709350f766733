//! Resource graph construction and validation.
//!
//! The [`StackGraph`] is the single component everything else feeds:
//! declarations are appended in program order, deferred references are
//! checked against the registry as they arrive, and a whole-graph
//! [`StackGraph::validate`] pass re-checks structural integrity (acyclic,
//! every reference resolvable) before the graph is handed to the engine.
//! The graph performs no I/O and no provisioning; failure recovery during
//! an actual apply is the engine's responsibility.
//!
//! # Examples
//!
//! ```
//! use kumo::graph::StackGraph;
//! use kumo::props;
//! use kumo::resource::ResourceKind;
//!
//! let mut graph = StackGraph::new("dev");
//! let rg = graph
//!     .declare(ResourceKind::ResourceGroup, "rg", props! { "location" => "westeurope" })
//!     .expect("declare");
//! graph
//!     .declare(ResourceKind::VirtualNetwork, "vnet", props! {
//!         "resource_group_name" => rg.output("name"),
//!     })
//!     .expect("declare");
//! graph.export("resourceGroupName", rg.output("name")).expect("export");
//! graph.validate().expect("valid");
//! ```

use indexmap::IndexMap;
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::resource::{
    Props, ResourceDeclaration, ResourceHandle, ResourceKind, ResourceName, Value,
};

mod cycle;

/// Structural errors raised while building or validating the graph.
///
/// All variants are synchronous construction failures; none are retried and
/// none are recoverable within this component.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// A logical name was declared twice.
    #[error("resource '{name}' is already declared as {existing}, cannot redeclare as {incoming}")]
    #[diagnostic(
        code(kumo::graph::duplicate_name),
        help("logical names must be unique within a stack")
    )]
    DuplicateName {
        /// The colliding logical name.
        name: ResourceName,
        /// Kind of the declaration already registered.
        existing: ResourceKind,
        /// Kind of the rejected declaration.
        incoming: ResourceKind,
    },

    /// An export label was bound twice.
    #[error("export '{label}' is already bound")]
    #[diagnostic(code(kumo::graph::duplicate_export))]
    DuplicateExport {
        /// The colliding export label.
        label: String,
    },

    /// A reference names a resource that is not (yet) declared, or carries
    /// an empty attribute path.
    #[error("unresolved reference to '{resource}' (attribute '{path}')")]
    #[diagnostic(
        code(kumo::graph::unresolved_dependency),
        help("resources can only reference declarations made earlier in the program")
    )]
    UnresolvedDependency {
        /// The referenced producer name.
        resource: ResourceName,
        /// The referenced attribute path.
        path: String,
    },

    /// The reference edges form a cycle.
    #[error("circular dependency: {}", .cycle.iter().join(" -> "))]
    #[diagnostic(code(kumo::graph::circular_dependency))]
    CircularDependency {
        /// The cycle, canonicalized to start at its smallest node and
        /// closed by repeating that node.
        cycle: Vec<ResourceName>,
    },
}

/// A dependency-aware registry of resource declarations and output bindings.
///
/// Declarations are registered in topological order by construction: a
/// declaration may only reference declarations already in the registry, so
/// the graph is a DAG the moment it is complete. The builder is a pure
/// in-memory assembly step; its only consumer is the engine hand-off, run
/// once after construction.
#[derive(Debug, Default)]
pub struct StackGraph {
    stack: String,
    resources: IndexMap<ResourceName, ResourceDeclaration>,
    exports: IndexMap<String, Value>,
}

impl StackGraph {
    /// Create an empty graph for the named stack.
    #[must_use]
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            resources: IndexMap::new(),
            exports: IndexMap::new(),
        }
    }

    /// The stack this graph belongs to.
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Append a declaration and return a handle usable as a dependency
    /// source for later declarations.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateName`] when `name` collides with an
    /// existing declaration, and [`GraphError::UnresolvedDependency`] when a
    /// reference nested in `properties` names a resource that has not been
    /// declared or carries an empty attribute path.
    pub fn declare(
        &mut self,
        kind: ResourceKind,
        name: impl Into<ResourceName>,
        properties: Props,
    ) -> Result<ResourceHandle, GraphError> {
        let name = name.into();
        if let Some(existing) = self.resources.get(&name) {
            return Err(GraphError::DuplicateName {
                name,
                existing: existing.kind(),
                incoming: kind,
            });
        }
        for value in properties.values() {
            self.check_references(value)?;
        }

        let handle = ResourceHandle::new(name.clone(), kind);
        self.resources
            .insert(name.clone(), ResourceDeclaration::new(kind, name, properties));
        Ok(handle)
    }

    /// Record a named output surfaced to the caller after the engine
    /// applies the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateExport`] on a label collision and
    /// [`GraphError::UnresolvedDependency`] when `value` references an
    /// undeclared resource.
    pub fn export(
        &mut self,
        label: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let label = label.into();
        let value = value.into();
        if self.exports.contains_key(&label) {
            return Err(GraphError::DuplicateExport { label });
        }
        self.check_references(&value)?;
        self.exports.insert(label, value);
        Ok(())
    }

    /// Re-check the structural integrity of the whole graph: acyclic, and
    /// every reference resolvable within the registry.
    ///
    /// Declare-time checks already guarantee both properties for graphs
    /// built exclusively through [`StackGraph::declare`]; this pass is the
    /// final gate before the graph is handed to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CircularDependency`] for a reference cycle and
    /// [`GraphError::UnresolvedDependency`] for a dangling reference.
    pub fn validate(&self) -> Result<(), GraphError> {
        let cycle::CycleDetectionReport {
            cycle,
            missing_dependencies,
        } = cycle::analyse(&self.resources);
        if let Some(cycle) = cycle {
            return Err(GraphError::CircularDependency { cycle });
        }
        if let Some((consumer, producer)) = missing_dependencies.into_iter().next() {
            tracing::debug!(consumer = %consumer, producer = %producer, "dangling reference");
            return Err(GraphError::UnresolvedDependency {
                resource: producer,
                path: String::new(),
            });
        }
        for value in self.exports.values() {
            self.check_references(value)?;
        }
        Ok(())
    }

    /// The declarations in registration (dependency) order.
    pub fn declarations(&self) -> impl Iterator<Item = &ResourceDeclaration> {
        self.resources.values()
    }

    /// The recorded output bindings, in registration order.
    pub fn exports(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.exports.iter().map(|(label, value)| (label.as_str(), value))
    }

    /// Look up a declaration by logical name.
    #[must_use]
    pub fn get(&self, name: &ResourceName) -> Option<&ResourceDeclaration> {
        self.resources.get(name)
    }

    /// Number of registered declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the graph holds no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn check_references(&self, value: &Value) -> Result<(), GraphError> {
        let mut dangling = None;
        value.for_each_ref(&mut |attr| {
            if dangling.is_none()
                && (attr.path.is_empty() || !self.resources.contains_key(&attr.resource))
            {
                dangling = Some(attr.clone());
            }
        });
        dangling.map_or(Ok(()), |attr| {
            Err(GraphError::UnresolvedDependency {
                resource: attr.resource,
                path: attr.path,
            })
        })
    }
}
