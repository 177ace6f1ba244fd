//! Class hierarchy graph.
//!
//! Links loaded classes through their `extends`/`implements` edges. Names that
//! are not part of the analyzed set become [`ExternalTypeRef`] leaves. The graph
//! is built once, checked for cycles, and only read afterwards.

use crate::error::ResolveError;
use crate::types::ClassDescriptor;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

mod registry;


pub use registry::{ExternalTypeRegistry, PAPER_PLATFORM_TYPES};

pub const OBJECT_CLASS: &str = "java.lang.Object";
pub const RECORD_CLASS: &str = "java.lang.Record";

/// Index of a node in [`HierarchyGraph::nodes`].
pub type NodeId = usize;

/// A type outside the analyzed class set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTypeRef {
    pub name: String,
    /// Whether the registry knows this type
    pub recognized: bool,
}

/// Target of a hierarchy edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Class(NodeId),
    External(ExternalTypeRef),
}

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub descriptor: ClassDescriptor,
    /// `None` when the superclass is absent or a designated root
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    enclosing: Option<NodeId>,
    nested: Vec<NodeId>,
}

impl HierarchyNode {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Parent first, then interfaces in declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.parent.iter().chain(self.interfaces.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyGraph {
    nodes: Vec<HierarchyNode>,
    index: FxHashMap<String, NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

impl HierarchyGraph {
    /// Link every descriptor and verify the result is acyclic.
    ///
    /// Nodes are ordered by class name, so the graph (and any reported cycle)
    /// does not depend on the order of `classes`.
    pub fn build(mut classes: Vec<ClassDescriptor>, registry: &ExternalTypeRegistry) -> Result<Self, ResolveError> {
        let _span = tracing::info_span!("build_graph", classes = classes.len()).entered();

        classes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.origin.cmp(&b.origin)));
        classes.dedup_by(|later, first| {
            let duplicate = later.name == first.name;
            if duplicate {
                debug!("Dropping second definition of {} from {}", later.name, later.origin);
            }
            duplicate
        });

        let index: FxHashMap<String, NodeId> = classes
            .iter()
            .enumerate()
            .map(|(id, class)| (class.name.clone(), id))
            .collect();

        let resolve = |name: &str| -> TypeRef {
            match index.get(name) {
                Some(id) => TypeRef::Class(*id),
                None => TypeRef::External(ExternalTypeRef {
                    name: name.to_string(),
                    recognized: registry.is_recognized(name),
                }),
            }
        };

        let mut nodes: Vec<HierarchyNode> = classes
            .into_iter()
            .map(|descriptor| {
                let parent = descriptor
                    .superclass
                    .as_deref()
                    .filter(|name| !registry.is_root(name))
                    .map(&resolve);
                let interfaces = descriptor.interfaces.iter().map(|name| resolve(name)).collect();
                HierarchyNode {
                    descriptor,
                    parent,
                    interfaces,
                    enclosing: None,
                    nested: Vec::new(),
                }
            })
            .collect();

        for id in 0..nodes.len() {
            let outer = nodes[id]
                .descriptor
                .enclosing
                .as_deref()
                .and_then(|name| index.get(name).copied());
            if let Some(outer) = outer.filter(|outer| *outer != id) {
                nodes[id].enclosing = Some(outer);
                nodes[outer].nested.push(id);
            }
        }

        let graph = Self { nodes, index };
        graph.check_acyclic()?;

        debug!(
            "Hierarchy graph: {} classes, {} unrecognized external types",
            graph.nodes.len(),
            graph.unrecognized_externals().len()
        );
        Ok(graph)
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id]
    }

    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn type_name<'a>(&'a self, type_ref: &'a TypeRef) -> &'a str {
        match type_ref {
            TypeRef::Class(id) => self.nodes[*id].name(),
            TypeRef::External(external) => &external.name,
        }
    }

    /// Outer class of a nested class, when the outer class was analyzed too.
    pub fn enclosing(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].enclosing
    }

    pub fn nested(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].nested
    }

    /// Outermost analyzed class that (transitively) encloses `id`, or `id` itself.
    pub fn top_level(&self, mut id: NodeId) -> NodeId {
        let mut hops = 0;
        while let Some(outer) = self.nodes[id].enclosing {
            id = outer;
            hops += 1;
            // Enclosing links come from class attributes and are not
            // validated like the inheritance edges.
            if hops > self.nodes.len() {
                break;
            }
        }
        id
    }

    /// Sorted names of external supertypes the registry does not know.
    pub fn unrecognized_externals(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .nodes
            .iter()
            .flat_map(HierarchyNode::supertypes)
            .filter_map(|type_ref| match type_ref {
                TypeRef::External(external) if !external.recognized => Some(external.name.as_str()),
                _ => None,
            })
            .collect();
        names.into_iter().collect()
    }

    fn class_supertypes(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id]
            .supertypes()
            .filter_map(|type_ref| match type_ref {
                TypeRef::Class(target) => Some(*target),
                TypeRef::External(_) => None,
            })
            .collect()
    }

    /// Depth-first walk over `extends` and `implements` edges.
    fn check_acyclic(&self) -> Result<(), ResolveError> {
        let mut state = vec![Visit::New; self.nodes.len()];

        for start in 0..self.nodes.len() {
            if state[start] != Visit::New {
                continue;
            }
            state[start] = Visit::OnPath;
            let mut stack: Vec<(NodeId, Vec<NodeId>)> = vec![(start, self.class_supertypes(start))];

            while let Some((node, pending)) = stack.last_mut() {
                let node = *node;
                let Some(next) = pending.pop() else {
                    state[node] = Visit::Done;
                    stack.pop();
                    continue;
                };
                match state[next] {
                    Visit::New => {
                        state[next] = Visit::OnPath;
                        stack.push((next, self.class_supertypes(next)));
                    }
                    Visit::OnPath => {
                        let path: Vec<NodeId> = stack.iter().map(|(id, _)| *id).collect();
                        let from = path.iter().position(|id| *id == next).unwrap_or(0);
                        return Err(self.cycle_error(&path[from..]));
                    }
                    Visit::Done => {}
                }
            }
        }
        Ok(())
    }

    /// Rotate the cycle to start at its smallest name and close it.
    fn cycle_error(&self, cycle: &[NodeId]) -> ResolveError {
        let names: Vec<&str> = cycle.iter().map(|id| self.nodes[*id].name()).collect();
        let start = names
            .iter()
            .enumerate()
            .min_by_key(|(_, name)| **name)
            .map_or(0, |(position, _)| position);
        let mut cycle: Vec<String> = names[start..]
            .iter()
            .chain(names[..start].iter())
            .map(|name| name.to_string())
            .collect();
        if let Some(first) = cycle.first().cloned() {
            cycle.push(first);
        }
        ResolveError::CyclicHierarchy { cycle }
    }
}
