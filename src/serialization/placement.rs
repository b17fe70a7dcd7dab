//! Decides where every component of a graph is written.
//!
//! A component reached through a single field occurrence is inlined at that occurrence. A
//! component reached through several occurrences is written once, in the `$referenced_components`
//! table of its immediate dominator (the innermost component every path from the root goes
//! through), and replaced by a `$component_ref` everywhere it is used.

use crate::component::Component;
use crate::error::SerializationError;
use ahash::{AHashMap, AHashSet};

const VIRTUAL_ROOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnPath,
    Done,
}

struct Vertex {
    component: Option<Component>,
    parents: Vec<usize>,
    sites: usize,
    preorder: usize,
    visit: Visit,
}

enum Frame {
    Enter(usize),
    Exit(usize),
}

/// Where each shared component of a graph is written.
#[derive(Debug, Default)]
pub(crate) struct Placement {
    /// Shared components keyed by the id of the component whose record holds them.
    hoisted: AHashMap<String, Vec<Component>>,
    /// Shared components dominated by none of the roots.
    top_level: Vec<Component>,
    /// Ids written as `$component_ref`.
    referenced: AHashSet<String>,
    /// Ids of `external` components met while walking the graph.
    external_seen: AHashSet<String>,
}

impl Placement {
    /// Computes the placement of everything reachable from `roots`.
    ///
    /// Components whose id is in `external` are written as references and not descended into,
    /// except where they appear as one of the `roots`.
    pub(crate) fn compute(
        roots: &[Component],
        external: &AHashSet<String>,
    ) -> Result<Self, SerializationError> {
        let mut graph = ReferenceGraph::new();
        graph.walk(roots, external)?;
        Ok(graph.place())
    }

    pub(crate) fn hoisted_in(&self, owner_id: &str) -> &[Component] {
        self.hoisted.get(owner_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn top_level(&self) -> &[Component] {
        &self.top_level
    }

    pub(crate) fn is_referenced(&self, id: &str) -> bool {
        self.referenced.contains(id)
    }

    pub(crate) fn saw_external(&self, id: &str) -> bool {
        self.external_seen.contains(id)
    }
}

struct ReferenceGraph {
    vertices: Vec<Vertex>,
    index: AHashMap<String, usize>,
    postorder: Vec<usize>,
    external_seen: AHashSet<String>,
}

impl ReferenceGraph {
    fn new() -> Self {
        Self {
            vertices: vec![Vertex {
                component: None,
                parents: Vec::new(),
                sites: 0,
                preorder: 0,
                visit: Visit::Unvisited,
            }],
            index: AHashMap::new(),
            postorder: Vec::new(),
            external_seen: AHashSet::new(),
        }
    }

    fn vertex_for(&mut self, component: &Component) -> usize {
        if let Some(&vertex) = self.index.get(component.id()) {
            return vertex;
        }
        let vertex = self.vertices.len();
        self.vertices.push(Vertex {
            component: Some(component.clone()),
            parents: Vec::new(),
            sites: 0,
            preorder: 0,
            visit: Visit::Unvisited,
        });
        self.index.insert(component.id().to_string(), vertex);
        vertex
    }

    /// Records one use site of `child` in `parent`. Fails when `child` is on the current path.
    fn add_site(&mut self, parent: usize, child: &Component) -> Result<usize, SerializationError> {
        let vertex = self.vertex_for(child);
        if self.vertices[vertex].visit == Visit::OnPath {
            return Err(SerializationError::CircularDependency {
                id: child.id().to_string(),
            });
        }
        let entry = &mut self.vertices[vertex];
        entry.sites += 1;
        entry.parents.push(parent);
        Ok(vertex)
    }

    fn walk(
        &mut self,
        roots: &[Component],
        external: &AHashSet<String>,
    ) -> Result<(), SerializationError> {
        let mut preorder = 0;
        let mut stack = vec![Frame::Exit(VIRTUAL_ROOT)];
        self.vertices[VIRTUAL_ROOT].visit = Visit::OnPath;
        for root in roots.iter().rev() {
            let vertex = self.add_site(VIRTUAL_ROOT, root)?;
            stack.push(Frame::Enter(vertex));
        }

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(vertex) => {
                    if self.vertices[vertex].visit != Visit::Unvisited {
                        continue;
                    }
                    preorder += 1;
                    self.vertices[vertex].visit = Visit::OnPath;
                    self.vertices[vertex].preorder = preorder;
                    stack.push(Frame::Exit(vertex));

                    let references = match &self.vertices[vertex].component {
                        Some(component) => component.references(),
                        None => Vec::new(),
                    };
                    let mut children = Vec::with_capacity(references.len());
                    for child in &references {
                        if external.contains(child.id()) {
                            self.external_seen.insert(child.id().to_string());
                            continue;
                        }
                        children.push(self.add_site(vertex, child)?);
                    }
                    // Reversed so that children are entered in field order.
                    stack.extend(children.into_iter().rev().map(Frame::Enter));
                }
                Frame::Exit(vertex) => {
                    self.vertices[vertex].visit = Visit::Done;
                    self.postorder.push(vertex);
                }
            }
        }
        Ok(())
    }

    /// Immediate dominators, computed in reverse postorder (a topological order of the DAG).
    fn immediate_dominators(&self) -> Vec<usize> {
        let count = self.vertices.len();
        let mut idom = vec![VIRTUAL_ROOT; count];
        let mut depth = vec![0usize; count];

        for &vertex in self.postorder.iter().rev() {
            if vertex == VIRTUAL_ROOT {
                continue;
            }
            let mut parents = self.vertices[vertex].parents.iter().copied();
            let Some(first) = parents.next() else {
                continue;
            };
            let dominator = parents.fold(first, |a, b| common_dominator(&idom, &depth, a, b));
            idom[vertex] = dominator;
            depth[vertex] = depth[dominator] + 1;
        }
        idom
    }

    fn place(self) -> Placement {
        let idom = self.immediate_dominators();
        let mut placement = Placement {
            external_seen: self.external_seen,
            ..Placement::default()
        };

        let mut shared: Vec<(usize, usize)> = self
            .vertices
            .iter()
            .enumerate()
            .filter(|(vertex, entry)| *vertex != VIRTUAL_ROOT && entry.sites > 1)
            .map(|(vertex, entry)| (entry.preorder, vertex))
            .collect();
        shared.sort_unstable();

        for (_, vertex) in shared {
            let Some(component) = self.vertices[vertex].component.clone() else {
                continue;
            };
            placement.referenced.insert(component.id().to_string());
            match &self.vertices[idom[vertex]].component {
                Some(owner) => placement
                    .hoisted
                    .entry(owner.id().to_string())
                    .or_default()
                    .push(component),
                None => placement.top_level.push(component),
            }
        }

        tracing::debug!(
            components = self.vertices.len() - 1,
            shared = placement.referenced.len(),
            "computed component placement"
        );
        placement
    }
}

fn common_dominator(idom: &[usize], depth: &[usize], mut a: usize, mut b: usize) -> usize {
    while a != b {
        if depth[a] >= depth[b] {
            a = idom[a];
        } else {
            b = idom[b];
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::llms::LlmConfig;
    use crate::tools::Tool;
    use std::sync::Arc;

    fn llm() -> Arc<LlmConfig> {
        Arc::new(LlmConfig::vllm("llm", "http://localhost:8000", "model"))
    }

    #[test]
    fn single_use_components_are_inlined() {
        let agent = Arc::new(Agent::new("agent", llm(), "Be helpful"));
        let placement = Placement::compute(&[agent.into()], &AHashSet::new()).unwrap();
        assert!(placement.referenced.is_empty());
        assert!(placement.top_level().is_empty());
    }

    #[test]
    fn shared_component_is_hoisted_to_common_owner() {
        let tool = Arc::new(Tool::server("search"));
        let agent = Arc::new(Agent::new("agent", llm(), "Be helpful").with_tools(vec![tool.clone(), tool.clone()]));
        let agent_id = agent.base.id.clone();
        let placement = Placement::compute(&[agent.into()], &AHashSet::new()).unwrap();
        assert!(placement.is_referenced(&tool.base.id));
        assert_eq!(placement.hoisted_in(&agent_id).len(), 1);
    }

    #[test]
    fn components_shared_across_roots_are_top_level() {
        let config = llm();
        let first = Arc::new(Agent::new("first", config.clone(), "One"));
        let second = Arc::new(Agent::new("second", config.clone(), "Two"));
        let placement =
            Placement::compute(&[first.into(), second.into()], &AHashSet::new()).unwrap();
        assert_eq!(placement.top_level().len(), 1);
        assert_eq!(placement.top_level()[0].id(), config.base.id);
    }

    #[test]
    fn external_components_are_not_descended() {
        let config = llm();
        let agent = Arc::new(Agent::new("agent", config.clone(), "Be helpful"));
        let external: AHashSet<String> = [config.base.id.clone()].into_iter().collect();
        let placement = Placement::compute(&[agent.into()], &external).unwrap();
        assert!(placement.saw_external(&config.base.id));
        assert!(!placement.is_referenced(&config.base.id));
    }
}
