use crate::compiler::source_registry::SourceId;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// How an `insert` call changed the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A fresh node was created and wired under the parent. The caller is
    /// responsible for parsing the new module.
    New,
    /// The child already existed elsewhere in the graph (shared inclusion);
    /// only the edge was added.
    Shared,
    /// The child sits on the parent's ancestor chain. No edge was added;
    /// reported as a semantic error by the caller.
    Cycle,
    /// The parent already lists this child. No second edge; reported as a
    /// warning by the caller.
    Duplicate,
}

#[derive(Debug)]
struct DependencyNode {
    path: PathBuf,
    source: SourceId,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// The include graph: one node per canonical module path, children owned
/// by index, parent links weak (indices, never followed for ownership).
/// Acyclic by construction - insertion refuses edges that would close a
/// cycle.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    node_map: FxHashMap<PathBuf, usize>,
    entry: Option<usize>,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph::default()
    }

    /// Establish the root module. The path must already be canonical (the
    /// source registry canonicalizes on create).
    pub fn set_entry(&mut self, path: PathBuf, source: SourceId) {
        debug_assert!(self.entry.is_none(), "entry module set twice");
        let index = self.add_node(path, source, None);
        self.entry = Some(index);
    }

    pub fn entry_path(&self) -> Option<&Path> {
        self.entry.map(|index| self.nodes[index].path.as_path())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.node_map.contains_key(path)
    }

    pub fn source_for(&self, path: &Path) -> Option<SourceId> {
        self.node_map
            .get(path)
            .map(|&index| self.nodes[index].source)
    }

    fn add_node(&mut self, path: PathBuf, source: SourceId, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.node_map.insert(path.clone(), index);
        self.nodes.push(DependencyNode {
            path,
            source,
            parent,
            children: Vec::new(),
        });
        index
    }

    /// Create or reuse a child node under `parent_path` and wire the edge.
    /// The parent must already be registered; including an ancestor is a
    /// cycle, including the same child twice from one parent a duplicate.
    pub fn insert(
        &mut self,
        parent_path: &Path,
        child_path: PathBuf,
        child_source: SourceId,
    ) -> InsertOutcome {
        let parent_index = *self
            .node_map
            .get(parent_path)
            .expect("include parent must be registered before its children");

        // Walk the ancestor chain looking for the proposed path.
        let mut search = Some(parent_index);
        while let Some(index) = search {
            if self.nodes[index].path == child_path {
                return InsertOutcome::Cycle;
            }
            search = self.nodes[index].parent;
        }

        if let Some(&existing) = self.node_map.get(&child_path) {
            if self.nodes[parent_index].children.contains(&existing) {
                return InsertOutcome::Duplicate;
            }
            self.nodes[parent_index].children.push(existing);
            return InsertOutcome::Shared;
        }

        let child_index = self.add_node(child_path, child_source, Some(parent_index));
        self.nodes[parent_index].children.push(child_index);
        InsertOutcome::New
    }

    /// Immediate dependencies of a module, in include order.
    pub fn deps(&self, path: &Path) -> Vec<PathBuf> {
        let Some(&index) = self.node_map.get(path) else {
            return Vec::new();
        };

        self.nodes[index]
            .children
            .iter()
            .map(|&child| self.nodes[child].path.clone())
            .collect()
    }

    /// Transitive dependencies in post-order: leaves first, so emitting
    /// modules in this order never needs a forward reference. Each path
    /// appears once even under shared inclusion.
    pub fn deps_recursive(&self, path: &Path) -> Vec<PathBuf> {
        let Some(&index) = self.node_map.get(path) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        visited[index] = true;
        for &child in &self.nodes[index].children {
            self.post_order(child, &mut visited, &mut order);
        }
        order
    }

    fn post_order(&self, index: usize, visited: &mut [bool], order: &mut Vec<PathBuf>) {
        if visited[index] {
            return;
        }
        visited[index] = true;

        for &child in &self.nodes[index].children {
            self.post_order(child, visited, order);
        }
        order.push(self.nodes[index].path.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::source_registry::SourceRegistry;

    struct Fixture {
        _dir: tempfile::TempDir,
        _registry: SourceRegistry,
        paths: Vec<PathBuf>,
        sources: Vec<SourceId>,
    }

    fn fixture(names: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = SourceRegistry::new(None);
        let mut paths = Vec::new();
        let mut sources = Vec::new();

        for name in names {
            let path = dir.path().join(name);
            std::fs::write(&path, "").unwrap();
            let id = registry.create(&path).unwrap();
            paths.push(registry.path(id).to_path_buf());
            sources.push(id);
        }

        Fixture {
            _dir: dir,
            _registry: registry,
            paths,
            sources,
        }
    }

    #[test]
    fn insert_wires_parent_and_child() {
        let f = fixture(&["main.fox", "math.fox"]);
        let mut graph = DependencyGraph::new();
        graph.set_entry(f.paths[0].clone(), f.sources[0]);

        let outcome = graph.insert(&f.paths[0], f.paths[1].clone(), f.sources[1]);
        assert_eq!(outcome, InsertOutcome::New);
        assert_eq!(graph.deps(&f.paths[0]), vec![f.paths[1].clone()]);
        assert_eq!(graph.source_for(&f.paths[1]), Some(f.sources[1]));
    }

    #[test]
    fn cycles_are_refused() {
        let f = fixture(&["a.fox", "b.fox"]);
        let mut graph = DependencyGraph::new();
        graph.set_entry(f.paths[0].clone(), f.sources[0]);

        assert_eq!(
            graph.insert(&f.paths[0], f.paths[1].clone(), f.sources[1]),
            InsertOutcome::New
        );
        // b includes a again: a is on b's ancestor chain.
        assert_eq!(
            graph.insert(&f.paths[1], f.paths[0].clone(), f.sources[0]),
            InsertOutcome::Cycle
        );
        // Self-inclusion is the degenerate cycle.
        assert_eq!(
            graph.insert(&f.paths[1], f.paths[1].clone(), f.sources[1]),
            InsertOutcome::Cycle
        );
    }

    #[test]
    fn duplicate_includes_add_no_second_edge() {
        let f = fixture(&["main.fox", "util.fox"]);
        let mut graph = DependencyGraph::new();
        graph.set_entry(f.paths[0].clone(), f.sources[0]);

        assert_eq!(
            graph.insert(&f.paths[0], f.paths[1].clone(), f.sources[1]),
            InsertOutcome::New
        );
        assert_eq!(
            graph.insert(&f.paths[0], f.paths[1].clone(), f.sources[1]),
            InsertOutcome::Duplicate
        );
        assert_eq!(graph.deps(&f.paths[0]).len(), 1);
    }

    #[test]
    fn shared_inclusion_reuses_the_node() {
        let f = fixture(&["main.fox", "a.fox", "shared.fox"]);
        let mut graph = DependencyGraph::new();
        graph.set_entry(f.paths[0].clone(), f.sources[0]);

        graph.insert(&f.paths[0], f.paths[1].clone(), f.sources[1]);
        assert_eq!(
            graph.insert(&f.paths[0], f.paths[2].clone(), f.sources[2]),
            InsertOutcome::New
        );
        // a.fox also includes shared.fox: node reused, edge added.
        assert_eq!(
            graph.insert(&f.paths[1], f.paths[2].clone(), f.sources[2]),
            InsertOutcome::Shared
        );

        // shared.fox shows up exactly once in the transitive closure.
        let transitive = graph.deps_recursive(&f.paths[0]);
        let shared_count = transitive
            .iter()
            .filter(|path| **path == f.paths[2])
            .count();
        assert_eq!(shared_count, 1);
    }

    #[test]
    fn recursive_listing_is_post_order() {
        // main -> a -> b ; leaves come first.
        let f = fixture(&["main.fox", "a.fox", "b.fox"]);
        let mut graph = DependencyGraph::new();
        graph.set_entry(f.paths[0].clone(), f.sources[0]);

        graph.insert(&f.paths[0], f.paths[1].clone(), f.sources[1]);
        graph.insert(&f.paths[1], f.paths[2].clone(), f.sources[2]);

        let order = graph.deps_recursive(&f.paths[0]);
        assert_eq!(order, vec![f.paths[2].clone(), f.paths[1].clone()]);
    }
}
