use super::GraphAnalysisResult;
use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Best chain ending at a node: edge count, input index of its first node and
/// the dependency it extends.
#[derive(Debug, Clone, Copy)]
struct Chain {
    length: usize,
    first: usize,
    previous: Option<usize>,
}

/// Ordering analysis over nodes identified by input position.
///
/// Edges point from a dependent to its dependency. Node `i` of the petgraph
/// graph is input position `i`.
pub struct GraphAnalyzer {
    ids: Vec<String>,
    graph: DiGraph<usize, ()>,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl GraphAnalyzer {
    /// Builds the analyzer; duplicate edges and edges naming positions outside
    /// `ids` are ignored.
    pub fn build(ids: Vec<String>, edges: &[(usize, usize)]) -> Self {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(ids.len(), edges.len());
        for idx in 0..ids.len() {
            graph.add_node(idx);
        }

        let mut dependencies = vec![Vec::new(); ids.len()];
        let mut dependents = vec![Vec::new(); ids.len()];
        let mut seen = HashSet::with_capacity(edges.len());
        for &(from, to) in edges {
            if from >= ids.len() || to >= ids.len() || !seen.insert((from, to)) {
                continue;
            }
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
            dependencies[from].push(to);
            dependents[to].push(from);
        }
        for list in dependencies.iter_mut().chain(dependents.iter_mut()) {
            list.sort_unstable();
        }

        Self {
            ids,
            graph,
            dependencies,
            dependents,
        }
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `from` depends on `to` directly or through other items.
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        if from >= self.ids.len() || to >= self.ids.len() {
            return false;
        }
        has_path_connecting(&self.graph, NodeIndex::new(from), NodeIndex::new(to), None)
    }

    pub fn analyze(&self) -> GraphAnalysisResult {
        let cycles = self.detect_cycles();
        let cyclic = self.cyclic_nodes();
        let order = self.acyclic_order(&cyclic);
        let levels = self.levels(&order, &cyclic);

        let cyclic_items: Vec<usize> = (0..self.ids.len()).filter(|&n| cyclic[n]).collect();
        let mut execution_order = order.clone();
        execution_order.extend(cyclic_items.iter().copied());

        let critical_path = self.critical_path(&order, &cyclic);
        let parallel_groups = self.parallel_groups(&order, &levels);

        let orphans = (0..self.ids.len())
            .filter(|&n| self.dependencies[n].is_empty() && self.dependents[n].is_empty())
            .collect::<Vec<_>>();
        let leaves = (0..self.ids.len())
            .filter(|&n| self.dependencies[n].is_empty() && !self.dependents[n].is_empty())
            .collect::<Vec<_>>();

        debug!(
            nodes = self.ids.len(),
            edges = self.edge_count(),
            cycles = cycles.len(),
            critical_len = critical_path.len(),
            "graph analyzed"
        );

        GraphAnalysisResult {
            execution_order: self.names(&execution_order),
            critical_path: self.names(&critical_path),
            cycles: cycles.iter().map(|c| self.names(c)).collect(),
            parallel_groups: parallel_groups.iter().map(|g| self.names(g)).collect(),
            orphans: self.names(&orphans),
            leaves: self.names(&leaves),
            cyclic_items: self.names(&cyclic_items),
            edge_count: self.edge_count(),
        }
    }

    fn names(&self, nodes: &[usize]) -> Vec<String> {
        nodes.iter().map(|&n| self.ids[n].clone()).collect()
    }

    /// Three-color DFS. Every edge into a gray node closes a cycle, reported as
    /// the stack path from that node back to itself.
    fn detect_cycles(&self) -> Vec<Vec<usize>> {
        let mut colors = vec![Color::White; self.ids.len()];
        let mut stack = Vec::new();
        let mut cycles = Vec::new();
        for start in 0..self.ids.len() {
            if colors[start] == Color::White {
                self.visit(start, &mut colors, &mut stack, &mut cycles);
            }
        }
        cycles
    }

    fn visit(
        &self,
        node: usize,
        colors: &mut [Color],
        stack: &mut Vec<usize>,
        cycles: &mut Vec<Vec<usize>>,
    ) {
        colors[node] = Color::Gray;
        stack.push(node);
        for &next in &self.dependencies[node] {
            match colors[next] {
                Color::White => self.visit(next, colors, stack, cycles),
                Color::Gray => {
                    if let Some(pos) = stack.iter().position(|&n| n == next) {
                        let mut cycle = stack[pos..].to_vec();
                        cycle.push(next);
                        cycles.push(cycle);
                    }
                }
                Color::Black => {}
            }
        }
        stack.pop();
        colors[node] = Color::Black;
    }

    /// Members of a strongly connected component with more than one node (or
    /// a self loop) have no valid position in a topological order.
    fn cyclic_nodes(&self) -> Vec<bool> {
        let mut cyclic = vec![false; self.ids.len()];
        for component in tarjan_scc(&self.graph) {
            let looped = component.len() == 1 && self.graph.contains_edge(component[0], component[0]);
            if component.len() > 1 || looped {
                for node in component {
                    cyclic[node.index()] = true;
                }
            }
        }
        cyclic
    }

    /// Kahn's algorithm over the acyclic nodes; ties go to the lowest input
    /// position.
    fn acyclic_order(&self, cyclic: &[bool]) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..self.ids.len())
            .map(|n| self.dependencies[n].iter().filter(|&&d| !cyclic[d]).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = (0..self.ids.len())
            .filter(|&n| !cyclic[n] && remaining[n] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.ids.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &dependent in &self.dependents[node] {
                if cyclic[dependent] {
                    continue;
                }
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
        order
    }

    /// Depth of each acyclic node: length of the longest dependency chain
    /// below it. Cyclic nodes stay `None`.
    fn levels(&self, order: &[usize], cyclic: &[bool]) -> Vec<Option<usize>> {
        let mut levels = vec![None; self.ids.len()];
        for &node in order {
            let level = self.dependencies[node]
                .iter()
                .filter(|&&d| !cyclic[d])
                .filter_map(|&d| levels[d])
                .map(|l: usize| l + 1)
                .max()
                .unwrap_or(0);
            levels[node] = Some(level);
        }
        levels
    }

    fn critical_path(&self, order: &[usize], cyclic: &[bool]) -> Vec<usize> {
        let mut chains: Vec<Option<Chain>> = vec![None; self.ids.len()];
        for &node in order {
            let mut best = Chain {
                length: 0,
                first: node,
                previous: None,
            };
            for &dep in &self.dependencies[node] {
                if cyclic[dep] {
                    continue;
                }
                let Some(chain) = chains[dep] else {
                    continue;
                };
                let candidate = Chain {
                    length: chain.length + 1,
                    first: chain.first,
                    previous: Some(dep),
                };
                if Self::prefer(&candidate, &best) {
                    best = candidate;
                }
            }
            chains[node] = Some(best);
        }

        let mut end: Option<(usize, Chain)> = None;
        for &node in order {
            if let Some(chain) = chains[node] {
                let better = match end {
                    None => true,
                    Some((end_node, current)) => {
                        chain.length > current.length
                            || (chain.length == current.length && chain.first < current.first)
                            || (chain.length == current.length
                                && chain.first == current.first
                                && node < end_node)
                    }
                };
                if better {
                    end = Some((node, chain));
                }
            }
        }

        let mut path = Vec::new();
        let mut cursor = end.map(|(node, _)| node);
        while let Some(node) = cursor {
            path.push(node);
            cursor = chains[node].and_then(|c| c.previous);
        }
        path.reverse();
        path
    }

    fn prefer(candidate: &Chain, current: &Chain) -> bool {
        if candidate.length != current.length {
            return candidate.length > current.length;
        }
        if candidate.first != current.first {
            return candidate.first < current.first;
        }
        match (candidate.previous, current.previous) {
            (Some(a), Some(b)) => a < b,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Nodes at the same depth cannot reach one another, since a path
    /// between them would put one strictly deeper than the other.
    fn parallel_groups(&self, order: &[usize], levels: &[Option<usize>]) -> Vec<Vec<usize>> {
        let depth = order.iter().filter_map(|&n| levels[n]).max();
        let Some(depth) = depth else {
            return Vec::new();
        };
        let mut groups = vec![Vec::new(); depth + 1];
        for node in 0..self.ids.len() {
            if let Some(level) = levels[node] {
                groups[level].push(node);
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ties_in_order_follow_input_position() {
        // c depends on a, b has no edges
        let analyzer = GraphAnalyzer::build(ids(&["a", "b", "c"]), &[(2, 0)]);
        let result = analyzer.analyze();
        assert_eq!(result.execution_order, vec!["a", "b", "c"]);
        assert_eq!(result.parallel_groups, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn critical_path_prefers_lowest_first_node() {
        // Two chains of one edge: b -> a and d -> c.
        let analyzer = GraphAnalyzer::build(ids(&["a", "b", "c", "d"]), &[(1, 0), (3, 2)]);
        assert_eq!(analyzer.analyze().critical_path, vec!["a", "b"]);

        let analyzer = GraphAnalyzer::build(ids(&["c", "d", "a", "b"]), &[(3, 2), (1, 0)]);
        assert_eq!(analyzer.analyze().critical_path, vec!["c", "d"]);
    }

    #[test]
    fn duplicate_and_out_of_range_edges_are_ignored() {
        let analyzer = GraphAnalyzer::build(ids(&["a", "b"]), &[(1, 0), (1, 0), (5, 0)]);
        assert_eq!(analyzer.edge_count(), 1);
        assert!(analyzer.has_path(1, 0));
        assert!(!analyzer.has_path(0, 1));
    }

    #[test]
    fn dependents_of_a_cycle_are_still_ordered() {
        // a <-> b, c depends on a
        let analyzer = GraphAnalyzer::build(ids(&["a", "b", "c"]), &[(0, 1), (1, 0), (2, 0)]);
        let result = analyzer.analyze();
        assert_eq!(result.cycles, vec![vec!["a", "b", "a"]]);
        assert_eq!(result.cyclic_items, vec!["a", "b"]);
        assert_eq!(result.execution_order, vec!["c", "a", "b"]);
    }
}
