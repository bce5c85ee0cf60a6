use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Undirected weighted graph over a fixed set of node indices.
///
/// Nodes are `0..n`. Each adjacency list is kept ordered by descending edge
/// weight (ties by ascending node index), and a degree index answers
/// "which live node has the highest degree" in `O(log n)`.
///
/// # Invariants
/// - Edges are symmetric: `a ∈ adj(b)` iff `b ∈ adj(a)`, with the same weight
/// - `by_degree` holds exactly one entry per live node, keyed by its current degree
/// - Removed nodes have no edges and never come back
#[derive(Clone, Debug)]
pub struct WeightedGraph {
	adjacency: Vec<Vec<(usize, u32)>>,
	alive: Vec<bool>,
	/// Ordered by ascending degree, then descending index: the last entry is
	/// the pivot (highest degree, lowest index among ties).
	by_degree: BTreeSet<(usize, Reverse<usize>)>,
}

impl WeightedGraph {
	/// Creates a graph of `n` isolated nodes.
	pub fn new(n: usize) -> Self {
		Self {
			adjacency: vec![Vec::new(); n],
			alive: vec![true; n],
			by_degree: (0..n).map(|node| (0, Reverse(node))).collect(),
		}
	}

	/// Number of live nodes.
	pub fn len(&self) -> usize {
		self.by_degree.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_degree.is_empty()
	}

	pub fn contains(&self, node: usize) -> bool {
		self.alive.get(node).copied().unwrap_or(false)
	}

	pub fn degree(&self, node: usize) -> usize {
		self.adjacency.get(node).map_or(0, Vec::len)
	}

	/// Weight of the edge `a - b`, if present.
	pub fn weight(&self, a: usize, b: usize) -> Option<u32> {
		self.adjacency.get(a)?.iter().find(|(node, _)| *node == b).map(|(_, weight)| *weight)
	}

	/// Neighbors of `node`, heaviest edge first. Empty for an unknown node.
	pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
		self.adjacency.get(node).into_iter().flatten().map(|(neighbor, _)| *neighbor)
	}

	/// Number of nodes adjacent to both `a` and `b`.
	pub fn common_neighbors(&self, a: usize, b: usize) -> usize {
		let mut of_a: Vec<usize> = self.neighbors(a).collect();
		of_a.sort_unstable();
		self.neighbors(b).filter(|node| of_a.binary_search(node).is_ok()).count()
	}

	/// Adds the undirected edge `a - b`.
	///
	/// # Returns
	/// `false` (and changes nothing) for self-loops, removed or out-of-range
	/// nodes, or an edge that already exists.
	pub fn add_edge(&mut self, a: usize, b: usize, weight: u32) -> bool {
		if a == b || !self.contains(a) || !self.contains(b) || self.weight(a, b).is_some() {
			return false;
		}
		self.update_degree(a, |list| Self::insert_sorted(list, b, weight));
		self.update_degree(b, |list| Self::insert_sorted(list, a, weight));
		true
	}

	/// Removes the undirected edge `a - b`.
	///
	/// Returns whether the edge existed.
	pub fn remove_edge(&mut self, a: usize, b: usize) -> bool {
		if self.weight(a, b).is_none() {
			return false;
		}
		self.update_degree(a, |list| list.retain(|(node, _)| *node != b));
		self.update_degree(b, |list| list.retain(|(node, _)| *node != a));
		true
	}

	/// Removes `node` and all its incident edges.
	///
	/// Neighbors are re-ranked before the next pivot query.
	pub fn remove_node(&mut self, node: usize) {
		if !self.contains(node) {
			return;
		}
		let neighbors: Vec<usize> = self.neighbors(node).collect();
		for neighbor in neighbors {
			self.update_degree(neighbor, |list| list.retain(|(other, _)| *other != node));
		}
		self.by_degree.remove(&(self.adjacency[node].len(), Reverse(node)));
		self.adjacency[node].clear();
		self.alive[node] = false;
	}

	/// The live node with the highest degree (lowest index among ties).
	pub fn max_degree_node(&self) -> Option<usize> {
		self.by_degree.last().map(|(_, Reverse(node))| *node)
	}

	/// Applies `change` to the adjacency list of a live node and re-ranks it.
	fn update_degree<F: FnOnce(&mut Vec<(usize, u32)>)>(&mut self, node: usize, change: F) {
		self.by_degree.remove(&(self.adjacency[node].len(), Reverse(node)));
		change(&mut self.adjacency[node]);
		self.by_degree.insert((self.adjacency[node].len(), Reverse(node)));
	}

	fn insert_sorted(list: &mut Vec<(usize, u32)>, node: usize, weight: u32) {
		let key = (Reverse(weight), node);
		let position = list
			.binary_search_by_key(&key, |(other, w)| (Reverse(*w), *other))
			.unwrap_or_else(|position| position);
		list.insert(position, (node, weight));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn star() -> WeightedGraph {
		// 0 is the hub, 1-2 are also linked
		let mut graph = WeightedGraph::new(5);
		graph.add_edge(0, 1, 1);
		graph.add_edge(0, 2, 5);
		graph.add_edge(0, 3, 3);
		graph.add_edge(1, 2, 2);
		graph
	}

	#[test]
	fn neighbors_are_ordered_by_weight() {
		let graph = star();
		assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![2, 3, 1]);
		assert_eq!(graph.weight(2, 0), Some(5));
		assert_eq!(graph.common_neighbors(0, 1), 1);
	}

	#[test]
	fn pivot_is_highest_degree() {
		let graph = star();
		assert_eq!(graph.max_degree_node(), Some(0));
	}

	#[test]
	fn ties_go_to_lowest_index() {
		let mut graph = WeightedGraph::new(3);
		graph.add_edge(2, 1, 1);
		assert_eq!(graph.max_degree_node(), Some(1));
	}

	#[test]
	fn removing_a_node_reranks_neighbors() {
		let mut graph = star();
		graph.remove_node(0);
		assert!(!graph.contains(0));
		assert_eq!(graph.len(), 4);
		assert_eq!(graph.degree(1), 1);
		assert_eq!(graph.degree(3), 0);
		assert_eq!(graph.max_degree_node(), Some(1));
	}

	#[test]
	fn removing_an_edge_updates_both_ends() {
		let mut graph = star();
		assert!(graph.remove_edge(2, 0));
		assert!(!graph.remove_edge(2, 0));
		assert_eq!(graph.degree(0), 2);
		assert_eq!(graph.degree(2), 1);
		assert_eq!(graph.weight(0, 2), None);
	}

	#[test]
	fn duplicate_and_self_edges_are_refused() {
		let mut graph = star();
		assert!(!graph.add_edge(0, 1, 9));
		assert!(!graph.add_edge(4, 4, 1));
		graph.remove_node(4);
		assert!(!graph.add_edge(0, 4, 1));
	}

	#[test]
	fn unknown_nodes_have_no_neighbors() {
		let graph = star();
		assert_eq!(graph.neighbors(42).count(), 0);
		assert_eq!(graph.common_neighbors(0, 42), 0);
		assert_eq!(graph.degree(42), 0);
	}

	#[test]
	fn graph_drains_to_empty() {
		let mut graph = star();
		while let Some(pivot) = graph.max_degree_node() {
			graph.remove_node(pivot);
		}
		assert!(graph.is_empty());
	}
}
