//! Undirected connectivity graph over a tree's words
//!
//! One vertex per word, one edge per (word, head) pair with the direction
//! dropped. Built once per tree and read-only afterwards.

use crate::tree::{Tree, TreeError, WordId};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    adjacency: Vec<Vec<WordId>>,
    num_edges: usize,
}

impl DependencyGraph {
    /// Graph with `n` vertices and no edges
    pub fn with_vertices(n: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); n],
            num_edges: 0,
        }
    }

    /// Project a tree onto its undirected graph
    pub fn project(tree: &Tree) -> Result<Self, TreeError> {
        tree.validate()?;

        let mut graph = Self::with_vertices(tree.len());
        for word in &tree.words {
            if let Some(head) = word.head {
                graph.add_edge(word.id, head);
            }
        }
        Ok(graph)
    }

    /// Add an undirected edge. Edges touching unknown vertices are ignored.
    pub fn add_edge(&mut self, a: WordId, b: WordId) {
        if a >= self.adjacency.len() || b >= self.adjacency.len() {
            return;
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        self.num_edges += 1;
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn contains(&self, v: WordId) -> bool {
        v < self.adjacency.len()
    }

    pub fn neighbors(&self, v: WordId) -> &[WordId] {
        self.adjacency.get(v).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Shortest path from `from` to `to`, both ends included
    ///
    /// BFS; in a tree this is the unique path. Returns `None` when either
    /// vertex is unknown or the two are not connected.
    pub fn shortest_path(&self, from: WordId, to: WordId) -> Option<Vec<WordId>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut previous: Vec<Option<WordId>> = vec![None; self.adjacency.len()];
        let mut visited = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::new();
        visited[from] = true;
        queue.push_back(from);

        while let Some(v) = queue.pop_front() {
            for &next in &self.adjacency[v] {
                if visited[next] {
                    continue;
                }
                visited[next] = true;
                previous[next] = Some(v);
                if next == to {
                    return Some(Self::unwind(&previous, from, to));
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn unwind(previous: &[Option<WordId>], from: WordId, to: WordId) -> Vec<WordId> {
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            match previous[current] {
                Some(v) => {
                    path.push(v);
                    current = v;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}
