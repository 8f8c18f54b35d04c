//! Smallest connected subgraph of a word selection
//!
//! The union of the shortest paths between every pair of selected words
//! is the smallest connected subtree spanning them. A selection is
//! self-contained exactly when that union adds nothing.

use crate::graph::DependencyGraph;
use crate::tree::WordId;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// Words of the smallest connected subtree spanning `words`
///
/// Selections of zero or one word come back unchanged. Pairs the graph
/// cannot connect contribute only their end points.
pub fn smallest_connected_subgraph(words: &[WordId], graph: &DependencyGraph) -> BTreeSet<WordId> {
    let mut connected: BTreeSet<WordId> = words.iter().copied().collect();
    if connected.len() < 2 {
        return connected;
    }

    let distinct: Vec<WordId> = connected.iter().copied().collect();
    for (i, &a) in distinct.iter().enumerate() {
        for &b in &distinct[i + 1..] {
            match graph.shortest_path(a, b) {
                Some(path) => {
                    tracing::trace!(from = a, to = b, ?path, "shortest path");
                    connected.extend(path);
                }
                None => tracing::trace!(from = a, to = b, "no path"),
            }
        }
    }

    connected
}

/// Words the subtree needs that the selection left out, in id order
pub fn missing_words(words: &[WordId], graph: &DependencyGraph) -> Vec<WordId> {
    let requested: FxHashSet<WordId> = words.iter().copied().collect();
    smallest_connected_subgraph(words, graph)
        .into_iter()
        .filter(|id| !requested.contains(id))
        .collect()
}

/// Whether `words` already form a connected subtree on their own
pub fn is_fully_connected(words: &[WordId], graph: &DependencyGraph) -> bool {
    missing_words(words, graph).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Tree, Word};

    /// 0: sat
    ///   ├─ 1: cat
    ///   │    └─ 3: The
    ///   └─ 2: on
    ///        └─ 4: mat
    fn create_test_graph() -> DependencyGraph {
        let mut tree = Tree::new();
        tree.add_word(Word::new(0, "sat", "sit", "VERB", "VBD", "ROOT"));
        tree.add_word(Word::new(1, "cat", "cat", "NOUN", "NN", "nsubj"));
        tree.add_word(Word::new(2, "on", "on", "ADP", "IN", "prep"));
        tree.add_word(Word::new(3, "The", "the", "DET", "DT", "det"));
        tree.add_word(Word::new(4, "mat", "mat", "NOUN", "NN", "pobj"));
        tree.set_parent(1, 0);
        tree.set_parent(2, 0);
        tree.set_parent(3, 1);
        tree.set_parent(4, 2);
        DependencyGraph::project(&tree).unwrap()
    }

    #[test]
    fn test_trivial_selections() {
        let graph = create_test_graph();
        assert!(smallest_connected_subgraph(&[], &graph).is_empty());
        assert_eq!(
            smallest_connected_subgraph(&[3], &graph),
            BTreeSet::from([3])
        );
    }

    #[test]
    fn test_connected_selection_is_unchanged() {
        let graph = create_test_graph();
        let words = [0, 1, 2, 4];

        assert_eq!(
            smallest_connected_subgraph(&words, &graph),
            BTreeSet::from(words)
        );
        assert!(is_fully_connected(&words, &graph));
    }

    #[test]
    fn test_gap_is_filled() {
        let graph = create_test_graph();

        assert_eq!(
            smallest_connected_subgraph(&[0, 4], &graph),
            BTreeSet::from([0, 2, 4])
        );
        assert_eq!(missing_words(&[0, 4], &graph), vec![2]);
    }

    #[test]
    fn test_siblings_need_their_parent() {
        let graph = create_test_graph();
        assert_eq!(missing_words(&[3, 4], &graph), vec![0, 1, 2]);
        assert_eq!(missing_words(&[1, 2], &graph), vec![0]);
    }

    #[test]
    fn test_order_and_repeats_do_not_matter() {
        let graph = create_test_graph();
        assert_eq!(
            smallest_connected_subgraph(&[4, 2, 4, 0], &graph),
            BTreeSet::from([0, 2, 4])
        );
    }

    #[test]
    fn test_unconnectable_pair() {
        let mut graph = DependencyGraph::with_vertices(3);
        graph.add_edge(0, 1);

        assert_eq!(
            smallest_connected_subgraph(&[0, 2], &graph),
            BTreeSet::from([0, 2])
        );
    }
}
