//! Depth annotation
//!
//! Distance of every word from the root (root = 0). Depths are computed
//! once per tree and cached in the tree itself; concurrent callers race
//! harmlessly on the write-once cell.

use crate::tree::{Tree, WordId};
use std::collections::VecDeque;

/// Depth given to words the root cannot reach (malformed trees only)
pub const UNREACHABLE: usize = usize::MAX;

/// Depths of all words in `tree`, indexed by `WordId`
///
/// Idempotent: the first call fills the cache, later calls return it.
pub fn annotate_depth(tree: &Tree) -> &[usize] {
    tree.depths.get_or_init(|| {
        let depths = compute_depths(tree);
        tracing::debug!(words = tree.len(), "annotated word depths");
        depths
    })
}

/// Whether the depth cache is already filled
pub fn is_annotated(tree: &Tree) -> bool {
    tree.depths.get().is_some()
}

/// Breadth-first walk from the root, O(number of words)
pub fn compute_depths(tree: &Tree) -> Vec<usize> {
    let mut depths = vec![UNREACHABLE; tree.len()];
    let Some(root) = tree.root_id.filter(|&id| id < tree.len()) else {
        return depths;
    };

    let mut queue: VecDeque<WordId> = VecDeque::new();
    depths[root] = 0;
    queue.push_back(root);

    while let Some(id) = queue.pop_front() {
        let next = depths[id] + 1;
        for &child in &tree.words[id].children {
            if child < depths.len() && depths[child] == UNREACHABLE {
                depths[child] = next;
                queue.push_back(child);
            }
        }
    }

    depths
}

impl Tree {
    /// Depth of a single word (see [`annotate_depth`])
    pub fn depth(&self, id: WordId) -> Option<usize> {
        annotate_depth(self)
            .get(id)
            .copied()
            .filter(|&d| d != UNREACHABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Word;

    /// 0: sat
    ///   ├─ 1: cat
    ///   │    └─ 3: The
    ///   └─ 2: on
    ///        └─ 4: mat
    fn create_test_tree() -> Tree {
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
        tree
    }

    #[test]
    fn test_depths() {
        let tree = create_test_tree();
        assert_eq!(annotate_depth(&tree), &[0, 1, 1, 2, 2]);
        assert_eq!(tree.depth(4), Some(2));
        assert_eq!(tree.depth(9), None);
    }

    #[test]
    fn test_annotation_is_idempotent() {
        let tree = create_test_tree();
        assert!(!is_annotated(&tree));

        let first = annotate_depth(&tree).to_vec();
        assert!(is_annotated(&tree));
        let second = annotate_depth(&tree).to_vec();

        assert_eq!(first, second);
        assert_eq!(first, compute_depths(&tree));
    }

    #[test]
    fn test_mutation_resets_cache() {
        let mut tree = create_test_tree();
        annotate_depth(&tree);

        tree.set_parent(4, 3);
        assert!(!is_annotated(&tree));
        assert_eq!(annotate_depth(&tree), &[0, 1, 1, 2, 3]);
    }

    #[test]
    fn test_unreachable_words() {
        let mut tree = create_test_tree();
        tree.add_word(Word::new(5, "stray", "stray", "X", "_", "dep"));
        tree.words[5].head = Some(5);

        assert_eq!(annotate_depth(&tree)[5], UNREACHABLE);
        assert_eq!(tree.depth(5), None);
    }

    #[test]
    fn test_shared_across_threads() {
        let tree = create_test_tree();
        let expected = compute_depths(&tree);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| annotate_depth(&tree).to_vec()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
