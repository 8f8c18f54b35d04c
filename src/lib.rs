//! Treepattern: dependency patterns from example word selections
//!
//! Given a parsed sentence and a connected selection of its words, builds
//! an ordered, root-first pattern that a dependency-tree matcher can use
//! to find equivalent selections in other sentences.

pub mod builder; // Validation + pattern assembly
pub mod connectivity; // Smallest connected subgraph of a selection
pub mod conllu; // CoNLL-U file parsing
pub mod depth; // Per-tree depth annotation (cached)
pub mod features; // Feature dictionaries and attribute extraction
pub mod graph; // Undirected projection of a tree
pub mod pattern; // Pattern elements and wire format
pub mod tree; // Tree data structures

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use builder::{PatternError, build_dependency_pattern, has_duplicates};
pub use conllu::CoNLLUReader;
pub use connectivity::smallest_connected_subgraph;
pub use depth::annotate_depth;
pub use features::{FeatureDict, TokenField, extract_features};
pub use graph::DependencyGraph;
pub use pattern::{Attributes, DependencyPattern, PatternElement, RelationType};
pub use tree::{Tree, Word, WordId};

#[cfg(test)]
mod tests {
    use super::*;

    const SAT_CONLLU: &str = "# text = The cat sat on the mat.
1\tThe\tthe\tDET\tDT\t_\t2\tdet\t_\t_
2\tcat\tcat\tNOUN\tNN\t_\t3\tnsubj\t_\t_
3\tsat\tsit\tVERB\tVBD\t_\t0\troot\t_\t_
4\ton\ton\tADP\tIN\t_\t3\tprep\t_\t_
5\tthe\tthe\tDET\tDT\t_\t6\tdet\t_\t_
6\tmat\tmat\tNOUN\tNN\t_\t4\tpobj\t_\t_
7\t.\t.\tPUNCT\t.\t_\t3\tpunct\t_\t_

";

    #[test]
    fn test_end_to_end_from_conllu() {
        let tree = CoNLLUReader::from_str(SAT_CONLLU).next().unwrap().unwrap();
        let graph = DependencyGraph::project(&tree).unwrap();
        let dict: FeatureDict = "DEP=dep,POS=pos,LEMMA=lemma".parse().unwrap();

        let pattern = build_dependency_pattern(&tree, &[5, 3, 2], &dict, Some(&graph)).unwrap();

        assert_eq!(
            pattern.to_json().unwrap(),
            concat!(
                r#"[{"SPEC":{"NODE_NAME":"node2"},"PATTERN":{"DEP":"root","POS":"VERB","LEMMA":"sit"}},"#,
                r#"{"SPEC":{"NODE_NAME":"node3","NBOR_NAME":"node2","NBOR_RELOP":">"},"PATTERN":{"DEP":"prep","POS":"ADP","LEMMA":"on"}},"#,
                r#"{"SPEC":{"NODE_NAME":"node5","NBOR_NAME":"node3","NBOR_RELOP":">"},"PATTERN":{"DEP":"pobj","POS":"NOUN","LEMMA":"mat"}}]"#
            )
        );

        let err = build_dependency_pattern(&tree, &[2, 5], &dict, Some(&graph)).unwrap_err();
        assert!(matches!(err, PatternError::NotFullyConnected { .. }));
    }
}
