//! Dependency pattern construction
//!
//! Turns a selection of words from a parsed tree into a pattern that
//! matches structurally and lexically equivalent selections elsewhere:
//! 1. Reject repeated words
//! 2. Project the tree onto a graph (unless one is supplied)
//! 3. Annotate depths (cached on the tree)
//! 4. Check the selection is its own smallest connected subtree
//! 5. Emit nodes root first, by ascending depth then word id

use crate::connectivity::missing_words;
use crate::depth::annotate_depth;
use crate::features::{FeatureDict, extract_features};
use crate::graph::DependencyGraph;
use crate::pattern::{DependencyPattern, PatternElement, node_name};
use crate::tree::{Tree, TreeError, WordId};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Error type for pattern construction failures
///
/// All variants are problems with the request; none are transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error(
        "Match words {requested:?} are not fully connected; words {missing:?} lie between them. \
         Try expanding the selection to include all words in between those you are trying to match."
    )]
    NotFullyConnected {
        requested: Vec<WordId>,
        missing: Vec<WordId>,
    },

    #[error("Match words contain duplicates: {duplicates:?}. Ensure each word is selected once.")]
    DuplicateTokens { duplicates: Vec<WordId> },

    #[error("Head {head} of word {word} is not among the match words. Are they fully connected?")]
    TokenNotInMatchTokens { word: WordId, head: WordId },

    #[error("Word {0} is not in the tree")]
    UnknownWord(WordId),

    #[error("Invalid tree: {0}")]
    InvalidTree(#[from] TreeError),
}

/// Whether any word id appears more than once
pub fn has_duplicates(words: &[WordId]) -> bool {
    !find_duplicates(words).is_empty()
}

/// Word ids appearing more than once, in order of their second occurrence
pub fn find_duplicates(words: &[WordId]) -> Vec<WordId> {
    let mut seen = FxHashSet::default();
    let mut reported = FxHashSet::default();
    words
        .iter()
        .copied()
        .filter(|&id| !seen.insert(id) && reported.insert(id))
        .collect()
}

/// Build a pattern matching the words `match_words` of `tree`
///
/// `graph` may be a projection of `tree` computed earlier and shared
/// across calls; without one the tree is projected on the spot.
#[tracing::instrument(level = "debug", skip_all, fields(words = match_words.len()))]
pub fn build_dependency_pattern(
    tree: &Tree,
    match_words: &[WordId],
    feature_dict: &FeatureDict,
    graph: Option<&DependencyGraph>,
) -> Result<DependencyPattern, PatternError> {
    let duplicates = find_duplicates(match_words);
    if !duplicates.is_empty() {
        tracing::debug!(?duplicates, "rejected repeated match words");
        return Err(PatternError::DuplicateTokens { duplicates });
    }
    if let Some(&id) = match_words.iter().find(|&&id| id >= tree.len()) {
        return Err(PatternError::UnknownWord(id));
    }

    let projected;
    let graph = match graph {
        Some(graph) => graph,
        None => {
            projected = DependencyGraph::project(tree)?;
            &projected
        }
    };
    let depths = annotate_depth(tree);

    let missing = missing_words(match_words, graph);
    if !missing.is_empty() {
        tracing::debug!(?missing, "rejected disconnected match words");
        return Err(PatternError::NotFullyConnected {
            requested: match_words.to_vec(),
            missing,
        });
    }

    let mut ordered = match_words.to_vec();
    ordered.sort_by_key(|&id| (depths[id], id));
    let selected: FxHashSet<WordId> = ordered.iter().copied().collect();

    let mut pattern = DependencyPattern::new();
    for (i, &id) in ordered.iter().enumerate() {
        let word = &tree.words[id];
        let features = extract_features(word, feature_dict);

        if i == 0 {
            pattern.push(PatternElement::root(node_name(id), features));
            continue;
        }

        let head = word.head_or_self();
        if head == id || !selected.contains(&head) {
            return Err(PatternError::TokenNotInMatchTokens { word: id, head });
        }
        pattern.push(PatternElement::child(
            node_name(id),
            node_name(head),
            features,
        ));
    }

    tracing::debug!(nodes = pattern.len(), "built dependency pattern");
    Ok(pattern)
}
