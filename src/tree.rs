//! Dependency tree data structures
//!
//! A `Tree` is one parsed sentence: an ordered list of `Word`s linked by
//! head relations into a single rooted tree. Trees are built either by
//! hand (`add_word` + `set_parent`) or by the CoNLL-U reader.

use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Position of a word in its tree (0-based)
pub type WordId = usize;

/// Ordered key/value pairs from the FEATS or MISC column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features(Vec<(String, String)>);

/// MISC uses the same key=value layout as FEATS
pub type Misc = Features;

impl Features {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a pair, replacing any earlier value for the key
    pub fn insert(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A word (token) in a dependency tree
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub id: WordId,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: Option<String>,
    pub feats: Features,
    pub deprel: String,
    /// `None` for the root
    pub head: Option<WordId>,
    pub children: Vec<WordId>,
    pub misc: Misc,
}

impl Word {
    /// Create a word with no head and empty FEATS/MISC
    pub fn new(id: WordId, form: &str, lemma: &str, upos: &str, xpos: &str, deprel: &str) -> Self {
        Self {
            id,
            form: form.to_string(),
            lemma: lemma.to_string(),
            upos: upos.to_string(),
            xpos: if xpos.is_empty() || xpos == "_" {
                None
            } else {
                Some(xpos.to_string())
            },
            feats: Features::new(),
            deprel: deprel.to_string(),
            head: None,
            children: Vec::new(),
            misc: Misc::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.head.is_none()
    }

    /// Head of this word, where the root counts as its own head
    pub fn head_or_self(&self) -> WordId {
        self.head.unwrap_or(self.id)
    }

    /// Get the parent word, if any
    pub fn parent<'a>(&self, tree: &'a Tree) -> Option<&'a Word> {
        self.head.and_then(|id| tree.word(id))
    }

    /// Get all children of this word
    pub fn children<'a>(&self, tree: &'a Tree) -> Vec<&'a Word> {
        self.children
            .iter()
            .filter_map(|&id| tree.word(id))
            .collect()
    }
}

/// Violations of the single-rooted-tree invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("tree has no words")]
    Empty,

    #[error("tree has no root word")]
    NoRoot,

    #[error("tree has more than one root: words {0} and {1}")]
    MultipleRoots(WordId, WordId),

    #[error("word {word} has head {head}, which is not in the tree")]
    HeadOutOfRange { word: WordId, head: WordId },

    #[error("head links from word {0} never reach the root")]
    Cycle(WordId),

    #[error("word at position {position} has id {id}")]
    IdMismatch { position: usize, id: WordId },

    #[error("root is word {root}, but the tree records {root_id:?}")]
    RootMismatch {
        root: WordId,
        root_id: Option<WordId>,
    },

    #[error("children of word {0} do not match the head links")]
    ChildrenMismatch(WordId),
}

/// A dependency tree (sentence)
#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub words: Vec<Word>,
    pub root_id: Option<WordId>,
    pub sentence_text: Option<String>,
    pub metadata: HashMap<String, String>,
    pub(crate) depths: OnceLock<Vec<usize>>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree carrying sentence metadata
    pub fn with_metadata(
        sentence_text: Option<String>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            sentence_text,
            metadata,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Add a word to the tree. A word added without a head becomes the
    /// root unless a root is already set.
    pub fn add_word(&mut self, word: Word) -> WordId {
        let id = word.id;
        if word.head.is_none() && self.root_id.is_none() {
            self.root_id = Some(id);
        }
        self.words.push(word);
        self.depths = OnceLock::new();
        id
    }

    /// Get a word by ID
    pub fn word(&self, id: WordId) -> Option<&Word> {
        self.words.get(id)
    }

    /// Attach `child_id` under `parent_id`
    pub fn set_parent(&mut self, child_id: WordId, parent_id: WordId) {
        let previous = match self.words.get_mut(child_id) {
            Some(child) => child.head.replace(parent_id),
            None => return,
        };
        if let Some(old) = previous.and_then(|id| self.words.get_mut(id)) {
            old.children.retain(|&c| c != child_id);
        }
        if let Some(parent) = self.words.get_mut(parent_id) {
            parent.children.push(child_id);
        }
        if self.root_id == Some(child_id) {
            self.root_id = self.words.iter().find(|w| w.is_root()).map(|w| w.id);
        }
        self.depths = OnceLock::new();
    }

    /// Get the parent of a word
    pub fn parent(&self, id: WordId) -> Option<&Word> {
        self.word(id).and_then(|word| word.parent(self))
    }

    /// Check that the words form exactly one rooted tree: ids match
    /// positions, one root recorded in `root_id`, heads in range and
    /// acyclic, and `children` lists that agree with the head links
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.words.is_empty() {
            return Err(TreeError::Empty);
        }

        for (position, word) in self.words.iter().enumerate() {
            if word.id != position {
                return Err(TreeError::IdMismatch {
                    position,
                    id: word.id,
                });
            }
        }

        let mut root = None;
        for word in &self.words {
            match word.head {
                None => match root {
                    None => root = Some(word.id),
                    Some(first) => return Err(TreeError::MultipleRoots(first, word.id)),
                },
                Some(head) if head >= self.words.len() => {
                    return Err(TreeError::HeadOutOfRange {
                        word: word.id,
                        head,
                    });
                }
                Some(_) => {}
            }
        }
        let Some(root) = root else {
            return Err(TreeError::NoRoot);
        };
        if self.root_id != Some(root) {
            return Err(TreeError::RootMismatch {
                root,
                root_id: self.root_id,
            });
        }

        // A head chain longer than the tree has to revisit a word
        for word in &self.words {
            let mut current = word.head;
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if steps > self.words.len() {
                    return Err(TreeError::Cycle(word.id));
                }
                current = self.words[id].head;
            }
        }

        let mut expected: Vec<Vec<WordId>> = vec![Vec::new(); self.words.len()];
        for word in &self.words {
            if let Some(head) = word.head {
                expected[head].push(word.id);
            }
        }
        for (word, expected) in self.words.iter().zip(&expected) {
            let mut children = word.children.clone();
            children.sort_unstable();
            if children != *expected {
                return Err(TreeError::ChildrenMismatch(word.id));
            }
        }

        Ok(())
    }
}
