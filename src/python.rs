//! Python bindings for treepattern
//!
//! This module provides PyO3-based Python bindings for the Rust core.
//! Patterns come back as plain lists of dicts in the matcher's format.

use pyo3::create_exception;
use pyo3::exceptions::{PyIOError, PyIndexError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::builder::{PatternError, build_dependency_pattern};
use crate::conllu::{CoNLLUReader, ParseError};
use crate::features::{FeatureDict, FeatureDictError};
use crate::pattern::DependencyPattern;
use crate::tree::{Features, Tree as RustTree, Word as RustWord};

create_exception!(treepattern, TokensNotFullyConnectedError, PyValueError);
create_exception!(treepattern, DuplicateTokensError, PyValueError);
create_exception!(treepattern, TokenNotInMatchTokensError, PyValueError);

/// Convert PatternError to Python exception
impl From<PatternError> for PyErr {
    fn from(err: PatternError) -> PyErr {
        let message = err.to_string();
        match err {
            PatternError::NotFullyConnected { .. } => TokensNotFullyConnectedError::new_err(message),
            PatternError::DuplicateTokens { .. } => DuplicateTokensError::new_err(message),
            PatternError::TokenNotInMatchTokens { .. } => {
                TokenNotInMatchTokensError::new_err(message)
            }
            PatternError::UnknownWord(_) => PyIndexError::new_err(message),
            PatternError::InvalidTree(_) => PyValueError::new_err(message),
        }
    }
}

impl From<FeatureDictError> for PyErr {
    fn from(err: FeatureDictError) -> PyErr {
        PyValueError::new_err(format!("Feature dictionary error: {}", err))
    }
}

impl From<ParseError> for PyErr {
    fn from(err: ParseError) -> PyErr {
        match err {
            ParseError::Io { .. } => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

#[pyclass(name = "Tree")]
#[derive(Clone)]
pub struct PyTree {
    pub(crate) inner: Arc<RustTree>,
}

impl PyTree {
    fn wrap(&self, word: &RustWord) -> PyWord {
        PyWord {
            inner: word.clone(),
            tree: Arc::clone(&self.inner),
        }
    }
}

#[pymethods]
impl PyTree {
    /// Parse the first sentence of a CoNLL-U string.
    #[staticmethod]
    fn from_conllu(text: &str) -> PyResult<Self> {
        match CoNLLUReader::from_str(text).next() {
            Some(tree) => Ok(PyTree {
                inner: Arc::new(tree?),
            }),
            None => Err(PyValueError::new_err("no sentence in CoNLL-U input")),
        }
    }

    /// The word at 0-based position `id`.
    fn word(&self, id: usize) -> PyResult<PyWord> {
        self.inner
            .word(id)
            .map(|word| self.wrap(word))
            .ok_or_else(|| PyIndexError::new_err(format!("word index out of range: {}", id)))
    }

    fn __getitem__(&self, id: usize) -> PyResult<PyWord> {
        self.word(id)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn words(&self) -> Vec<PyWord> {
        self.inner.words.iter().map(|word| self.wrap(word)).collect()
    }

    #[getter]
    fn sentence_text(&self) -> Option<String> {
        self.inner.sentence_text.clone()
    }

    #[getter]
    fn metadata(&self) -> HashMap<String, String> {
        self.inner.metadata.clone()
    }

    #[getter]
    fn forms(&self) -> Vec<String> {
        self.inner.words.iter().map(|w| w.form.clone()).collect()
    }

    /// Distance of each word from the root.
    #[getter]
    fn depths(&self) -> Vec<usize> {
        crate::depth::annotate_depth(&self.inner).to_vec()
    }

    fn __repr__(&self) -> String {
        let n = self.inner.len();
        if n == 0 {
            return "<Tree (empty)>".to_string();
        }

        let words: Vec<&str> = self
            .inner
            .words
            .iter()
            .take(3)
            .map(|w| w.form.as_str())
            .collect();

        if n > 3 {
            format!("<Tree len={} words='{} ...'>", n, words.join(" "))
        } else {
            format!("<Tree len={} words='{}'>", n, words.join(" "))
        }
    }
}

fn features_to_map(features: &Features) -> HashMap<String, String> {
    features
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[pyclass(name = "Word")]
pub struct PyWord {
    inner: RustWord,
    tree: Arc<RustTree>,
}

impl PyWord {
    fn sibling(&self, word: &RustWord) -> PyWord {
        PyWord {
            inner: word.clone(),
            tree: Arc::clone(&self.tree),
        }
    }
}

#[pymethods]
impl PyWord {
    #[getter]
    fn id(&self) -> usize {
        self.inner.id
    }

    #[getter]
    fn form(&self) -> String {
        self.inner.form.clone()
    }

    #[getter]
    fn lemma(&self) -> String {
        self.inner.lemma.clone()
    }

    #[getter]
    fn upos(&self) -> String {
        self.inner.upos.clone()
    }

    #[getter]
    fn xpos(&self) -> Option<String> {
        self.inner.xpos.clone()
    }

    #[getter]
    fn deprel(&self) -> String {
        self.inner.deprel.clone()
    }

    #[getter]
    fn head(&self) -> Option<usize> {
        self.inner.head
    }

    #[getter]
    fn feats(&self) -> HashMap<String, String> {
        features_to_map(&self.inner.feats)
    }

    #[getter]
    fn misc(&self) -> HashMap<String, String> {
        features_to_map(&self.inner.misc)
    }

    /// Distance from the root, None if the word cannot reach it.
    #[getter]
    fn depth(&self) -> Option<usize> {
        self.tree.depth(self.inner.id)
    }

    fn parent(&self) -> Option<PyWord> {
        self.inner.parent(&self.tree).map(|word| self.sibling(word))
    }

    #[getter]
    fn children_ids(&self) -> Vec<usize> {
        self.inner.children.clone()
    }

    fn children(&self) -> Vec<PyWord> {
        self.inner
            .children(&self.tree)
            .into_iter()
            .map(|word| self.sibling(word))
            .collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "<Word id={} form='{}' lemma='{}' upos='{}' deprel='{}'>",
            self.inner.id, self.inner.form, self.inner.lemma, self.inner.upos, self.inner.deprel
        )
    }
}

/// Read every sentence from a CoNLL-U string.
#[pyfunction]
fn read_conllu(text: &str) -> PyResult<Vec<PyTree>> {
    CoNLLUReader::from_str(text)
        .map(|tree| -> PyResult<PyTree> {
            Ok(PyTree {
                inner: Arc::new(tree?),
            })
        })
        .collect()
}

/// Read every sentence from a CoNLL-U file (optionally gzipped).
#[pyfunction]
fn read_conllu_file(path: &str) -> PyResult<Vec<PyTree>> {
    let reader = CoNLLUReader::from_file(Path::new(path))
        .map_err(|e| PyIOError::new_err(format!("Failed to open file {}: {}", path, e)))?;
    reader
        .map(|tree| -> PyResult<PyTree> {
            Ok(PyTree {
                inner: Arc::new(tree?),
            })
        })
        .collect()
}

fn pattern_to_py<'py>(py: Python<'py>, pattern: &DependencyPattern) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty(py);
    for element in pattern {
        let spec = PyDict::new(py);
        spec.set_item("NODE_NAME", element.node_name())?;
        if let Some(parent) = element.parent_name() {
            spec.set_item("NBOR_NAME", parent)?;
        }
        if let Some(relop) = element.spec.nbor_relop {
            spec.set_item("NBOR_RELOP", relop.to_string())?;
        }

        let attrs = PyDict::new(py);
        for (key, value) in element.pattern.iter() {
            attrs.set_item(key, value)?;
        }

        let item = PyDict::new(py);
        item.set_item("SPEC", spec)?;
        item.set_item("PATTERN", attrs)?;
        list.append(item)?;
    }
    Ok(list)
}

/// Build a dependency pattern matching the words at `match_ids`.
///
/// Args:
///     tree: Tree the words come from
///     match_ids: 0-based word positions; must form a connected subtree
///     feature_dict: {output key: word field}, default {"DEP": "dep", "TAG": "tag"}
///
/// Raises:
///     TokensNotFullyConnectedError: words in between the selection are missing
///     DuplicateTokensError: a word is selected twice
///     ValueError: unknown word field in feature_dict
#[pyfunction(name = "build_dependency_pattern")]
#[pyo3(signature = (tree, match_ids, feature_dict=None))]
fn py_build_dependency_pattern<'py>(
    py: Python<'py>,
    tree: &PyTree,
    match_ids: Vec<usize>,
    feature_dict: Option<Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyList>> {
    let feature_dict = match feature_dict {
        Some(dict) => {
            let mut pairs = Vec::with_capacity(dict.len());
            for (key, field) in dict.iter() {
                pairs.push((key.extract::<String>()?, field.extract::<String>()?));
            }
            FeatureDict::from_pairs(pairs)?
        }
        None => FeatureDict::default(),
    };

    let pattern = build_dependency_pattern(&tree.inner, &match_ids, &feature_dict, None)?;
    pattern_to_py(py, &pattern)
}

#[pymodule]
fn treepattern(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTree>()?;
    m.add_class::<PyWord>()?;

    m.add_function(wrap_pyfunction!(read_conllu, m)?)?;
    m.add_function(wrap_pyfunction!(read_conllu_file, m)?)?;
    m.add_function(wrap_pyfunction!(py_build_dependency_pattern, m)?)?;

    let py = m.py();
    m.add(
        "TokensNotFullyConnectedError",
        py.get_type::<TokensNotFullyConnectedError>(),
    )?;
    m.add("DuplicateTokensError", py.get_type::<DuplicateTokensError>())?;
    m.add(
        "TokenNotInMatchTokensError",
        py.get_type::<TokenNotInMatchTokensError>(),
    )?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
