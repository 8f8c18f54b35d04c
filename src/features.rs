//! Feature dictionaries and per-word attribute extraction
//!
//! A `FeatureDict` maps output keys (the names that appear in a pattern)
//! to word fields. Field names are resolved when the dictionary is built,
//! so extraction itself cannot fail.

use crate::pattern::Attributes;
use crate::tree::Word;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Value extracted for an absent optional field
pub const EMPTY_VALUE: &str = "_";

/// A word field that can be read into a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenField {
    Form,
    Lemma,
    Upos,
    Xpos,
    DepRel,
    Feat(String),
    Misc(String),
}

impl TokenField {
    /// Read this field from a word
    pub fn read<'a>(&self, word: &'a Word) -> &'a str {
        match self {
            TokenField::Form => &word.form,
            TokenField::Lemma => &word.lemma,
            TokenField::Upos => &word.upos,
            TokenField::Xpos => word.xpos.as_deref().unwrap_or(EMPTY_VALUE),
            TokenField::DepRel => &word.deprel,
            TokenField::Feat(name) => word.feats.get(name).unwrap_or(EMPTY_VALUE),
            TokenField::Misc(name) => word.misc.get(name).unwrap_or(EMPTY_VALUE),
        }
    }
}

impl FromStr for TokenField {
    type Err = FeatureDictError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let field = match name {
            "form" | "text" | "orth_" => TokenField::Form,
            "lemma" | "lemma_" => TokenField::Lemma,
            "upos" | "pos" | "pos_" => TokenField::Upos,
            "xpos" | "tag" | "tag_" => TokenField::Xpos,
            "deprel" | "dep" | "dep_" => TokenField::DepRel,
            _ => match name.split_once('.') {
                Some(("feats", key)) if !key.is_empty() => TokenField::Feat(key.to_string()),
                Some(("misc", key)) if !key.is_empty() => TokenField::Misc(key.to_string()),
                _ => return Err(FeatureDictError::UnknownField(name.to_string())),
            },
        };
        Ok(field)
    }
}

impl fmt::Display for TokenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenField::Form => write!(f, "form"),
            TokenField::Lemma => write!(f, "lemma"),
            TokenField::Upos => write!(f, "upos"),
            TokenField::Xpos => write!(f, "xpos"),
            TokenField::DepRel => write!(f, "deprel"),
            TokenField::Feat(name) => write!(f, "feats.{}", name),
            TokenField::Misc(name) => write!(f, "misc.{}", name),
        }
    }
}

/// Error type for feature dictionary configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureDictError {
    #[error("Unknown word field: {0}")]
    UnknownField(String),

    #[error("Feature dictionary keys must not be empty")]
    EmptyKey,

    #[error("Malformed feature dictionary entry: {0:?} (expected KEY=field)")]
    Malformed(String),
}

/// Ordered mapping from output key to word field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDict {
    entries: Vec<(String, TokenField)>,
}

impl FeatureDict {
    /// An empty dictionary; patterns built with it carry no attributes
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from `(output key, field name)` pairs
    pub fn from_pairs<K, F>(pairs: impl IntoIterator<Item = (K, F)>) -> Result<Self, FeatureDictError>
    where
        K: Into<String>,
        F: AsRef<str>,
    {
        let mut dict = Self::new();
        for (key, field) in pairs {
            dict.insert(key, field.as_ref())?;
        }
        Ok(dict)
    }

    /// Map `key` to the named field, replacing an earlier mapping for `key`
    pub fn insert(&mut self, key: impl Into<String>, field: &str) -> Result<(), FeatureDictError> {
        let key = key.into();
        if key.is_empty() {
            return Err(FeatureDictError::EmptyKey);
        }
        let field: TokenField = field.parse()?;
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = field,
            None => self.entries.push((key, field)),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&TokenField> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenField)> {
        self.entries.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FeatureDict {
    /// `{"DEP": deprel, "TAG": xpos}`
    fn default() -> Self {
        Self {
            entries: vec![
                ("DEP".to_string(), TokenField::DepRel),
                ("TAG".to_string(), TokenField::Xpos),
            ],
        }
    }
}

/// Parses `"DEP=dep,TAG=tag"`; blank entries are skipped
impl FromStr for FeatureDict {
    type Err = FeatureDictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut dict = Self::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((key, field)) = entry.split_once('=') else {
                return Err(FeatureDictError::Malformed(entry.to_string()));
            };
            dict.insert(key.trim(), field.trim())?;
        }
        Ok(dict)
    }
}

impl fmt::Display for FeatureDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .entries
            .iter()
            .map(|(key, field)| format!("{}={}", key, field))
            .collect();
        write!(f, "{}", entries.join(","))
    }
}

impl<'de> Deserialize<'de> for FeatureDict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Attributes::deserialize(deserializer)?;
        FeatureDict::from_pairs(raw).map_err(serde::de::Error::custom)
    }
}

/// Attribute constraints for one word, keyed by the dictionary's output
/// keys in dictionary order
pub fn extract_features(word: &Word, feature_dict: &FeatureDict) -> Attributes {
    feature_dict
        .iter()
        .map(|(key, field)| (key.to_string(), field.read(word).to_string()))
        .collect()
}
