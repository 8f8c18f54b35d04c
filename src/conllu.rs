//! CoNLL-U file parsing
//!
//! Reads parser output in CoNLL-U format into `Tree`s, one per sentence.
//! Multiword token ranges and empty nodes are skipped; every sentence is
//! checked to be a single rooted tree before it is returned.
//!
//! CoNLL-U format: https://universaldependencies.org/format.html

use crate::tree::{Features, Tree, TreeError, Word, WordId};
use atoi::FromRadix10Checked;
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Lines};
use std::path::Path;
use thiserror::Error;

/// Error during CoNLL-U parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error at line {line_num}: {message}")]
    Line { line_num: usize, message: String },

    #[error("Invalid sentence ending at line {line_num}: {source}")]
    Tree {
        line_num: usize,
        #[source]
        source: TreeError,
    },

    #[error("IO error at line {line_num}: {source}")]
    Io {
        line_num: usize,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    fn line(line_num: usize, message: String) -> Self {
        ParseError::Line { line_num, message }
    }
}

/// Token ID column: a word, a multiword range, or an empty node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenId {
    Single(usize),
    Range,
    Decimal,
}

/// CoNLL-U reader that iterates over sentences
pub struct CoNLLUReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
}

impl<R: BufRead> CoNLLUReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }
}

impl CoNLLUReader<Box<dyn BufRead>> {
    /// Create a reader from a file path; `.gz` files are decompressed
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl CoNLLUReader<Cursor<String>> {
    /// Create a reader from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::new(Cursor::new(text.to_string()))
    }
}

impl<R: BufRead> Iterator for CoNLLUReader<R> {
    type Item = Result<Tree, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut tree_lines = Vec::new();
        let mut metadata = HashMap::new();
        let mut sentence_text = None;

        // Read lines until a blank line (sentence boundary) or EOF
        loop {
            self.line_num += 1;
            match self.lines.next() {
                None => {
                    if tree_lines.is_empty() {
                        return None;
                    }
                    break;
                }
                Some(Err(source)) => {
                    return Some(Err(ParseError::Io {
                        line_num: self.line_num,
                        source,
                    }));
                }
                Some(Ok(line)) => {
                    let line = line.trim_end_matches(['\r', '\n']);

                    if line.trim().is_empty() {
                        if !tree_lines.is_empty() {
                            break;
                        }
                        continue;
                    }

                    if let Some(comment) = line.strip_prefix('#') {
                        parse_comment(comment, &mut metadata, &mut sentence_text);
                        continue;
                    }

                    tree_lines.push((self.line_num, line.to_string()));
                }
            }
        }

        Some(parse_tree(tree_lines, sentence_text, metadata, self.line_num))
    }
}

/// Parse a comment line (after the `#`)
fn parse_comment(
    comment: &str,
    metadata: &mut HashMap<String, String>,
    sentence_text: &mut Option<String>,
) {
    if let Some((key, value)) = comment.split_once('=') {
        let key = key.trim();
        let value = value.trim();

        if key == "text" {
            *sentence_text = Some(value.to_string());
        } else {
            metadata.insert(key.to_string(), value.to_string());
        }
    }
}

/// Parse accumulated lines into a validated Tree
fn parse_tree(
    lines: Vec<(usize, String)>,
    sentence_text: Option<String>,
    metadata: HashMap<String, String>,
    end_line: usize,
) -> Result<Tree, ParseError> {
    let mut tree = Tree::with_metadata(sentence_text, metadata);
    let mut heads = Vec::new();

    for (line_num, line) in &lines {
        if let Some((word, head)) = parse_line(line, *line_num, tree.len())? {
            tree.add_word(word);
            heads.push(head);
        }
    }

    for (id, head) in heads.into_iter().enumerate() {
        match head {
            Some(head) if head < tree.len() => tree.set_parent(id, head),
            Some(head) => {
                return Err(ParseError::Tree {
                    line_num: end_line,
                    source: TreeError::HeadOutOfRange { word: id, head },
                });
            }
            None => {}
        }
    }

    tree.validate().map_err(|source| ParseError::Tree {
        line_num: end_line,
        source,
    })?;

    Ok(tree)
}

/// Parse a single CoNLL-U line into a Word and its 0-based head.
/// Returns None for multiword tokens and empty nodes.
fn parse_line(
    line: &str,
    line_num: usize,
    word_id: WordId,
) -> Result<Option<(Word, Option<WordId>)>, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() != 10 {
        return Err(ParseError::line(
            line_num,
            format!("Expected 10 fields, found {}", fields.len()),
        ));
    }

    match parse_id(fields[0]).ok_or_else(|| {
        ParseError::line(line_num, format!("Invalid ID: {}", fields[0]))
    })? {
        TokenId::Range | TokenId::Decimal => return Ok(None),
        TokenId::Single(id) if id != word_id + 1 => {
            return Err(ParseError::line(
                line_num,
                format!("Expected word ID {}, found {}", word_id + 1, id),
            ));
        }
        TokenId::Single(_) => {}
    }

    let form = fields[1];
    let lemma = if fields[2] == "_" { form } else { fields[2] };
    let head = parse_head(fields[6])
        .ok_or_else(|| ParseError::line(line_num, format!("Invalid HEAD: {}", fields[6])))?;

    let mut word = Word::new(word_id, form, lemma, fields[3], fields[4], fields[7]);
    word.feats = parse_pairs(fields[5]);
    word.misc = parse_pairs(fields[9]);

    Ok(Some((word, head)))
}

/// Parse an unsigned decimal that must use every byte
fn parse_number(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    match usize::from_radix_10_checked(bytes) {
        (Some(n), used) if used == bytes.len() && used > 0 => Some(n),
        _ => None,
    }
}

/// Parse ID field (integer, range, or decimal)
fn parse_id(s: &str) -> Option<TokenId> {
    if let Some((start, end)) = s.split_once('-') {
        parse_number(start)?;
        parse_number(end)?;
        Some(TokenId::Range)
    } else if let Some((main, sub)) = s.split_once('.') {
        parse_number(main)?;
        parse_number(sub)?;
        Some(TokenId::Decimal)
    } else {
        parse_number(s).map(TokenId::Single)
    }
}

/// Parse HEAD field; 0 marks the root. HEAD is 1-indexed in CoNLL-U,
/// WordIds are 0-indexed.
fn parse_head(s: &str) -> Option<Option<WordId>> {
    if s == "_" {
        return Some(None);
    }
    parse_number(s).map(|head| head.checked_sub(1))
}

/// Parse FEATS or MISC field (key=value|key=value)
fn parse_pairs(s: &str) -> Features {
    let mut pairs = Features::new();

    if s == "_" {
        return pairs;
    }

    for pair in s.split('|') {
        if let Some((key, value)) = pair.split_once('=') {
            pairs.insert(key.to_string(), value.to_string());
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const SAT_CONLLU: &str = "# sent_id = 1
# text = The cat sat on the mat.
1\tThe\tthe\tDET\tDT\tDefinite=Def|PronType=Art\t2\tdet\t_\t_
2\tcat\tcat\tNOUN\tNN\tNumber=Sing\t3\tnsubj\t_\t_
3\tsat\tsit\tVERB\tVBD\tTense=Past\t0\troot\t_\t_
4\ton\ton\tADP\tIN\t_\t3\tprep\t_\t_
5\tthe\tthe\tDET\tDT\t_\t6\tdet\t_\t_
6\tmat\tmat\tNOUN\tNN\t_\t4\tpobj\t_\tSpaceAfter=No
7\t.\t.\tPUNCT\t.\t_\t3\tpunct\t_\t_

";

    #[test]
    fn test_parse_simple_sentence() {
        let mut reader = CoNLLUReader::from_str(SAT_CONLLU);
        let tree = reader.next().unwrap().unwrap();

        assert_eq!(tree.len(), 7);
        assert_eq!(tree.sentence_text.as_deref(), Some("The cat sat on the mat."));
        assert_eq!(tree.metadata.get("sent_id").map(String::as_str), Some("1"));
        assert_eq!(tree.root_id, Some(2));

        assert_eq!(tree.words[0].form, "The");
        assert_eq!(tree.words[0].xpos.as_deref(), Some("DT"));
        assert_eq!(tree.words[0].head, Some(1));
        assert_eq!(tree.words[2].head, None);
        assert_eq!(tree.words[2].children, vec![1, 3, 6]);
        assert_eq!(tree.words[1].feats.get("Number"), Some("Sing"));
        assert_eq!(tree.words[5].misc.get("SpaceAfter"), Some("No"));

        assert!(reader.next().is_none());
    }

    #[test]
    fn test_parse_multiple_sentences() {
        let conllu = "1\tdogs\tdog\tNOUN\tNNS\t_\t2\tnsubj\t_\t_
2\trun\trun\tVERB\tVBP\t_\t0\troot\t_\t_


1\tCats\tcat\tNOUN\tNNS\t_\t2\tnsubj\t_\t_
2\tsleep\t_\tVERB\tVBP\t_\t0\troot\t_\t_";

        let trees: Vec<Tree> = CoNLLUReader::from_str(conllu)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(trees.len(), 2);
        assert_eq!(trees[1].words[1].lemma, "sleep");
    }

    #[test]
    fn test_skips_multiword_and_empty_nodes() {
        let conllu = "1-2\tvámonos\t_\t_\t_\t_\t_\t_\t_\t_
1\tvamos\tir\tVERB\t_\t_\t0\troot\t_\t_
2\tnos\tnosotros\tPRON\t_\t_\t1\tobj\t_\t_
2.1\tfoo\tfoo\tX\t_\t_\t_\t_\t_\t_

";
        let tree = CoNLLUReader::from_str(conllu).next().unwrap().unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.words[1].head, Some(0));
        assert_eq!(tree.words[0].xpos, None);
    }

    #[test]
    fn test_wrong_field_count() {
        let conllu = "1\tdogs\tdog\tNOUN\n";
        let err = CoNLLUReader::from_str(conllu).next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error at line 1: Expected 10 fields, found 4"
        );
    }

    #[test]
    fn test_out_of_sequence_id() {
        let conllu = "1\ta\ta\tX\t_\t_\t0\troot\t_\t_
3\tb\tb\tX\t_\t_\t1\tdep\t_\t_
";
        let err = CoNLLUReader::from_str(conllu).next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error at line 2: Expected word ID 2, found 3"
        );
    }

    #[test]
    fn test_invalid_head() {
        let conllu = "1\tdogs\tdog\tNOUN\t_\t_\tx2\tnsubj\t_\t_\n";
        let err = CoNLLUReader::from_str(conllu).next().unwrap().unwrap_err();
        assert!(matches!(err, ParseError::Line { line_num: 1, .. }));
    }

    #[test]
    fn test_rejects_non_tree() {
        let two_roots = "1\ta\ta\tX\t_\t_\t0\troot\t_\t_
2\tb\tb\tX\t_\t_\t0\troot\t_\t_
";
        let err = CoNLLUReader::from_str(two_roots).next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            ParseError::Tree {
                source: TreeError::MultipleRoots(0, 1),
                ..
            }
        ));

        let dangling = "1\ta\ta\tX\t_\t_\t0\troot\t_\t_
2\tb\tb\tX\t_\t_\t9\tdep\t_\t_
";
        let err = CoNLLUReader::from_str(dangling).next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            ParseError::Tree {
                source: TreeError::HeadOutOfRange { word: 1, head: 8 },
                ..
            }
        ));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1"), Some(TokenId::Single(1)));
        assert_eq!(parse_id("5-7"), Some(TokenId::Range));
        assert_eq!(parse_id("10.5"), Some(TokenId::Decimal));
        assert_eq!(parse_id("5-"), None);
        assert_eq!(parse_id("1x"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn test_parse_head() {
        assert_eq!(parse_head("0"), Some(None));
        assert_eq!(parse_head("_"), Some(None));
        assert_eq!(parse_head("1"), Some(Some(0)));
        assert_eq!(parse_head("5"), Some(Some(4)));
        assert_eq!(parse_head("-1"), None);
    }

    #[test]
    fn test_parse_pairs() {
        let feats = parse_pairs("Case=Nom|Number=Sing");
        assert_eq!(feats.get("Case"), Some("Nom"));
        assert_eq!(feats.get("Number"), Some("Sing"));
        assert!(parse_pairs("_").is_empty());
    }

    #[test]
    fn test_read_gzip_file() {
        let dir = std::env::temp_dir().join(format!("treepattern-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sat.conllu.gz");

        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SAT_CONLLU.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let trees: Vec<Tree> = CoNLLUReader::from_file(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].words[5].form, "mat");
    }
}
