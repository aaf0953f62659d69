//! Loading the identity list and the corpus from disk.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SluiceError};
use crate::identity::IdentityPool;
use crate::record::is_blank;

/// How a corpus is cut into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tokenization {
    /// One unit per line.
    Line,

    /// One unit per run of non-whitespace characters.
    #[default]
    Whitespace,
}

/// Split text into non-blank units.
pub fn tokenize(text: &str, tokenization: Tokenization) -> Vec<String> {
    match tokenization {
        Tokenization::Line => text
            .lines()
            .filter(|line| !is_blank(line))
            .map(str::to_string)
            .collect(),
        Tokenization::Whitespace => text.split_whitespace().map(str::to_string).collect(),
    }
}

/// Parse a newline-delimited identity list. Lines are trimmed and blank ones
/// dropped; duplicates are kept.
pub fn parse_identities(text: &str) -> Result<IdentityPool> {
    let identities: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if identities.is_empty() {
        return Err(SluiceError::input("identity list is empty"));
    }
    IdentityPool::new(identities)
}

/// Read the identity list file.
pub fn load_identities<P: AsRef<Path>>(path: P) -> Result<IdentityPool> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        SluiceError::input(format!("failed to read identities {}: {e}", path.display()))
    })?;
    parse_identities(&text)
}

/// Read and tokenize the corpus file. A corpus with no units is an error.
pub fn load_corpus<P: AsRef<Path>>(path: P, tokenization: Tokenization) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        SluiceError::input(format!("failed to read corpus {}: {e}", path.display()))
    })?;

    let units = tokenize(&text, tokenization);
    if units.is_empty() {
        return Err(SluiceError::input(format!(
            "corpus {} contains no units",
            path.display()
        )));
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_tokenize_lines() {
        let text = "hello world\n\n  \r\nsecond line\r\n";
        assert_eq!(
            tokenize(text, Tokenization::Line),
            vec!["hello world", "second line"]
        );
    }

    #[test]
    fn test_tokenize_whitespace() {
        let text = "hello world\n\n  \tsecond   line\n";
        assert_eq!(
            tokenize(text, Tokenization::Whitespace),
            vec!["hello", "world", "second", "line"]
        );
    }

    #[test]
    fn test_parse_identities() {
        let pool = parse_identities("alice\n  bob \n\nalice\n").unwrap();
        assert_eq!(pool.len(), 3);
        assert!(pool.contains("bob"));
        assert!(parse_identities("\n \n").is_err());
    }

    #[test]
    fn test_load_corpus() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "one two").unwrap();
        writeln!(file, "three").unwrap();

        let units = load_corpus(file.path(), Tokenization::Whitespace).unwrap();
        assert_eq!(units, vec!["one", "two", "three"]);
        let units = load_corpus(file.path(), Tokenization::Line).unwrap();
        assert_eq!(units, vec!["one two", "three"]);
    }

    #[test]
    fn test_missing_or_empty_files() {
        assert!(load_identities("/nonexistent/users.txt").is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_corpus(file.path(), Tokenization::Line).unwrap_err();
        assert!(matches!(err, SluiceError::Input(_)));
    }
}
