//! String analysis - the deterministic properties of a piece of text

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Properties computed from a string value
///
/// Every field is a pure function of the input, so equal strings always
/// produce equal properties. That is what makes the content hash usable as
/// a record identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    /// Number of characters (Unicode scalar values)
    pub length: usize,

    /// True when the lower-cased string reads the same reversed
    pub is_palindrome: bool,

    /// Number of distinct characters, case-sensitive
    pub unique_character_count: usize,

    /// Number of maximal runs of non-whitespace characters
    pub word_count: usize,

    /// Lowercase hex SHA-256 of the UTF-8 bytes
    pub hash: String,

    /// Occurrences of each distinct character, case-sensitive
    pub character_frequency: BTreeMap<char, usize>,
}

/// Analyze a string
///
/// Total over all inputs, including the empty string.
///
/// # Examples
///
/// ```
/// use lexis_domain::analyze;
///
/// let props = analyze("Abba");
/// assert!(props.is_palindrome);
/// assert_eq!(props.length, 4);
/// assert_eq!(props.word_count, 1);
/// ```
pub fn analyze(value: &str) -> Properties {
    let character_frequency = character_frequency(value);

    Properties {
        length: value.chars().count(),
        is_palindrome: is_palindrome(value),
        unique_character_count: character_frequency.len(),
        word_count: value.split_whitespace().count(),
        hash: content_hash(value),
        character_frequency,
    }
}

/// SHA-256 of the UTF-8 encoding, hex-encoded lowercase
pub fn content_hash(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

/// Case-insensitive palindrome check
///
/// Only case folding is applied; whitespace and punctuation count.
pub fn is_palindrome(value: &str) -> bool {
    let folded: Vec<char> = value.to_lowercase().chars().collect();
    folded.iter().eq(folded.iter().rev())
}

fn character_frequency(value: &str) -> BTreeMap<char, usize> {
    let mut frequency = BTreeMap::new();
    for c in value.chars() {
        *frequency.entry(c).or_insert(0) += 1;
    }
    frequency
}
