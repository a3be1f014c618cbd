//! Natural-language query interpreter
//!
//! Turns phrases such as "all single word palindromic strings" or "strings
//! longer than 10 characters containing the letter z" into a [`FilterSet`].
//!
//! There is no real language understanding here. The query is lower-cased
//! and run through a fixed, ordered table of rules. Each rule either looks
//! for a literal phrase or a regex, and writes one or more filter keys when
//! it fires. Later rules may overwrite earlier ones, so the position of a
//! rule in [`RULES`] is its precedence.

use crate::filter::{FilterError, FilterSet};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur while interpreting a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Query was empty or whitespace only
    #[error("empty query")]
    EmptyQuery,

    /// No rule matched
    #[error("unable to parse natural language query")]
    Unparseable,

    /// A captured character was not exactly one character
    #[error("containsCharacter must be a single character, got {0:?}")]
    InvalidCharacter(String),

    /// Parsed minimum length exceeds parsed maximum length
    #[error("conflicting length filters (minLength {min} > maxLength {max})")]
    ConflictingLengths {
        /// Parsed minimum length
        min: usize,
        /// Parsed maximum length
        max: usize,
    },
}

static LONGER_THAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"longer than ([0-9]+)").unwrap());

static SHORTER_THAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"shorter than ([0-9]+)").unwrap());

static EXACT_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:length of|of length) ([0-9]+)").unwrap());

static LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"letter\s+([a-zA-Z0-9])").unwrap());

static CONTAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"contain(?:s|ing)?\s+(?:the\s+)?([a-zA-Z0-9])").unwrap()
});

static CONTAINING_ANY_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"containing.*letter\s+([a-zA-Z0-9])").unwrap());

static CONTAINING_THE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"containing the letter\s+([a-zA-Z0-9])").unwrap());

static CONTAINING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"containing\s+([a-zA-Z0-9])").unwrap());

/// What a rule looks for in the lower-cased query
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// Fires when any of the phrases appears as a substring
    Phrase(&'static [&'static str]),
    /// Fires on the first regex match; group 1 is handed to the action
    Pattern(&'static LazyLock<Regex>),
}

/// When a character rule may write `containsCharacter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Always replace whatever an earlier rule set
    Always,
    /// Only write if no earlier rule set a character
    IfUnset,
}

/// What a rule does once triggered
#[derive(Debug, Clone, Copy)]
pub enum Action {
    /// `isPalindrome = true`
    Palindrome,
    /// `wordCount = 1`
    SingleWord,
    /// `minLength = N + 1`
    LongerThan,
    /// `maxLength = max(0, N - 1)`
    ShorterThan,
    /// `minLength = maxLength = N`
    ExactLength,
    /// `containsCharacter = <captured>`
    CapturedCharacter(Overwrite),
    /// `containsCharacter = <fixed>`
    FixedCharacter(char, Overwrite),
}

/// One entry in the rule table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Short name, reported in [`Interpretation::matched_rules`]
    pub name: &'static str,
    /// Condition
    pub trigger: Trigger,
    /// Effect
    pub action: Action,
}

/// The rule table, in evaluation order
pub static RULES: &[Rule] = &[
    Rule {
        name: "palindrome",
        trigger: Trigger::Phrase(&["palindrom"]),
        action: Action::Palindrome,
    },
    Rule {
        name: "single-word",
        trigger: Trigger::Phrase(&["single word", "one word", "single-word"]),
        action: Action::SingleWord,
    },
    Rule {
        name: "longer-than",
        trigger: Trigger::Pattern(&LONGER_THAN),
        action: Action::LongerThan,
    },
    Rule {
        name: "shorter-than",
        trigger: Trigger::Pattern(&SHORTER_THAN),
        action: Action::ShorterThan,
    },
    Rule {
        name: "exact-length",
        trigger: Trigger::Pattern(&EXACT_LENGTH),
        action: Action::ExactLength,
    },
    Rule {
        name: "letter",
        trigger: Trigger::Pattern(&LETTER),
        action: Action::CapturedCharacter(Overwrite::Always),
    },
    Rule {
        name: "contain",
        trigger: Trigger::Pattern(&CONTAIN),
        action: Action::CapturedCharacter(Overwrite::IfUnset),
    },
    Rule {
        name: "first-vowel",
        trigger: Trigger::Phrase(&["first vowel"]),
        action: Action::FixedCharacter('a', Overwrite::Always),
    },
    Rule {
        name: "containing-any-letter",
        trigger: Trigger::Pattern(&CONTAINING_ANY_LETTER),
        action: Action::CapturedCharacter(Overwrite::Always),
    },
    Rule {
        name: "containing-the-letter",
        trigger: Trigger::Pattern(&CONTAINING_THE_LETTER),
        action: Action::CapturedCharacter(Overwrite::Always),
    },
    // Anything this matches, "contain" has already matched, so it never
    // changes the result.
    Rule {
        name: "containing",
        trigger: Trigger::Pattern(&CONTAINING),
        action: Action::CapturedCharacter(Overwrite::IfUnset),
    },
];

/// Result of interpreting a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// Filters derived from the query
    pub filters: FilterSet,
    /// Names of the rules that fired, in evaluation order
    pub matched_rules: Vec<&'static str>,
}

/// Filters collected while the rules run
///
/// The character is kept as captured text until every rule has had its say.
#[derive(Debug, Default)]
struct Draft {
    filters: FilterSet,
    character: Option<String>,
}

impl Rule {
    /// Test the trigger, returning the capture (if any) when it fires
    fn fire<'t>(&self, text: &'t str) -> Option<Option<&'t str>> {
        match self.trigger {
            Trigger::Phrase(phrases) => phrases
                .iter()
                .any(|phrase| text.contains(phrase))
                .then_some(None),
            Trigger::Pattern(regex) => regex
                .captures(text)
                .map(|caps| caps.get(1).map(|m| m.as_str())),
        }
    }

    fn apply(&self, capture: Option<&str>, draft: &mut Draft) {
        match self.action {
            Action::Palindrome => draft.filters.is_palindrome = Some(true),
            Action::SingleWord => draft.filters.word_count = Some(1),
            Action::LongerThan => {
                let n = number(capture);
                draft.filters.min_length = Some(n.saturating_add(1));
            }
            Action::ShorterThan => {
                let n = number(capture);
                draft.filters.max_length = Some(n.saturating_sub(1));
            }
            Action::ExactLength => {
                let n = number(capture);
                draft.filters.min_length = Some(n);
                draft.filters.max_length = Some(n);
            }
            Action::CapturedCharacter(overwrite) => {
                if let Some(c) = capture {
                    set_character(draft, c.to_string(), overwrite);
                }
            }
            Action::FixedCharacter(c, overwrite) => {
                set_character(draft, c.to_string(), overwrite);
            }
        }
    }
}

fn set_character(draft: &mut Draft, c: String, overwrite: Overwrite) {
    if overwrite == Overwrite::Always || draft.character.is_none() {
        draft.character = Some(c);
    }
}

/// Captures are all digits, so the only failure is overflow, which saturates
fn number(capture: Option<&str>) -> usize {
    capture
        .unwrap_or_default()
        .parse()
        .unwrap_or(usize::MAX)
}

/// Interpret a query, reporting which rules fired
///
/// # Errors
///
/// See [`QueryError`]. An empty query fails before any rule runs.
pub fn interpret(query: &str) -> Result<Interpretation, QueryError> {
    let text = query.trim().to_lowercase();
    if text.is_empty() {
        return Err(QueryError::EmptyQuery);
    }

    let mut draft = Draft::default();
    let mut matched_rules = Vec::new();

    for rule in RULES {
        if let Some(capture) = rule.fire(&text) {
            rule.apply(capture, &mut draft);
            matched_rules.push(rule.name);
        }
    }

    let filters = finish(draft)?;
    Ok(Interpretation {
        filters,
        matched_rules,
    })
}

/// Interpret a query into a filter set
///
/// # Examples
///
/// ```
/// use lexis_domain::parse;
///
/// let filters = parse("all single word palindromic strings").unwrap();
/// assert_eq!(filters.word_count, Some(1));
/// assert_eq!(filters.is_palindrome, Some(true));
///
/// assert!(parse("strings longer than 10 shorter than 5").is_err());
/// ```
pub fn parse(query: &str) -> Result<FilterSet, QueryError> {
    interpret(query).map(|interpretation| interpretation.filters)
}

fn finish(draft: Draft) -> Result<FilterSet, QueryError> {
    let Draft {
        mut filters,
        character,
    } = draft;

    if filters.is_empty() && character.is_none() {
        return Err(QueryError::Unparseable);
    }

    if let Some(raw) = character {
        filters
            .set_contains_character(&raw)
            .map_err(|_| QueryError::InvalidCharacter(raw))?;
    }

    filters.check_lengths().map_err(|e| match e {
        FilterError::ConflictingLengths { min, max } => {
            QueryError::ConflictingLengths { min, max }
        }
        FilterError::NotSingleCharacter(raw) => QueryError::InvalidCharacter(raw),
    })?;

    Ok(filters)
}
