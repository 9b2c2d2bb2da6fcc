//! Inline sheet mentions: `@Sheet!A1` and `@Sheet!A1:B3`.
//!
//! Sheet names match `[A-Za-z_][A-Za-z0-9_]*`. Cell parts are uppercase only
//! in the grammar; producers uppercase them before emitting. All offsets are
//! byte offsets into the source `str`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::address::AddressError;
use crate::range::{Range, ReferencePair};

const MENTION_PATTERN: &str = r"@([A-Za-z_][A-Za-z0-9_]*)!([A-Z]+[0-9]+)(?::([A-Z]+[0-9]+))?";

fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MENTION_PATTERN).expect("mention pattern is valid"))
}

fn anchored_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{MENTION_PATTERN}$")).expect("mention pattern is valid"))
}

/// A mention found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Matched text, e.g. "@Sales!A1:B3".
    pub full: String,
    pub sheet: String,
    pub from: String,
    /// End reference for range mentions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl Mention {
    fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        let whole = caps.get(0)?;
        Some(Self {
            full: whole.as_str().to_string(),
            sheet: caps.get(1)?.as_str().to_string(),
            from: caps.get(2)?.as_str().to_string(),
            to: caps.get(3).map(|m| m.as_str().to_string()),
            start: whole.start(),
            end: whole.end(),
        })
    }

    /// End reference, defaulting to `from` for single-cell mentions.
    pub fn to_or_from(&self) -> &str {
        self.to.as_deref().unwrap_or(&self.from)
    }

    /// Normalized range the mention points at.
    ///
    /// The grammar accepts row 0 ("A0"), which is not a real cell.
    pub fn range(&self) -> Result<Range, AddressError> {
        Range::resolve_from_references(&self.from, self.to_or_from())
    }
}

/// Parameters for a range read derived from a mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeParams {
    pub sheet: String,
    pub from: String,
    pub to: String,
}

/// A piece of text, either plain or a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Mention(Mention),
}

impl Segment<'_> {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain(s) => s,
            Segment::Mention(m) => &m.full,
        }
    }

    pub fn is_mention(&self) -> bool {
        matches!(self, Segment::Mention(_))
    }
}

/// All mentions in `text`, left to right, non-overlapping.
pub fn parse_all(text: &str) -> Vec<Mention> {
    mention_re()
        .captures_iter(text)
        .filter_map(|caps| Mention::from_captures(&caps))
        .collect()
}

/// Parse a standalone mention; the whole string must match.
pub fn parse_one(candidate: &str) -> Option<Mention> {
    anchored_re()
        .captures(candidate)
        .and_then(|caps| Mention::from_captures(&caps))
}

pub fn is_valid_mention(candidate: &str) -> bool {
    anchored_re().is_match(candidate)
}

pub fn has_mentions(text: &str) -> bool {
    mention_re().is_match(text)
}

/// Build a mention. Cell parts are uppercased; `to` equal to `from` (or absent)
/// yields the single-cell form.
pub fn generate(sheet: &str, from: &str, to: Option<&str>) -> String {
    let from = from.to_uppercase();
    match to.map(str::to_uppercase) {
        Some(to) if to != from => format!("@{sheet}!{from}:{to}"),
        _ => format!("@{sheet}!{from}"),
    }
}

/// Mention for a finished selection.
pub fn generate_from_selection(sheet: &str, pair: &ReferencePair) -> String {
    generate(sheet, &pair.from, Some(&pair.to))
}

/// Result of inserting a mention into an input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub text: String,
    /// Offset just past the trailing space.
    pub cursor: usize,
}

/// Insert `mention` at `cursor`, padding with a leading space unless the
/// previous character is whitespace or the start of text, and always one
/// trailing space.
///
/// `cursor` is clamped to the text length and moved back to a char boundary.
pub fn insert_at_cursor(text: &str, cursor: usize, mention: &str) -> Insertion {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let (before, after) = text.split_at(cursor);

    let needs_space = before.chars().next_back().is_some_and(|c| !c.is_whitespace());
    let insert = if needs_space {
        format!(" {mention} ")
    } else {
        format!("{mention} ")
    };

    Insertion {
        text: format!("{before}{insert}{after}"),
        cursor: cursor + insert.len(),
    }
}

/// Replace the span of `mention` in `text`. `None` when `mention` was not
/// parsed from `text` (its span is out of range or holds other text).
pub fn replace_mention(text: &str, mention: &Mention, replacement: &str) -> Option<String> {
    if text.get(mention.start..mention.end)? != mention.full {
        return None;
    }
    let before = text.get(..mention.start)?;
    let after = text.get(mention.end..)?;
    Some(format!("{before}{replacement}{after}"))
}

/// Split `text` into plain and mention segments, in order. Concatenating the
/// segment texts reproduces `text` exactly.
pub fn segment(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for mention in parse_all(text) {
        if mention.start > last {
            segments.push(Segment::Plain(&text[last..mention.start]));
        }
        last = mention.end;
        segments.push(Segment::Mention(mention));
    }

    if last < text.len() {
        segments.push(Segment::Plain(&text[last..]));
    }
    segments
}

/// Range read parameters for every mention in `text`.
pub fn extract_range_params(text: &str) -> Vec<RangeParams> {
    parse_all(text)
        .into_iter()
        .map(|m| RangeParams {
            to: m.to_or_from().to_string(),
            sheet: m.sheet,
            from: m.from,
        })
        .collect()
}
