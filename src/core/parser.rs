//! Turns free chat text into [`ParsedRequest`]s.
//!
//! Grammar, per `;`-separated segment:
//! - `[[name e:set]]` anywhere in the segment is a named lookup of the bracket content.
//! - otherwise an optional command prefix, then `random`/`rand`/`r` or `rules`
//!   as the first token, then free text mixed with `key:value` filters and
//!   `order:`/`dir:` sort tokens.

use crate::domain::model::{
    Comparator, FilterClause, ParsedRequest, RequestKind, SortClause, SortDirection,
};
use regex::Regex;
use std::sync::LazyLock;

pub const BATCH_DELIMITER: char = ';';

const RANDOM_ALIASES: [&str; 3] = ["random", "rand", "r"];
const RULES_ALIASES: [&str; 1] = ["rules"];
const HELP_ALIASES: [&str; 3] = ["help", "h", "?"];

/// Search keys understood by the remote query grammar.
const FILTER_KEYS: &[&str] = &[
    "a", "artist", "b", "block", "banned", "border", "c", "cmc", "cn", "color", "ci", "commander",
    "date", "e", "edition", "eur", "f", "flavor", "fo", "format", "frame", "ft", "game", "has",
    "id", "identity", "in", "is", "lang", "legal", "loy", "loyalty", "m", "mana", "manavalue", "mv",
    "name", "new", "not", "number", "o", "oracle", "pow", "power", "prefer", "prints", "r",
    "rarity", "restricted", "s", "set", "st", "t", "tix", "tou", "toughness", "type", "unique",
    "usd", "year",
];

const SORT_KEYS: [&str; 2] = ["order", "sort"];
const DIRECTION_KEYS: [&str; 2] = ["dir", "direction"];

static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("bracket pattern is valid"));

static FILTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?)([A-Za-z]+)(!=|<=|>=|:|=|<|>)(.+)$").expect("filter pattern is valid")
});

#[derive(Debug, Clone)]
pub struct QueryParser {
    prefix: String,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new("!")
    }
}

impl QueryParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parses a whole message; segments that yield no valid request are dropped.
    pub fn parse(&self, input: &str) -> Vec<ParsedRequest> {
        input
            .split(BATCH_DELIMITER)
            .filter_map(|segment| self.parse_segment(segment))
            .collect()
    }

    pub fn parse_segment(&self, segment: &str) -> Option<ParsedRequest> {
        let segment = segment.trim();
        if segment.is_empty() {
            return None;
        }

        if let Some(caps) = BRACKET_RE.captures(segment) {
            let tokens = tokenize(&caps[1]);
            return build_request(RequestKind::NamedLookup, &tokens);
        }

        // 說明指令由呼叫端處理，不當成卡名查詢
        if self.is_help(segment) {
            return None;
        }

        let tokens = tokenize(self.strip_prefix(segment));
        let (first, rest) = tokens.split_first()?;
        let command = first.to_lowercase();

        if RANDOM_ALIASES.contains(&command.as_str()) {
            build_request(RequestKind::RandomPick, rest)
        } else if RULES_ALIASES.contains(&command.as_str()) {
            build_request(RequestKind::RulesLookup, rest)
        } else {
            build_request(RequestKind::NamedLookup, &tokens)
        }
    }

    /// True when the message asks for the help text instead of a card.
    pub fn is_help(&self, input: &str) -> bool {
        self.strip_prefix(input.trim())
            .split_whitespace()
            .next()
            .map(|first| HELP_ALIASES.contains(&first.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// True when any batch segment is a help command.
    pub fn wants_help(&self, input: &str) -> bool {
        input
            .split(BATCH_DELIMITER)
            .any(|segment| self.is_help(segment))
    }

    fn strip_prefix<'a>(&self, segment: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            return segment;
        }
        segment
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(segment)
            .trim_start()
    }
}

/// Whitespace split that keeps double-quoted runs in one token.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn build_request(kind: RequestKind, tokens: &[String]) -> Option<ParsedRequest> {
    let mut words: Vec<&str> = Vec::new();
    let mut filters = Vec::new();
    let mut sort_field: Option<String> = None;
    let mut direction = SortDirection::Auto;

    for token in tokens {
        if let Some(value) = keyed_value(token, &SORT_KEYS) {
            let value = clean_sort_value(value);
            if !value.is_empty() {
                sort_field = Some(value);
            }
            continue;
        }
        if let Some(value) = keyed_value(token, &DIRECTION_KEYS) {
            if let Some(dir) = SortDirection::parse(&clean_sort_value(value)) {
                direction = dir;
            }
            continue;
        }
        match parse_filter(token) {
            Some(filter) => filters.push(filter),
            None => words.push(token.as_str()),
        }
    }

    // 只有 dir 沒有 order 時不送排序
    let sort = sort_field.map(|field| SortClause { field, direction });
    ParsedRequest::new(kind, &words.join(" "), filters, sort)
}

fn keyed_value<'a>(token: &'a str, keys: &[&str]) -> Option<&'a str> {
    let (key, value) = token.split_once(':')?;
    keys.iter()
        .any(|k| k.eq_ignore_ascii_case(key))
        .then_some(value)
}

fn clean_sort_value(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c: char| "()[]{}.,;'\"".contains(c))
        .to_lowercase()
}

fn parse_filter(token: &str) -> Option<FilterClause> {
    let caps = FILTER_RE.captures(token)?;
    let key = caps[2].to_lowercase();
    if !FILTER_KEYS.contains(&key.as_str()) {
        return None;
    }
    let comparator = Comparator::parse(&caps[3])?;
    let value = caps[4].trim_matches('"');
    if value.trim().is_empty() {
        return None;
    }

    let mut filter = FilterClause::new(key, value).with_comparator(comparator);
    if !caps[1].is_empty() {
        filter = filter.negated();
    }
    Some(filter)
}
