use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One user-submitted chat message, captured as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub text: String,
    pub requester: String,
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(
        text: impl Into<String>,
        requester: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            requester: requester.into(),
            received_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    NamedLookup,
    RulesLookup,
    RandomPick,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::NamedLookup => "named",
            RequestKind::RulesLookup => "rules",
            RequestKind::RandomPick => "random",
        }
    }
}

/// Operator between a filter key and its value, e.g. `cmc>=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Colon,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Colon => ":",
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::Less => "<",
            Comparator::LessOrEqual => "<=",
            Comparator::Greater => ">",
            Comparator::GreaterOrEqual => ">=",
        }
    }

    pub fn parse(op: &str) -> Option<Self> {
        match op {
            ":" => Some(Comparator::Colon),
            "=" => Some(Comparator::Equal),
            "!=" => Some(Comparator::NotEqual),
            "<" => Some(Comparator::Less),
            "<=" => Some(Comparator::LessOrEqual),
            ">" => Some(Comparator::Greater),
            ">=" => Some(Comparator::GreaterOrEqual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterClause {
    pub key: String,
    pub value: String,
    pub comparator: Comparator,
    pub negated: bool,
}

impl FilterClause {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            comparator: Comparator::Colon,
            negated: false,
        }
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    /// Renders the clause back into remote search syntax.
    pub fn to_query_token(&self) -> String {
        let value = if self.value.contains(char::is_whitespace) {
            format!("\"{}\"", self.value)
        } else {
            self.value.clone()
        };
        format!(
            "{}{}{}{}",
            if self.negated { "-" } else { "" },
            self.key,
            self.comparator.as_str(),
            value
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
    Auto,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
            SortDirection::Auto => "auto",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            "auto" => Some(SortDirection::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

/// One card-query intent extracted from a message.
///
/// Fields are private: a request is only built through [`ParsedRequest::new`],
/// which refuses an empty term for every kind except `RandomPick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRequest {
    kind: RequestKind,
    term: String,
    filters: Vec<FilterClause>,
    sort: Option<SortClause>,
}

impl ParsedRequest {
    pub fn new(
        kind: RequestKind,
        term: &str,
        filters: Vec<FilterClause>,
        sort: Option<SortClause>,
    ) -> Option<Self> {
        let term = term.split_whitespace().collect::<Vec<_>>().join(" ");
        if term.is_empty() && kind != RequestKind::RandomPick {
            return None;
        }
        Some(Self {
            kind,
            term,
            filters,
            sort,
        })
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn filters(&self) -> &[FilterClause] {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortClause> {
        self.sort.as_ref()
    }

    /// Term followed by the filter clauses in their original order.
    pub fn search_query(&self) -> String {
        let mut parts = Vec::with_capacity(self.filters.len() + 1);
        if !self.term.is_empty() {
            parts.push(self.term.clone());
        }
        parts.extend(self.filters.iter().map(FilterClause::to_query_token));
        parts.join(" ")
    }

    /// Normalised key for duplicate detection; filter order does not matter here.
    pub fn fingerprint_key(&self) -> String {
        let mut filters: Vec<String> = self
            .filters
            .iter()
            .map(|f| f.to_query_token().to_lowercase())
            .collect();
        filters.sort();
        let sort = self
            .sort
            .as_ref()
            .map(|s| format!("{}:{}", s.field, s.direction.as_str()))
            .unwrap_or_default();
        format!(
            "{}|{}|{}|{}",
            self.kind.as_str(),
            self.term.to_lowercase(),
            filters.join(" "),
            sort
        )
    }
}

/// Per-requester fingerprint of everything a message asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_requests(requests: &[ParsedRequest]) -> Self {
        let keys: Vec<String> = requests.iter().map(ParsedRequest::fingerprint_key).collect();
        Self(keys.join(";"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardFace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub image_uris: HashMap<String, String>,
}

/// A card as returned by the remote service. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub prices: HashMap<String, Option<String>>,
    #[serde(default)]
    pub legalities: HashMap<String, String>,
    #[serde(default)]
    pub image_uris: HashMap<String, String>,
    #[serde(default)]
    pub card_faces: Vec<CardFace>,
    #[serde(default)]
    pub scryfall_uri: String,
    #[serde(default)]
    pub set_name: String,
    #[serde(default, rename = "set")]
    pub set_code: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub artist: String,
}

const IMAGE_PREFERENCE: [&str; 4] = ["png", "large", "normal", "small"];

const MAJOR_FORMATS: [(&str, &str); 12] = [
    ("standard", "Standard"),
    ("pioneer", "Pioneer"),
    ("modern", "Modern"),
    ("legacy", "Legacy"),
    ("vintage", "Vintage"),
    ("commander", "Commander"),
    ("oathbreaker", "Oathbreaker"),
    ("brawl", "Brawl"),
    ("historic", "Historic"),
    ("pauper", "Pauper"),
    ("penny", "Penny"),
    ("duel", "Duel"),
];

impl Card {
    pub fn is_valid(&self) -> bool {
        self.object == "card" && (!self.name.is_empty() || !self.card_faces.is_empty())
    }

    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        if !self.card_faces.is_empty() {
            return self
                .card_faces
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(" // ");
        }
        "Unknown Card".to_string()
    }

    /// True when `term` equals the full name or one face name, ignoring case.
    pub fn matches_name(&self, term: &str) -> bool {
        let term = term.trim();
        self.name.eq_ignore_ascii_case(term)
            || self
                .card_faces
                .iter()
                .any(|f| f.name.eq_ignore_ascii_case(term))
    }

    pub fn best_image_url(&self) -> Option<&str> {
        // 雙面卡優先使用正面圖片
        let uris = match self.card_faces.first() {
            Some(face) if !face.image_uris.is_empty() => &face.image_uris,
            _ => &self.image_uris,
        };
        IMAGE_PREFERENCE
            .iter()
            .find_map(|format| uris.get(*format))
            .or_else(|| uris.values().next())
            .map(String::as_str)
    }

    fn price(&self, currency: &str) -> Option<f64> {
        self.prices
            .get(currency)
            .and_then(|p| p.as_deref())
            .and_then(|p| p.parse::<f64>().ok())
    }

    pub fn price_display(&self) -> Option<String> {
        if let Some(usd) = self.price("usd") {
            return Some(format!("${:.2}", usd));
        }
        if let Some(foil) = self.price("usd_foil") {
            return Some(format!("${:.2} (foil)", foil));
        }
        if let Some(eur) = self.price("eur") {
            return Some(format!("€{:.2}", eur));
        }
        self.price("tix").map(|tix| format!("{:.2} tix", tix))
    }

    pub fn format_legalities(&self) -> Option<String> {
        if self.legalities.is_empty() {
            return None;
        }
        let legal: Vec<&str> = MAJOR_FORMATS
            .iter()
            .filter(|(key, _)| self.legalities.get(*key).map(String::as_str) == Some("legal"))
            .map(|(_, name)| *name)
            .collect();
        if legal.is_empty() {
            Some("Not legal in any major formats".to_string())
        } else {
            Some(legal.join(", "))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardList {
    #[serde(default)]
    pub total_cards: usize,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub data: Vec<Card>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruling {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulingList {
    #[serde(default)]
    pub data: Vec<Ruling>,
}

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum TransportErrorKind {
    #[error("request timed out")]
    Timeout,
    #[error("remote service rate limited the request")]
    RateLimited,
    #[error("remote service has no matching resource")]
    NotFound,
    #[error("remote service rejected the query")]
    BadRequest,
    #[error("remote service error")]
    ServerError,
    #[error("network error")]
    NetworkError,
    #[error("response body could not be decoded")]
    InvalidResponse,
}

impl TransportErrorKind {
    /// Text safe to show on the chat surface.
    pub fn user_message(&self) -> &'static str {
        match self {
            TransportErrorKind::RateLimited => {
                "The card service is busy right now. Please try again in a moment."
            }
            _ => "Lookup failed, please try again.",
        }
    }
}

/// Terminal result of resolving one [`ParsedRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Found { card: Box<Card>, closest_match: bool },
    Ambiguous { candidates: Vec<String> },
    NotFound,
    RulingsFound {
        card: Box<Card>,
        rulings: Vec<Ruling>,
        closest_match: bool,
    },
    TransportError(TransportErrorKind),
}

impl ResolutionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionOutcome::Found { .. } => "found",
            ResolutionOutcome::Ambiguous { .. } => "ambiguous",
            ResolutionOutcome::NotFound => "not_found",
            ResolutionOutcome::RulingsFound { .. } => "rulings_found",
            ResolutionOutcome::TransportError(_) => "transport_error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Cooldown,
    Duplicate,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Cooldown => write!(f, "Slow down a little, you're on cooldown."),
            RejectReason::Duplicate => write!(f, "Already working on that request."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Accept,
    Reject(RejectReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub request: ParsedRequest,
    pub outcome: ResolutionOutcome,
}

/// What the engine hands back to the chat adapter for one message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageResolution {
    /// Nothing in the message could be parsed into a request.
    Ignored,
    Rejected(RejectReason),
    Resolved(Vec<ResolvedRequest>),
}
