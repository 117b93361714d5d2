use crate::domain::model::{
    Card, CardList, ParsedRequest, RequestKind, ResolutionOutcome, RulingList, TransportErrorKind,
};
use crate::domain::ports::{CardTransport, RemoteCall};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Upper bound on candidate names reported for an ambiguous lookup.
pub const MAX_CANDIDATES: usize = 10;

type CallResult<T> = std::result::Result<T, TransportErrorKind>;

/// Intermediate result of the name-resolution path shared by named and rules lookups.
enum NameMatch {
    Card { card: Card, closest_match: bool },
    Candidates(Vec<String>),
    Missing,
}

/// Maps one [`ParsedRequest`] to exactly one [`ResolutionOutcome`].
///
/// At most two transport calls are spent on a name (search, then one fuzzy
/// fallback); rules lookups add one rulings call after a successful match.
pub struct Resolver<T: CardTransport> {
    transport: Arc<T>,
}

impl<T: CardTransport> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: CardTransport> Resolver<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn resolve(&self, request: &ParsedRequest) -> ResolutionOutcome {
        let result = match request.kind() {
            RequestKind::NamedLookup => self.resolve_named(request).await,
            RequestKind::RulesLookup => self.resolve_rules(request).await,
            RequestKind::RandomPick => self.resolve_random(request).await,
        };

        let outcome = result.unwrap_or_else(ResolutionOutcome::TransportError);
        tracing::debug!(
            kind = request.kind().as_str(),
            term = request.term(),
            outcome = outcome.label(),
            "Resolved request"
        );
        outcome
    }

    async fn resolve_named(&self, request: &ParsedRequest) -> CallResult<ResolutionOutcome> {
        Ok(match self.match_name(request).await? {
            NameMatch::Card {
                card,
                closest_match,
            } => ResolutionOutcome::Found {
                card: Box::new(card),
                closest_match,
            },
            NameMatch::Candidates(candidates) => ResolutionOutcome::Ambiguous { candidates },
            NameMatch::Missing => ResolutionOutcome::NotFound,
        })
    }

    async fn resolve_rules(&self, request: &ParsedRequest) -> CallResult<ResolutionOutcome> {
        let (card, closest_match) = match self.match_name(request).await? {
            NameMatch::Card {
                card,
                closest_match,
            } => (card, closest_match),
            NameMatch::Candidates(candidates) => {
                return Ok(ResolutionOutcome::Ambiguous { candidates })
            }
            NameMatch::Missing => return Ok(ResolutionOutcome::NotFound),
        };
        if card.id.is_empty() {
            return Ok(ResolutionOutcome::NotFound);
        }

        let rulings: RulingList = decode(self.call(&RemoteCall::rulings(&card.id)).await?)?;
        Ok(ResolutionOutcome::RulingsFound {
            card: Box::new(card),
            rulings: rulings.data,
            closest_match,
        })
    }

    async fn resolve_random(&self, request: &ParsedRequest) -> CallResult<ResolutionOutcome> {
        let call = RemoteCall::random(&request.search_query());
        match self.optional_call(&call).await? {
            Some(value) => {
                let card: Card = decode(value)?;
                Ok(found_or_missing(card, false))
            }
            None => Ok(ResolutionOutcome::NotFound),
        }
    }

    /// Search first; on zero matches (or a rejected query) try one fuzzy lookup.
    async fn match_name(&self, request: &ParsedRequest) -> CallResult<NameMatch> {
        let search = RemoteCall::named_search(&request.search_query(), request.sort());
        let first = match self.call(&search).await {
            Ok(value) => Some(decode::<CardList>(value)?),
            Err(TransportErrorKind::NotFound) | Err(TransportErrorKind::BadRequest) => None,
            Err(other) => return Err(other),
        };

        if let Some(list) = first {
            let cards: Vec<Card> = list.data.into_iter().filter(Card::is_valid).collect();
            if let Some(found) = classify_candidates(cards, request.term()) {
                return Ok(found);
            }
        }

        tracing::debug!(term = request.term(), "No search match, trying fuzzy fallback");
        match self
            .optional_call(&RemoteCall::fuzzy_search(request.term()))
            .await?
        {
            Some(value) => {
                let card: Card = decode(value)?;
                if !card.is_valid() {
                    return Ok(NameMatch::Missing);
                }
                let closest_match = !card.matches_name(request.term());
                Ok(NameMatch::Card {
                    card,
                    closest_match,
                })
            }
            None => Ok(NameMatch::Missing),
        }
    }

    async fn call(&self, call: &RemoteCall) -> CallResult<serde_json::Value> {
        self.transport.perform(call).await
    }

    /// Treats a remote "not found" as an empty answer rather than an error.
    async fn optional_call(&self, call: &RemoteCall) -> CallResult<Option<serde_json::Value>> {
        match self.call(call).await {
            Ok(value) => Ok(Some(value)),
            Err(TransportErrorKind::NotFound) => Ok(None),
            Err(other) => Err(other),
        }
    }
}

/// `None` means the search produced nothing usable and the fallback should run.
fn classify_candidates(cards: Vec<Card>, term: &str) -> Option<NameMatch> {
    match cards.len() {
        0 => None,
        1 => cards.into_iter().next().map(|card| NameMatch::Card {
            card,
            closest_match: false,
        }),
        _ => {
            if let Some(card) = cards.iter().find(|c| c.matches_name(term)) {
                return Some(NameMatch::Card {
                    card: card.clone(),
                    closest_match: false,
                });
            }
            let mut names: Vec<String> = Vec::new();
            for card in &cards {
                let name = card.display_name();
                if !names.contains(&name) {
                    names.push(name);
                }
                if names.len() == MAX_CANDIDATES {
                    break;
                }
            }
            Some(NameMatch::Candidates(names))
        }
    }
}

fn found_or_missing(card: Card, closest_match: bool) -> ResolutionOutcome {
    if card.is_valid() {
        ResolutionOutcome::Found {
            card: Box::new(card),
            closest_match,
        }
    } else {
        ResolutionOutcome::NotFound
    }
}

fn decode<D: DeserializeOwned>(value: serde_json::Value) -> CallResult<D> {
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!("Unexpected response shape: {}", e);
        TransportErrorKind::InvalidResponse
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::model::FilterClause;
    use crate::domain::ports::CallKind;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses in order and records every call.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<CallResult<Value>>>,
        pub calls: Mutex<Vec<RemoteCall>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<CallResult<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<RemoteCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CardTransport for ScriptedTransport {
        async fn perform(&self, call: &RemoteCall) -> CallResult<Value> {
            self.calls.lock().unwrap().push(call.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportErrorKind::NotFound))
        }
    }

    pub(crate) fn card_json(id: &str, name: &str) -> Value {
        json!({"object": "card", "id": id, "name": name})
    }

    pub(crate) fn list_json(cards: &[Value]) -> Value {
        json!({"object": "list", "total_cards": cards.len(), "has_more": false, "data": cards})
    }

    fn named(term: &str) -> ParsedRequest {
        ParsedRequest::new(RequestKind::NamedLookup, term, vec![], None).unwrap()
    }

    fn resolver(responses: Vec<CallResult<Value>>) -> (Resolver<ScriptedTransport>, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        (Resolver::new(Arc::clone(&transport)), transport)
    }

    #[tokio::test]
    async fn test_single_search_hit_is_found() {
        let (resolver, transport) =
            resolver(vec![Ok(list_json(&[card_json("1", "Lightning Bolt")]))]);

        let outcome = resolver.resolve(&named("lightning bolt")).await;

        match outcome {
            ResolutionOutcome::Found { card, closest_match } => {
                assert_eq!(card.name, "Lightning Bolt");
                assert!(!closest_match);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::NamedSearch);
        assert_eq!(calls[0].param("q"), Some("lightning bolt"));
    }

    #[tokio::test]
    async fn test_exact_name_wins_among_many() {
        let (resolver, _) = resolver(vec![Ok(list_json(&[
            card_json("1", "Counterspell"),
            card_json("2", "Counterspell Abyss"),
        ]))]);

        let outcome = resolver.resolve(&named("counterspell")).await;
        assert!(matches!(outcome, ResolutionOutcome::Found { ref card, .. } if card.id == "1"));
    }

    #[tokio::test]
    async fn test_many_matches_are_ambiguous() {
        let (resolver, transport) = resolver(vec![Ok(list_json(&[
            card_json("1", "Goblin Guide"),
            card_json("2", "Goblin Bombardment"),
            card_json("3", "Goblin Guide"),
        ]))]);

        let outcome = resolver.resolve(&named("goblin")).await;

        assert_eq!(
            outcome,
            ResolutionOutcome::Ambiguous {
                candidates: vec!["Goblin Guide".to_string(), "Goblin Bombardment".to_string()]
            }
        );
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_candidates_are_capped() {
        let cards: Vec<Value> = (0..25)
            .map(|i| card_json(&i.to_string(), &format!("Elf {}", i)))
            .collect();
        let (resolver, _) = resolver(vec![Ok(list_json(&cards))]);

        match resolver.resolve(&named("elf")).await {
            ResolutionOutcome::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), MAX_CANDIDATES);
                assert_eq!(candidates[0], "Elf 0");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_matches_twice_is_not_found_after_two_calls() {
        let (resolver, transport) = resolver(vec![
            Err(TransportErrorKind::NotFound),
            Err(TransportErrorKind::NotFound),
        ]);

        let outcome = resolver.resolve(&named("xyzzy")).await;

        assert_eq!(outcome, ResolutionOutcome::NotFound);
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, CallKind::NamedSearch);
        assert_eq!(calls[1].kind, CallKind::FuzzySearch);
        assert_eq!(calls[1].param("fuzzy"), Some("xyzzy"));
    }

    #[tokio::test]
    async fn test_fuzzy_fallback_marks_closest_match() {
        let (resolver, transport) = resolver(vec![
            Ok(list_json(&[])),
            Ok(card_json("9", "Ragavan, Nimble Pilferer")),
        ]);

        let outcome = resolver.resolve(&named("ragav")).await;

        assert!(matches!(
            outcome,
            ResolutionOutcome::Found { closest_match: true, .. }
        ));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_filtered_search_falls_back_to_term() {
        let request = ParsedRequest::new(
            RequestKind::NamedLookup,
            "sol ring",
            vec![FilterClause::new("e", "nosuchset")],
            None,
        )
        .unwrap();
        let (resolver, transport) = resolver(vec![
            Err(TransportErrorKind::BadRequest),
            Ok(card_json("5", "Sol Ring")),
        ]);

        let outcome = resolver.resolve(&request).await;

        assert!(matches!(
            outcome,
            ResolutionOutcome::Found { closest_match: false, .. }
        ));
        let calls = transport.calls();
        assert_eq!(calls[0].param("q"), Some("sol ring e:nosuchset"));
        assert_eq!(calls[1].param("fuzzy"), Some("sol ring"));
    }

    #[tokio::test]
    async fn test_transport_error_short_circuits() {
        let (resolver, transport) = resolver(vec![Err(TransportErrorKind::Timeout)]);

        let outcome = resolver.resolve(&named("bolt")).await;

        assert_eq!(
            outcome,
            ResolutionOutcome::TransportError(TransportErrorKind::Timeout)
        );
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_error_on_fallback_is_transport_error() {
        let (resolver, _) = resolver(vec![
            Err(TransportErrorKind::NotFound),
            Err(TransportErrorKind::RateLimited),
        ]);

        let outcome = resolver.resolve(&named("bolt")).await;
        assert_eq!(
            outcome,
            ResolutionOutcome::TransportError(TransportErrorKind::RateLimited)
        );
    }

    #[tokio::test]
    async fn test_malformed_search_body_is_invalid_response() {
        let (resolver, _) = resolver(vec![Ok(json!({"data": "not a list"}))]);

        let outcome = resolver.resolve(&named("bolt")).await;
        assert_eq!(
            outcome,
            ResolutionOutcome::TransportError(TransportErrorKind::InvalidResponse)
        );
    }

    #[tokio::test]
    async fn test_rules_lookup_fetches_rulings_by_id() {
        let request = ParsedRequest::new(RequestKind::RulesLookup, "counterspell", vec![], None).unwrap();
        let (resolver, transport) = resolver(vec![
            Ok(list_json(&[card_json("cs-1", "Counterspell")])),
            Ok(json!({"object": "list", "data": [
                {"source": "wotc", "published_at": "2004-10-04", "comment": "Counters a spell."}
            ]})),
        ]);

        let outcome = resolver.resolve(&request).await;

        match outcome {
            ResolutionOutcome::RulingsFound {
                card,
                rulings,
                closest_match,
            } => {
                assert_eq!(card.name, "Counterspell");
                assert_eq!(rulings.len(), 1);
                assert_eq!(rulings[0].source, "wotc");
                assert!(!closest_match);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].kind, CallKind::Rulings);
        assert_eq!(calls[1].param("id"), Some("cs-1"));
    }

    #[tokio::test]
    async fn test_rules_after_fuzzy_fallback_keep_closest_match() {
        let request = ParsedRequest::new(RequestKind::RulesLookup, "counterspel", vec![], None).unwrap();
        let (resolver, transport) = resolver(vec![
            Err(TransportErrorKind::NotFound),
            Ok(card_json("cs-1", "Counterspell")),
            Ok(json!({"object": "list", "data": []})),
        ]);

        match resolver.resolve(&request).await {
            ResolutionOutcome::RulingsFound {
                card,
                rulings,
                closest_match,
            } => {
                assert_eq!(card.name, "Counterspell");
                assert!(rulings.is_empty());
                assert!(closest_match);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let calls = transport.calls();
        assert_eq!(calls[1].kind, CallKind::FuzzySearch);
        assert_eq!(calls[2].param("id"), Some("cs-1"));
    }

    #[tokio::test]
    async fn test_rules_for_unknown_card_skips_rulings_call() {
        let request = ParsedRequest::new(RequestKind::RulesLookup, "nothing", vec![], None).unwrap();
        let (resolver, transport) = resolver(vec![
            Err(TransportErrorKind::NotFound),
            Err(TransportErrorKind::NotFound),
        ]);

        assert_eq!(resolver.resolve(&request).await, ResolutionOutcome::NotFound);
        assert!(transport
            .calls()
            .iter()
            .all(|c| c.kind != CallKind::Rulings));
    }

    #[tokio::test]
    async fn test_random_pick_with_filters() {
        let request = ParsedRequest::new(
            RequestKind::RandomPick,
            "",
            vec![FilterClause::new("rarity", "mythic"), FilterClause::new("e", "mh3")],
            None,
        )
        .unwrap();
        let (resolver, transport) = resolver(vec![Ok(card_json("r1", "Emrakul, the World Anew"))]);

        let outcome = resolver.resolve(&request).await;

        assert!(matches!(outcome, ResolutionOutcome::Found { .. }));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Random);
        assert_eq!(calls[0].param("q"), Some("rarity:mythic e:mh3"));
    }

    #[tokio::test]
    async fn test_random_pick_filtered_out_is_not_found() {
        let request = ParsedRequest::new(RequestKind::RandomPick, "", vec![], None).unwrap();
        let (resolver, transport) = resolver(vec![Err(TransportErrorKind::NotFound)]);

        assert_eq!(resolver.resolve(&request).await, ResolutionOutcome::NotFound);
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls()[0].param("q"), None);
    }

    #[tokio::test]
    async fn test_same_request_twice_gives_same_variant() {
        let script = || Ok(list_json(&[card_json("1", "Lightning Bolt")]));
        let (resolver, _) = resolver(vec![script(), script()]);

        let first = resolver.resolve(&named("lightning bolt")).await;
        let second = resolver.resolve(&named("lightning bolt")).await;
        assert_eq!(first.label(), second.label());
    }
}
