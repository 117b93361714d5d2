use crate::domain::model::{SortClause, SortDirection, TransportErrorKind};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    NamedSearch,
    FuzzySearch,
    Rulings,
    Random,
}

/// Endpoint kind plus a flat key/value parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub kind: CallKind,
    pub params: Vec<(String, String)>,
}

impl RemoteCall {
    pub fn named_search(query: &str, sort: Option<&SortClause>) -> Self {
        let mut params = vec![("q".to_string(), query.to_string())];
        if let Some(sort) = sort {
            params.push(("order".to_string(), sort.field.clone()));
            if sort.direction != SortDirection::Auto {
                params.push(("dir".to_string(), sort.direction.as_str().to_string()));
            }
        }
        Self {
            kind: CallKind::NamedSearch,
            params,
        }
    }

    pub fn fuzzy_search(name: &str) -> Self {
        Self {
            kind: CallKind::FuzzySearch,
            params: vec![("fuzzy".to_string(), name.to_string())],
        }
    }

    pub fn rulings(card_id: &str) -> Self {
        Self {
            kind: CallKind::Rulings,
            params: vec![("id".to_string(), card_id.to_string())],
        }
    }

    pub fn random(query: &str) -> Self {
        let params = if query.is_empty() {
            Vec::new()
        } else {
            vec![("q".to_string(), query.to_string())]
        };
        Self {
            kind: CallKind::Random,
            params,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The single network-facing contract of the lookup core.
#[async_trait]
pub trait CardTransport: Send + Sync {
    async fn perform(
        &self,
        call: &RemoteCall,
    ) -> std::result::Result<serde_json::Value, TransportErrorKind>;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn command_prefix(&self) -> &str;
    fn min_request_interval_secs(&self) -> f64;
    fn request_timeout_secs(&self) -> f64;
    fn cooldown_secs(&self) -> f64;
    fn dedup_window_secs(&self) -> f64;
    fn max_batch_requests(&self) -> usize;
    fn max_concurrent_resolvers(&self) -> usize;
    fn log_level(&self) -> &str;
    fn json_logging(&self) -> bool;
}
