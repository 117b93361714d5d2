use crate::core::resolver::Resolver;
use crate::domain::model::{ParsedRequest, ResolvedRequest};
use crate::domain::ports::CardTransport;
use futures::stream::{self, StreamExt};

/// Fans a message's requests out to resolvers and gathers them back in input order.
pub struct BatchCoordinator<T: CardTransport> {
    resolver: Resolver<T>,
    max_requests: usize,
    max_concurrency: usize,
}

impl<T: CardTransport> BatchCoordinator<T> {
    pub fn new(resolver: Resolver<T>, max_requests: usize, max_concurrency: usize) -> Self {
        Self {
            resolver,
            max_requests: max_requests.max(1),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub async fn run(&self, mut requests: Vec<ParsedRequest>) -> Vec<ResolvedRequest> {
        if requests.len() > self.max_requests {
            tracing::warn!(
                "Batch of {} requests exceeds cap of {}, dropping the rest",
                requests.len(),
                self.max_requests
            );
            requests.truncate(self.max_requests);
        }

        let resolver = &self.resolver;
        let mut indexed: Vec<(usize, ResolvedRequest)> = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| async move {
                let outcome = resolver.resolve(&request).await;
                (index, ResolvedRequest { request, outcome })
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        // 完成順序不固定，依原始位置排回
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, resolved)| resolved).collect()
    }
}
