use crate::core::batch::BatchCoordinator;
use crate::core::guard::CooldownGuard;
use crate::core::parser::QueryParser;
use crate::core::resolver::Resolver;
use crate::domain::model::{Fingerprint, GuardDecision, MessageResolution, RawMessage};
use crate::domain::ports::{CardTransport, ConfigProvider};
use std::sync::Arc;

/// Inbound entry point: message text in, ordered outcomes out.
pub struct LookupEngine<T: CardTransport> {
    parser: QueryParser,
    guard: CooldownGuard,
    coordinator: BatchCoordinator<T>,
}

impl<T: CardTransport> LookupEngine<T> {
    pub fn new(parser: QueryParser, guard: CooldownGuard, coordinator: BatchCoordinator<T>) -> Self {
        Self {
            parser,
            guard,
            coordinator,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(transport: Arc<T>, config: &C) -> Self {
        Self::new(
            QueryParser::new(config.command_prefix()),
            CooldownGuard::from_secs_f64(config.cooldown_secs(), config.dedup_window_secs()),
            BatchCoordinator::new(
                Resolver::new(transport),
                config.max_batch_requests(),
                config.max_concurrent_resolvers(),
            ),
        )
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub async fn resolve_message(&self, message: &RawMessage) -> MessageResolution {
        // 解析沒有副作用，先做才能算 fingerprint
        let mut requests = self.parser.parse(&message.text);
        if requests.is_empty() {
            tracing::debug!(requester = %message.requester, "Nothing to resolve in message");
            return MessageResolution::Ignored;
        }

        // 超出上限的部分不會被查詢，也不算進 fingerprint
        let cap = self.coordinator.max_requests();
        if requests.len() > cap {
            tracing::warn!(
                requester = %message.requester,
                "Batch of {} requests exceeds cap of {}, dropping the rest",
                requests.len(),
                cap
            );
            requests.truncate(cap);
        }

        let fingerprint = Fingerprint::from_requests(&requests);
        if let GuardDecision::Reject(reason) =
            self.guard
                .check(&message.requester, &fingerprint, message.received_at)
        {
            return MessageResolution::Rejected(reason);
        }

        tracing::info!(
            requester = %message.requester,
            request_count = requests.len(),
            "Looking up cards"
        );
        MessageResolution::Resolved(self.coordinator.run(requests).await)
    }
}
