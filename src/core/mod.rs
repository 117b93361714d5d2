pub mod batch;
pub mod engine;
pub mod guard;
pub mod parser;
pub mod rate_gate;
pub mod resolver;

pub use crate::domain::model::{MessageResolution, ParsedRequest, ResolutionOutcome};
pub use crate::domain::ports::{CardTransport, ConfigProvider};
pub use crate::utils::error::Result;
