// Domain layer: chat-independent models and ports. No HTTP or config code here.

pub mod model;
pub mod ports;
