// App layer: chat-surface adapters and presentation built on top of the core.

pub mod console;
pub mod render;
