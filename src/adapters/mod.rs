// Adapters layer: concrete implementations of the domain ports (remote card service).

pub mod scryfall;
