// Provider adapters. Each one owns a `Gateway` and turns raw payloads into
// domain types.

pub mod chat;
pub mod market;
pub mod news;
