// Job matching and career-path listings over the relational store.

pub mod handlers;
pub mod matching;
pub mod queries;
