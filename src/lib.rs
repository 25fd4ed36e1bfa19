//! Backend for a language-learning app: an embedded content catalog,
//! exercise checking, flashcard rounds, progress summaries, and thin proxies
//! to a chat model and translation services.

pub mod config;
pub mod content;
pub mod evaluator;
pub mod fallback;
pub mod flashcards;
pub mod i18n;
pub mod metrics;
pub mod openai;
pub mod progress;
pub mod routes;
pub mod security;
pub mod session;
pub mod state;
pub mod translation;
