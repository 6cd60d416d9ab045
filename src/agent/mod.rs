//! LLM-powered question answering

pub mod engine;
pub mod synthesizer;

pub use engine::AnswerEngine;
pub use synthesizer::{AnswerSynthesizer, OpenAiSynthesizer};
