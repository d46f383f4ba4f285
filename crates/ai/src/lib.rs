//! Variation generation: the contract between the campaign system and a
//! completion-model provider. The core only persists the drafts this
//! layer produces; it never judges copywriting quality.

pub mod generator;
pub mod parse;
pub mod prompt;

pub use generator::{ClaudeConfig, ClaudeGenerator, VariationGenerator, VariationRequest};
pub use parse::{parse_variations, VariationDraft};
