//! Value corruption models: keyboard typos and rule-table rewrites.

pub mod character;
pub mod rules;

pub use character::{CharacterErrorModel, error_position};
pub use rules::{Rule, RuleChange, RuleInterpreter, RuleScope};
