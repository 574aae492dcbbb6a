pub mod rules;

pub use rules::{RuleEntry, RuleStore, RULES_SECTION_HEADER};
