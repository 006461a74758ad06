//! NLQ Intent - deterministic question matcher for demo mode
//!
//! Questions are normalized (lowercase, punctuation stripped, code-mixed
//! words mapped through a synonym table) and then run against an ordered
//! rule table. The first rule whose phrase groups and required slots are all
//! satisfied decides the intent; slot values come from a fixed set of
//! extractors and the intent's slot schema supplies defaults.

mod examples;
mod matcher;
mod normalize;
mod rules;
mod slots;

pub use examples::{example_questions, ExampleQuestion, EXAMPLES};
pub use matcher::{IntentMatch, IntentMatcher, MatcherError, NoMatch};
pub use normalize::normalize;
pub use rules::{PhraseGroup, Rule, RuleTable};
