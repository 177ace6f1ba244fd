//! Capability rules and matching.
//!
//! A capability rule names a supertype and the capability a class gains by
//! reaching it through `extends`/`implements` edges:
//!
//! - **Models**: rule and member-predicate structures (YAML layout)
//! - **Rules**: loading and validation of rule tables, embedded Paper table
//! - **Matcher**: ancestor-closure traversal producing [`CapabilityMatch`]es
//!
//! Rules are independent of each other; adding a capability kind means adding
//! rules, not touching the traversal.

mod matcher;
mod models;
mod rules;

pub use matcher::{CapabilityMatch, CapabilityMatcher, MemberShape};
pub use models::{CapabilityRule, MemberPredicate};
pub use rules::CapabilityRules;
