//! Validator chains: named conjunctions of message predicates.
//!
//! Predicates are plain functions registered under an identifier. Chains refer
//! to predicates by identifier and are resolved to function pointers when the
//! chain is defined, so a bad reference fails at startup and never during
//! dispatch.

use crate::error::RuleError;
use crate::message::Message;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A pure check over a message.
pub type Predicate = fn(&Message) -> bool;

/// A resolved validator chain.
pub struct ValidatorChain {
    name: String,
    predicates: Vec<(String, Predicate)>,
}

impl ValidatorChain {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run every predicate and AND the results.
    ///
    /// All predicates run even after one fails; only the conjunction is reported.
    pub fn evaluate(&self, message: &Message) -> bool {
        self.predicates
            .iter()
            .fold(true, |passed, (_, predicate)| predicate(message) && passed)
    }
}

impl fmt::Debug for ValidatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorChain")
            .field("name", &self.name)
            .field(
                "predicates",
                &self.predicates.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Predicate table plus the chains defined over it.
#[derive(Debug, Default)]
pub struct ValidatorSet {
    predicates: HashMap<String, Predicate>,
    chains: HashMap<String, Arc<ValidatorChain>>,
}

impl ValidatorSet {
    /// An empty set with no predicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set preloaded with the built-in predicates.
    pub fn with_builtins() -> Self {
        let mut set = Self::new();
        for (id, predicate) in BUILTIN_PREDICATES {
            set.predicates.insert((*id).to_string(), *predicate);
        }
        set
    }

    /// Register a predicate under `id`.
    pub fn register_predicate(
        &mut self,
        id: &str,
        predicate: Predicate,
    ) -> Result<(), RuleError> {
        if self.predicates.contains_key(id) {
            return Err(RuleError::DuplicatePredicate(id.to_string()));
        }
        self.predicates.insert(id.to_string(), predicate);
        Ok(())
    }

    /// Define a named chain over registered predicate ids.
    pub fn define<S: AsRef<str>>(
        &mut self,
        name: &str,
        predicate_ids: &[S],
    ) -> Result<(), RuleError> {
        if self.chains.contains_key(name) {
            return Err(RuleError::DuplicateValidator(name.to_string()));
        }
        if predicate_ids.is_empty() {
            return Err(RuleError::EmptyValidator(name.to_string()));
        }

        let predicates = predicate_ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                self.predicates
                    .get(id)
                    .map(|p| (id.to_string(), *p))
                    .ok_or_else(|| RuleError::UnknownPredicate {
                        validator: name.to_string(),
                        predicate: id.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.chains.insert(
            name.to_string(),
            Arc::new(ValidatorChain {
                name: name.to_string(),
                predicates,
            }),
        );
        Ok(())
    }

    /// Whether chain `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.chains.contains_key(name)
    }

    /// Resolve a chain for use in a rule.
    pub fn get(&self, name: &str) -> Result<Arc<ValidatorChain>, RuleError> {
        self.chains
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownValidator(name.to_string()))
    }

    /// Evaluate chain `name` against `message`.
    pub fn evaluate(&self, name: &str, message: &Message) -> Result<bool, RuleError> {
        Ok(self.get(name)?.evaluate(message))
    }
}

/// Built-in predicate ids.
pub const BUILTIN_PREDICATES: &[(&str, Predicate)] = &[
    ("has_prefix", has_prefix),
    ("has_trailing", has_trailing),
    ("has_args", has_args),
    ("channel_target", channel_target),
    ("private_target", private_target),
];

fn has_prefix(message: &Message) -> bool {
    message.prefix.is_some()
}

fn has_trailing(message: &Message) -> bool {
    !message.trailing.is_empty()
}

fn has_args(message: &Message) -> bool {
    !message.args.is_empty()
}

fn channel_target(message: &Message) -> bool {
    message.channel_target().is_some()
}

fn private_target(message: &Message) -> bool {
    message.arg(0).is_some() && message.channel_target().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chanmsg() -> Message {
        Message::parse(":alice!a@h PRIVMSG #rust :hi").unwrap()
    }

    #[test]
    fn chain_is_conjunction_of_predicates() {
        let mut set = ValidatorSet::with_builtins();
        set.define("channel_message", &["has_prefix", "channel_target"])
            .unwrap();
        set.define("private_message", &["has_prefix", "private_target"])
            .unwrap();

        assert!(set.evaluate("channel_message", &chanmsg()).unwrap());
        assert!(!set.evaluate("private_message", &chanmsg()).unwrap());

        let no_prefix = Message::new("PRIVMSG", vec!["#rust".into()], "hi");
        assert!(!set.evaluate("channel_message", &no_prefix).unwrap());
    }

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn never(_: &Message) -> bool {
        CALLS.fetch_add(1, Ordering::SeqCst);
        false
    }

    fn counted(_: &Message) -> bool {
        CALLS.fetch_add(1, Ordering::SeqCst);
        true
    }

    #[test]
    fn every_predicate_runs_even_after_a_failure() {
        let mut set = ValidatorSet::new();
        set.register_predicate("never", never).unwrap();
        set.register_predicate("counted", counted).unwrap();
        set.define("both", &["never", "counted"]).unwrap();

        let before = CALLS.load(Ordering::SeqCst);
        assert!(!set.evaluate("both", &chanmsg()).unwrap());
        assert_eq!(CALLS.load(Ordering::SeqCst) - before, 2);
    }

    #[test]
    fn unknown_predicate_fails_at_definition() {
        let mut set = ValidatorSet::with_builtins();
        let err = set.define("bad", &["has_prefix", "is_wizard"]).unwrap_err();
        assert!(matches!(
            err,
            RuleError::UnknownPredicate { ref predicate, .. } if predicate == "is_wizard"
        ));
        assert!(matches!(set.get("bad"), Err(RuleError::UnknownValidator(_))));
    }

    #[test]
    fn duplicate_and_empty_chains_are_rejected() {
        let mut set = ValidatorSet::with_builtins();
        set.define("v", &["has_prefix"]).unwrap();
        assert!(matches!(
            set.define("v", &["has_args"]),
            Err(RuleError::DuplicateValidator(_))
        ));
        let none: [&str; 0] = [];
        assert!(matches!(
            set.define("empty", &none),
            Err(RuleError::EmptyValidator(_))
        ));
        assert!(matches!(
            set.register_predicate("has_prefix", counted),
            Err(RuleError::DuplicatePredicate(_))
        ));
    }
}
