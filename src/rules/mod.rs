//! Module rule sets.
//!
//! A module reacts to protocol commands through per-command rule lists:
//!
//! ```ignore
//! let module = ModuleBuilder::new("greeter", &validators)
//!     .handle("PRIVMSG", |rules| {
//!         rules.literal("!ping", pong)?;
//!         rules.pattern("!greet :nick", greet)?;
//!         rules.validate("channel_message", |scoped| {
//!             scoped.always(log_line);
//!             Ok(())
//!         })?;
//!         Ok(())
//!     })?
//!     .build();
//! ```
//!
//! Every rule in a list is evaluated against each message and every match
//! fires; there is no first-match-wins. Templates and validator references
//! are resolved here, at build time, so configuration mistakes never reach
//! dispatch.

pub mod pattern;
pub mod validator;

use crate::error::{ActionResult, RuleError};
use crate::message::Message;
use crate::state::Matrix;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub use pattern::{CaptureKind, Captures, MatchSpec, Pattern};
pub use validator::{BUILTIN_PREDICATES, Predicate, ValidatorChain, ValidatorSet};

/// Everything an action gets to work with.
#[derive(Clone)]
pub struct ActionContext {
    pub message: Arc<Message>,
    /// Placeholder captures; empty unless the rule was a pattern match.
    pub captures: Captures,
    pub matrix: Arc<Matrix>,
    /// Name of the module the rule belongs to.
    pub module: Arc<str>,
}

/// The effect of a rule.
///
/// Any `Fn(ActionContext) -> impl Future<Output = ActionResult>` closure is
/// an action.
#[async_trait]
pub trait Action: Send + Sync {
    async fn call(&self, ctx: ActionContext) -> ActionResult;
}

#[async_trait]
impl<F, Fut> Action for F
where
    F: Fn(ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = ActionResult> + Send + 'static,
{
    async fn call(&self, ctx: ActionContext) -> ActionResult {
        (self)(ctx).await
    }
}

/// One entry in a command's rule list.
#[derive(Clone)]
pub enum Rule {
    /// Fires for every message of the command.
    Always(Arc<dyn Action>),
    /// Fires when the trailing text matches.
    Match {
        spec: MatchSpec,
        action: Arc<dyn Action>,
    },
    /// Nested rules, evaluated only when the chain passes.
    Validated {
        chain: Arc<ValidatorChain>,
        rules: Vec<Rule>,
    },
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always(_) => f.write_str("Always"),
            Self::Match { spec, .. } => f.debug_tuple("Match").field(spec).finish(),
            Self::Validated { chain, rules } => f
                .debug_struct("Validated")
                .field("chain", &chain.name())
                .field("rules", rules)
                .finish(),
        }
    }
}

/// Builds one ordered rule list.
pub struct RuleListBuilder<'v> {
    validators: &'v ValidatorSet,
    rules: Vec<Rule>,
}

impl<'v> RuleListBuilder<'v> {
    fn new(validators: &'v ValidatorSet) -> Self {
        Self {
            validators,
            rules: Vec::new(),
        }
    }

    /// Unconditional action.
    pub fn always(&mut self, action: impl Action + 'static) -> &mut Self {
        self.rules.push(Rule::Always(Arc::new(action)));
        self
    }

    /// Fires when the trailing text equals `text` exactly.
    pub fn literal(&mut self, text: &str, action: impl Action + 'static) -> &mut Self {
        self.rules.push(Rule::Match {
            spec: MatchSpec::Literal(text.to_string()),
            action: Arc::new(action),
        });
        self
    }

    /// Fires when the trailing text matches `template`; see [`Pattern`].
    pub fn pattern(
        &mut self,
        template: &str,
        action: impl Action + 'static,
    ) -> Result<&mut Self, RuleError> {
        let pattern = Pattern::compile(template)?;
        self.rules.push(Rule::Match {
            spec: MatchSpec::Pattern(pattern),
            action: Arc::new(action),
        });
        Ok(self)
    }

    /// Rules built by `scope` run only when validator `chain` passes.
    pub fn validate<F>(&mut self, chain: &str, scope: F) -> Result<&mut Self, RuleError>
    where
        F: FnOnce(&mut RuleListBuilder<'v>) -> Result<(), RuleError>,
    {
        let chain = self.validators.get(chain)?;
        let mut nested = RuleListBuilder::new(self.validators);
        scope(&mut nested)?;
        self.rules.push(Rule::Validated {
            chain,
            rules: nested.rules,
        });
        Ok(self)
    }
}

/// A module's compiled rule table. Immutable once built.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    name: Arc<str>,
    commands: HashMap<String, Vec<Rule>>,
}

impl ModuleSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Rule list for `command` (case-insensitive), if the module cares.
    pub fn rules_for(&self, command: &str) -> Option<&[Rule]> {
        self.commands
            .get(command)
            .or_else(|| self.commands.get(&command.to_ascii_uppercase()))
            .map(Vec::as_slice)
    }

    /// Commands this module reacts to.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

/// Builds a [`ModuleSpec`].
pub struct ModuleBuilder<'v> {
    name: String,
    validators: &'v ValidatorSet,
    commands: HashMap<String, Vec<Rule>>,
}

impl<'v> ModuleBuilder<'v> {
    pub fn new(name: &str, validators: &'v ValidatorSet) -> Self {
        Self {
            name: name.to_string(),
            validators,
            commands: HashMap::new(),
        }
    }

    /// Add rules for `command`. Calling again for the same command appends.
    pub fn handle<F>(mut self, command: &str, build: F) -> Result<Self, RuleError>
    where
        F: FnOnce(&mut RuleListBuilder<'v>) -> Result<(), RuleError>,
    {
        let mut rules = RuleListBuilder::new(self.validators);
        build(&mut rules)?;
        if rules.rules.is_empty() {
            return Err(RuleError::EmptyCommand {
                module: self.name.clone(),
                command: command.to_string(),
            });
        }

        self.commands
            .entry(command.to_ascii_uppercase())
            .or_default()
            .extend(rules.rules);
        Ok(self)
    }

    pub fn build(self) -> ModuleSpec {
        ModuleSpec {
            name: Arc::from(self.name),
            commands: self.commands,
        }
    }
}
