//! Unified error handling for slircbot.
//!
//! Errors are split by where they surface:
//! - [`RuleError`]: malformed module/validator configuration, fatal at startup.
//! - [`ActionError`]: a rule action failed while running; contained by the dispatcher.
//! - [`ChannelError`]: a channel actor operation could not be completed.

use thiserror::Error;

// ============================================================================
// Rule Errors (module definition time)
// ============================================================================

/// Errors raised while building rule sets and validator chains.
///
/// None of these are ever produced at dispatch time.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("empty match template")]
    EmptyTemplate,

    #[error("placeholder without a name in template {template:?}")]
    EmptyPlaceholder { template: String },

    #[error("invalid placeholder name {name:?} in template {template:?}")]
    InvalidPlaceholder { template: String, name: String },

    #[error("duplicate capture name {name:?} in template {template:?}")]
    DuplicateCapture { template: String, name: String },

    #[error("failed to compile template {template:?}: {source}")]
    Compile {
        template: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown predicate {predicate:?} in validator {validator:?}")]
    UnknownPredicate { validator: String, predicate: String },

    #[error("validator {0:?} has no predicates")]
    EmptyValidator(String),

    #[error("validator {0:?} is already defined")]
    DuplicateValidator(String),

    #[error("predicate {0:?} is already registered")]
    DuplicatePredicate(String),

    #[error("unknown validator {0:?}")]
    UnknownValidator(String),

    #[error("module {0:?} is already registered")]
    DuplicateModule(String),

    #[error("module {module:?} has no rules for {command:?}")]
    EmptyCommand { module: String, command: String },
}

// ============================================================================
// Action Errors (dispatch time)
// ============================================================================

/// Failure of a single rule action.
///
/// The dispatcher logs these and treats the rule as not having fired.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("message has no prefix")]
    MissingPrefix,

    #[error("message is missing argument {0}")]
    MissingArg(usize),

    #[error("missing capture {0:?}")]
    MissingCapture(String),

    #[error("not on channel {0}")]
    NotJoined(String),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingPrefix => "missing_prefix",
            Self::MissingArg(_) => "missing_arg",
            Self::MissingCapture(_) => "missing_capture",
            Self::NotJoined(_) => "not_joined",
            Self::Channel(e) => e.error_code(),
            Self::Failed(_) => "failed",
        }
    }
}

/// Result type for rule actions.
pub type ActionResult = Result<(), ActionError>;

// ============================================================================
// Channel Errors (actor operations)
// ============================================================================

/// Channel actor operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The actor is gone; a fresh join is required.
    #[error("channel {0} is no longer joined")]
    Terminated(String),

    /// The actor accepted the request but did not answer in time.
    #[error("channel {0} did not reply in time")]
    Timeout(String),
}

impl ChannelError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Terminated(_) => "channel_terminated",
            Self::Timeout(_) => "channel_timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_error_codes_flow_through_action_error() {
        let err: ActionError = ChannelError::Timeout("#rust".into()).into();
        assert_eq!(err.error_code(), "channel_timeout");
        assert_eq!(ActionError::MissingPrefix.error_code(), "missing_prefix");
    }

    #[test]
    fn rule_error_messages_name_the_template() {
        let err = RuleError::DuplicateCapture {
            template: ":a :a".into(),
            name: "a".into(),
        };
        assert!(err.to_string().contains(":a :a"));
    }
}
