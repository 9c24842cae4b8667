//! Per-module dispatch worker.
//!
//! A worker owns nothing but its module's immutable rule table. It reads its
//! mailbox one message at a time, so a module observes messages in broadcast
//! order, and fires every matching rule in declaration order.

use crate::message::Message;
use crate::metrics;
use crate::rules::{Action, ActionContext, Captures, ModuleSpec, Rule};
use crate::state::Matrix;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, error, trace, warn};

/// An action selected for one message, with the captures it gets.
type Selected<'a> = (&'a Arc<dyn Action>, Captures);

/// Runs one module's rules against inbound messages.
#[derive(Clone)]
pub struct ModuleWorker {
    spec: Arc<ModuleSpec>,
    matrix: Arc<Matrix>,
}

impl ModuleWorker {
    pub fn new(spec: Arc<ModuleSpec>, matrix: Arc<Matrix>) -> Self {
        Self { spec, matrix }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Drain `rx` until it closes or `shutdown` fires.
    pub async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<Arc<Message>>,
        shutdown: CancellationToken,
    ) {
        debug!("Module worker started");
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                message = rx.recv() => match message {
                    Some(message) => {
                        self.dispatch(message).await;
                    }
                    None => break,
                },
            }
        }
        debug!("Module worker stopped");
    }

    /// Evaluate one message. Returns how many actions completed successfully.
    ///
    /// Commands the module has no rules for are dropped silently.
    pub async fn dispatch(&self, message: Arc<Message>) -> usize {
        let Some(rules) = self.spec.rules_for(&message.command) else {
            trace!(command = %message.command, "No rules for command");
            return 0;
        };
        metrics::record_dispatch(self.name());

        let span = debug_span!(
            "irc.dispatch",
            command = %message.command,
            source_nick = message.nick(),
            channel = message.channel_target(),
        );

        async {
            let mut selected = Vec::new();
            self.select(rules, &message, &mut selected);

            let mut fired = 0;
            for (action, captures) in selected {
                if self.fire(action, &message, captures).await {
                    fired += 1;
                }
            }
            fired
        }
        .instrument(span)
        .await
    }

    /// Walk `rules` in order and collect every action whose condition holds.
    ///
    /// Matching and validation are pure, so selecting up front gives the same
    /// result as interleaving them with the actions.
    fn select<'a>(&self, rules: &'a [Rule], message: &Message, out: &mut Vec<Selected<'a>>) {
        for rule in rules {
            match rule {
                Rule::Always(action) => out.push((action, Captures::default())),
                Rule::Match { spec, action } => {
                    if let Some(captures) = spec.matches(&message.trailing) {
                        out.push((action, captures));
                    }
                }
                Rule::Validated { chain, rules } => {
                    match catch_unwind(AssertUnwindSafe(|| chain.evaluate(message))) {
                        Ok(true) => self.select(rules, message, out),
                        Ok(false) => trace!(validator = chain.name(), "Validator rejected message"),
                        Err(panic) => {
                            error!(
                                module = self.name(),
                                validator = chain.name(),
                                panic = %panic_message(panic.as_ref()),
                                "Validator panicked"
                            );
                            metrics::record_rule_fault(self.name(), "predicate_panic");
                        }
                    }
                }
            }
        }
    }

    /// Run one action behind the fault boundary. `true` if it completed.
    async fn fire(
        &self,
        action: &Arc<dyn Action>,
        message: &Arc<Message>,
        captures: Captures,
    ) -> bool {
        let ctx = ActionContext {
            message: Arc::clone(message),
            captures,
            matrix: Arc::clone(&self.matrix),
            module: self.spec.shared_name(),
        };

        match AssertUnwindSafe(action.call(ctx)).catch_unwind().await {
            Ok(Ok(())) => {
                metrics::record_rule_fired(self.name(), &message.command);
                true
            }
            Ok(Err(e)) => {
                warn!(
                    module = self.name(),
                    command = %message.command,
                    error = %e,
                    "Rule action failed"
                );
                metrics::record_rule_fault(self.name(), e.error_code());
                false
            }
            Err(panic) => {
                error!(
                    module = self.name(),
                    command = %message.command,
                    panic = %panic_message(panic.as_ref()),
                    "Rule action panicked"
                );
                metrics::record_rule_fault(self.name(), "panic");
                false
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
