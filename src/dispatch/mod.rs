//! Dispatch runtime.
//!
//! Every registered module gets one long-lived worker task with an unbounded
//! mailbox in the shared [`ModuleGroup`]. [`Dispatcher::broadcast`] hands each
//! inbound message to every mailbox; workers evaluate their own rules
//! concurrently with each other, in order within themselves.
//!
//! Workers run under [`supervisor::supervise`]. A worker that panics is
//! restarted with a fresh mailbox, up to `dispatch.max_module_restarts` times.
//!
//! There are two ways to stop: [`Dispatcher::drain`] closes the mailboxes and
//! lets every worker finish what is queued, [`Dispatcher::shutdown`] cancels
//! the workers where they stand.

mod group;
pub mod supervisor;
mod worker;

pub use group::{Mailbox, ModuleGroup};
pub use supervisor::Exit;
pub use worker::ModuleWorker;

use crate::config::DispatchConfig;
use crate::error::RuleError;
use crate::message::Message;
use crate::rules::ModuleSpec;
use crate::state::Matrix;
use crate::telemetry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info};

/// Hosts module workers and fans inbound messages out to them.
pub struct Dispatcher {
    matrix: Arc<Matrix>,
    group: Arc<ModuleGroup>,
    modules: Mutex<HashMap<String, JoinHandle<Exit>>>,
    max_restarts: u32,
}

impl Dispatcher {
    pub fn new(matrix: Arc<Matrix>, config: &DispatchConfig) -> Self {
        Self {
            matrix,
            group: Arc::new(ModuleGroup::new()),
            modules: Mutex::new(HashMap::new()),
            max_restarts: config.max_module_restarts,
        }
    }

    pub fn matrix(&self) -> &Arc<Matrix> {
        &self.matrix
    }

    pub fn group(&self) -> &Arc<ModuleGroup> {
        &self.group
    }

    /// Start a worker for `spec`.
    ///
    /// The mailbox joins the group before this returns, so a message
    /// broadcast right after registration is not missed.
    pub fn register(&self, spec: ModuleSpec) -> Result<(), RuleError> {
        let mut modules = self.modules.lock();
        if modules.contains_key(spec.name()) {
            return Err(RuleError::DuplicateModule(spec.name().to_string()));
        }

        let name = spec.shared_name();
        let key = name.to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.group.join(Arc::clone(&name), tx);

        let worker = ModuleWorker::new(Arc::new(spec), Arc::clone(&self.matrix));
        let token = self.matrix.shutdown.child_token();
        let group = Arc::clone(&self.group);
        let max_restarts = self.max_restarts;

        let mut first = Some(rx);
        let start = {
            let group = Arc::clone(&group);
            let name = Arc::clone(&name);
            let token = token.clone();
            move || {
                let rx = first.take().unwrap_or_else(|| {
                    let (tx, rx) = mpsc::unbounded_channel();
                    group.join(Arc::clone(&name), tx);
                    rx
                });
                worker.clone().run(rx, token.clone())
            }
        };

        let span = telemetry::spans::module(&name);
        let task = tokio::spawn(
            async move {
                let exit = supervisor::supervise(&name, max_restarts, &token, start).await;
                group.leave(&name);
                exit
            }
            .instrument(span),
        );

        info!(module = %key, "Registered module");
        modules.insert(key, task);
        Ok(())
    }

    /// Deliver `message` to every module. Returns how many mailboxes took it.
    pub fn broadcast(&self, message: impl Into<Arc<Message>>) -> usize {
        let message = message.into();
        self.group.broadcast(&message)
    }

    /// Names of registered modules.
    pub fn modules(&self) -> Vec<String> {
        self.modules.lock().keys().cloned().collect()
    }

    /// Close every mailbox, wait until each worker has handled everything
    /// already broadcast, then stop the channel actors.
    pub async fn drain(&self) -> HashMap<String, Exit> {
        self.group.close();
        let exits = self.join_workers().await;
        self.matrix.shutdown();
        exits
    }

    /// Cancel every worker and channel actor, then wait for the workers.
    ///
    /// Messages still queued in a mailbox are dropped.
    pub async fn shutdown(&self) -> HashMap<String, Exit> {
        self.matrix.shutdown();
        self.join_workers().await
    }

    async fn join_workers(&self) -> HashMap<String, Exit> {
        let tasks: Vec<_> = self.modules.lock().drain().collect();

        let mut exits = HashMap::new();
        for (name, task) in tasks {
            let exit = task.await.unwrap_or(Exit::Cancelled);
            debug!(module = %name, ?exit, "Module stopped");
            exits.insert(name, exit);
        }
        exits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ActionResult;
    use crate::outbound::RecordingOutbound;
    use crate::rules::{ActionContext, ModuleBuilder, ValidatorSet};
    use std::time::Duration;

    fn echo_module(name: &str, tx: mpsc::UnboundedSender<String>) -> ModuleSpec {
        let validators = ValidatorSet::with_builtins();
        let module = name.to_string();
        ModuleBuilder::new(name, &validators)
            .handle("PRIVMSG", move |r| {
                r.always(move |ctx: ActionContext| {
                    let line = format!("{module}:{}", ctx.message.trailing);
                    let sent = tx.send(line);
                    async move {
                        let _ = sent;
                        ActionResult::Ok(())
                    }
                });
                Ok(())
            })
            .unwrap()
            .build()
    }

    fn dispatcher() -> Dispatcher {
        let config = Config::default();
        let matrix = Matrix::new(&config, Arc::new(RecordingOutbound::new()));
        Dispatcher::new(matrix, &config.dispatch)
    }

    #[tokio::test]
    async fn broadcast_reaches_each_module_in_order() {
        let dispatcher = dispatcher();
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatcher.register(echo_module("a", tx.clone())).unwrap();
        dispatcher.register(echo_module("b", tx)).unwrap();

        for n in 0..3 {
            let msg = Message::new("PRIVMSG", vec!["#rust".into()], n.to_string());
            assert_eq!(dispatcher.broadcast(msg), 2);
        }

        let mut seen = Vec::new();
        while seen.len() < 6 {
            let line = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            seen.push(line);
        }
        for module in ["a", "b"] {
            let own: Vec<_> = seen.iter().filter(|l| l.starts_with(module)).cloned().collect();
            let expected: Vec<_> = (0..3).map(|n| format!("{module}:{n}")).collect();
            assert_eq!(own, expected);
        }
    }

    #[tokio::test]
    async fn duplicate_module_is_rejected() {
        let dispatcher = dispatcher();
        let (tx, _rx) = mpsc::unbounded_channel();
        dispatcher.register(echo_module("a", tx.clone())).unwrap();
        assert!(matches!(
            dispatcher.register(echo_module("a", tx)),
            Err(RuleError::DuplicateModule(name)) if name == "a"
        ));
        assert_eq!(dispatcher.modules(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn shutdown_stops_every_worker() {
        let dispatcher = dispatcher();
        let (tx, _rx) = mpsc::unbounded_channel();
        dispatcher.register(echo_module("a", tx)).unwrap();

        let exits = dispatcher.shutdown().await;
        assert_eq!(exits.get("a"), Some(&Exit::Stopped));
        assert!(dispatcher.group().is_empty());
        assert_eq!(dispatcher.broadcast(Message::new("PING", vec![], "x")), 0);
    }

    #[tokio::test]
    async fn drain_handles_everything_already_broadcast() {
        let dispatcher = dispatcher();
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatcher.register(echo_module("a", tx)).unwrap();

        for n in 0..500 {
            let msg = Message::new("PRIVMSG", vec!["#rust".into()], n.to_string());
            dispatcher.broadcast(msg);
        }
        let exits = dispatcher.drain().await;
        assert_eq!(exits.get("a"), Some(&Exit::Stopped));
        assert!(dispatcher.matrix().shutdown.is_cancelled());

        let mut seen = Vec::new();
        while let Ok(line) = rx.try_recv() {
            seen.push(line);
        }
        let expected: Vec<_> = (0..500).map(|n| format!("a:{n}")).collect();
        assert_eq!(seen, expected);
        assert_eq!(dispatcher.broadcast(Message::new("PING", vec![], "x")), 0);
    }
}
