//! Integration test common infrastructure.
//!
//! Builds a matrix over a [`RecordingOutbound`] so tests can assert on every
//! line the core would have written, and drives module workers directly so a
//! test knows when a message has been fully handled.

#![allow(dead_code)]

use slircbot::config::Config;
use slircbot::dispatch::ModuleWorker;
use slircbot::modules;
use slircbot::outbound::{OutboundCommand, RecordingOutbound};
use slircbot::{Matrix, Message};
use std::sync::Arc;
use std::time::Duration;

/// Default test identity.
pub const NICK: &str = "slircbot";

/// A matrix writing into a recorder.
pub fn test_matrix(config: &Config) -> (Arc<Matrix>, Arc<RecordingOutbound>) {
    let outbound = Arc::new(RecordingOutbound::new());
    (Matrix::new(config, outbound.clone()), outbound)
}

pub fn parse(line: &str) -> Arc<Message> {
    Arc::new(Message::parse(line).expect("test line should parse"))
}

/// The built-in modules, each behind its own worker.
pub struct TestBot {
    pub matrix: Arc<Matrix>,
    pub outbound: Arc<RecordingOutbound>,
    pub workers: Vec<ModuleWorker>,
}

impl TestBot {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let (matrix, outbound) = test_matrix(&config);
        let validators = modules::validators(&config).expect("stock validators");
        let workers = modules::builtin_modules(&validators)
            .expect("builtin modules")
            .into_iter()
            .map(|spec| ModuleWorker::new(Arc::new(spec), Arc::clone(&matrix)))
            .collect();
        Self {
            matrix,
            outbound,
            workers,
        }
    }

    /// Run `line` through every module to completion. Returns actions fired.
    pub async fn feed(&self, line: &str) -> usize {
        let message = parse(line);
        let mut fired = 0;
        for worker in &self.workers {
            fired += worker.dispatch(Arc::clone(&message)).await;
        }
        fired
    }

    /// Join `channel` as the server would confirm it, then wait for the actor.
    pub async fn join(&self, channel: &str) {
        self.join_as(NICK, channel).await;
    }

    /// Like [`TestBot::join`], for when our nick is no longer [`NICK`].
    pub async fn join_as(&self, nick: &str, channel: &str) {
        self.feed(&format!(":{nick}!bot@host JOIN {channel}")).await;
        self.matrix
            .channel(channel)
            .expect("channel actor after own JOIN")
            .get_user_count()
            .await
            .expect("fresh actor answers");
    }

    /// Outbound lines so far, rendered as on the wire; clears the recorder.
    pub fn take_lines(&self) -> Vec<String> {
        self.outbound
            .take()
            .iter()
            .map(OutboundCommand::to_string)
            .collect()
    }
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
