//! Structured fan-out and join for a batch of named tasks
//!
//! Every task reports `(name, result)` on one channel. `join` waits for all of
//! them, even after failures, and feeds each result to the progress reporter
//! as it arrives.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    error::{DeployError, Result},
    progress::ProgressReporter,
};

/// Results of a joined group keyed by task name
#[derive(Debug)]
pub struct GroupResults<T> {
    results: BTreeMap<String, Result<T>>,
}

impl<T> GroupResults<T> {
    pub fn get(&self, name: &str) -> Option<&Result<T>> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Names of tasks that returned an error
    pub fn failures(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|r| r.is_err()).count()
    }

    pub fn into_inner(self) -> BTreeMap<String, Result<T>> {
        self.results
    }
}

/// A batch of named tasks that run concurrently and are joined together
pub struct TaskGroup<T> {
    sender: mpsc::UnboundedSender<(String, Result<T>)>,
    receiver: mpsc::UnboundedReceiver<(String, Result<T>)>,
    launched: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            launched: 0,
        }
    }

    /// Spawn `task` on the runtime; a panic is reported as an error result
    pub fn push<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let name = name.into();
        let sender = self.sender.clone();
        self.launched += 1;

        tokio::spawn(async move {
            let result = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(DeployError::TaskPanicked {
                    task: name.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            };
            if sender.send((name, result)).is_err() {
                debug!("task group dropped before result was delivered");
            }
        });
    }

    pub fn len(&self) -> usize {
        self.launched
    }

    pub fn is_empty(&self) -> bool {
        self.launched == 0
    }

    /// Wait for every launched task
    pub async fn join(mut self, reporter: &mut ProgressReporter) -> GroupResults<T> {
        // Only the spawned tasks hold senders now, so recv ends once they are all done
        drop(self.sender);

        let mut results = BTreeMap::new();
        while results.len() < self.launched {
            match self.receiver.recv().await {
                Some((name, result)) => {
                    reporter.record(&name, &result);
                    results.insert(name, result);
                }
                None => {
                    warn!(
                        received = results.len(),
                        expected = self.launched,
                        "task channel closed early"
                    );
                    break;
                }
            }
        }

        GroupResults { results }
    }
}

impl<T: Send + 'static> Default for TaskGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
