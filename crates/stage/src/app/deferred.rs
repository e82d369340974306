use std::fmt::Display;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    Pending,
    Ready,
    Failed,
}

enum Slot<T> {
    Pending(Receiver<Result<T, String>>),
    Ready(T),
    Failed(String),
}

/// A value produced off the loop thread.
///
/// The tagged state is checked with [`Deferred::poll`] on each tick until it
/// resolves; after that the outcome is cached and the channel is gone. Loads
/// are never cancelled and failures are never retried.
pub struct Deferred<T> {
    label: String,
    slot: Slot<T>,
}

impl<T: Send + 'static> Deferred<T> {
    pub fn spawn<F, E>(label: impl Into<String>, loader: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Display,
    {
        let label = label.into();
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("load:{label}"))
            .spawn(move || {
                let result = loader().map_err(|error| error.to_string());
                // The owner may already be gone; nothing left to notify then.
                let _ = sender.send(result);
            });

        match spawned {
            Ok(_) => Self {
                label,
                slot: Slot::Pending(receiver),
            },
            Err(source) => {
                error!(asset = %label, error = %source, "deferred_spawn_failed");
                Self {
                    label,
                    slot: Slot::Failed(source.to_string()),
                }
            }
        }
    }
}

impl<T> Deferred<T> {
    pub fn ready(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            slot: Slot::Ready(value),
        }
    }

    pub fn from_receiver(label: impl Into<String>, receiver: Receiver<Result<T, String>>) -> Self {
        Self {
            label: label.into(),
            slot: Slot::Pending(receiver),
        }
    }

    pub fn state(&self) -> DeferredState {
        match self.slot {
            Slot::Pending(_) => DeferredState::Pending,
            Slot::Ready(_) => DeferredState::Ready,
            Slot::Failed(_) => DeferredState::Failed,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.slot {
            Slot::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Resolves a pending value if the loader has finished, without blocking.
    pub fn poll(&mut self) -> Option<&mut T> {
        if let Slot::Pending(receiver) = &self.slot {
            match receiver.try_recv() {
                Ok(Ok(value)) => {
                    info!(asset = %self.label, "deferred_ready");
                    self.slot = Slot::Ready(value);
                }
                Ok(Err(reason)) => {
                    error!(asset = %self.label, reason = %reason, "deferred_failed");
                    self.slot = Slot::Failed(reason);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    let reason = "loader exited without a result".to_string();
                    error!(asset = %self.label, reason = %reason, "deferred_failed");
                    self.slot = Slot::Failed(reason);
                }
            }
        }
        self.get_mut()
    }

    pub fn get(&self) -> Option<&T> {
        match &self.slot {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match &mut self.slot {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn poll_until_resolved<T>(deferred: &mut Deferred<T>) -> DeferredState {
        let deadline = Instant::now() + Duration::from_secs(5);
        while deferred.state() == DeferredState::Pending && Instant::now() < deadline {
            deferred.poll();
            thread::sleep(Duration::from_millis(1));
        }
        deferred.state()
    }

    #[test]
    fn pending_until_sender_delivers() {
        let (sender, receiver) = mpsc::channel();
        let mut deferred = Deferred::<u32>::from_receiver("model", receiver);

        assert!(deferred.poll().is_none());
        assert_eq!(deferred.state(), DeferredState::Pending);

        sender.send(Ok(7)).expect("send");
        assert_eq!(deferred.poll().copied(), Some(7));
        assert_eq!(deferred.state(), DeferredState::Ready);
    }

    #[test]
    fn failure_is_cached_and_not_retried() {
        let (sender, receiver) = mpsc::channel();
        let mut deferred = Deferred::<u32>::from_receiver("model", receiver);
        sender.send(Err("missing skeleton".to_string())).expect("send");

        assert!(deferred.poll().is_none());
        assert_eq!(deferred.state(), DeferredState::Failed);
        assert_eq!(deferred.failure_reason(), Some("missing skeleton"));

        // A late value on a dead channel is never observed.
        let _ = sender.send(Ok(1));
        assert!(deferred.poll().is_none());
        assert_eq!(deferred.state(), DeferredState::Failed);
    }

    #[test]
    fn dropped_sender_resolves_to_failed() {
        let (sender, receiver) = mpsc::channel::<Result<u32, String>>();
        drop(sender);
        let mut deferred = Deferred::from_receiver("model", receiver);
        assert!(deferred.poll().is_none());
        assert_eq!(deferred.state(), DeferredState::Failed);
    }

    #[test]
    fn spawned_loader_result_arrives() {
        let mut deferred = Deferred::spawn("answer", || Ok::<_, String>(42u32));
        assert_eq!(poll_until_resolved(&mut deferred), DeferredState::Ready);
        assert_eq!(deferred.get().copied(), Some(42));
    }

    #[test]
    fn spawned_loader_error_becomes_failed() {
        let mut deferred = Deferred::<u32>::spawn("broken", || Err("no such file"));
        assert_eq!(poll_until_resolved(&mut deferred), DeferredState::Failed);
        assert_eq!(deferred.failure_reason(), Some("no such file"));
    }
}
