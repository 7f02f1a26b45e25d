//! Background thread that owns the transport.
//!
//! Effects go in over one channel and completions come back over another, so the event
//! loop never blocks on the network. Completions arrive in whatever order the requests
//! finish; the model drops the ones that are no longer current.

use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::remote::Transport;
use crate::view_model::{Completion, Effect};

pub struct Worker {
    tx: Option<Sender<Effect>>,
    rx: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn<T>(transport: T) -> Result<Self>
    where
        T: Transport + Send + 'static,
    {
        let (effect_tx, effect_rx) = crossbeam_channel::unbounded::<Effect>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<Completion>();

        let handle = std::thread::Builder::new()
            .name("forksync-http".to_string())
            .spawn(move || worker_loop(transport, effect_rx, done_tx))
            .context("spawn http worker")?;

        Ok(Self {
            tx: Some(effect_tx),
            rx: done_rx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, effect: Effect) -> Result<()> {
        self.tx
            .as_ref()
            .context("http worker stopped")?
            .send(effect)
            .map_err(|_| anyhow::anyhow!("http worker stopped"))
    }

    pub fn try_recv(&self) -> Option<Completion> {
        match self.rx.try_recv() {
            Ok(c) => Some(c),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(c) => Some(c),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the effect channel ends the loop once the in-flight request returns.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop<T: Transport>(transport: T, rx: Receiver<Effect>, tx: Sender<Completion>) {
    for effect in rx {
        let completion = effect.run(&transport);
        if tx.send(completion).is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "tests/worker_tests.rs"]
mod tests;
