//! Message queue client engine.
//!
//! A [`Client`] turns application calls into protocol requests and moves them
//! through two [`BlockingQueue`]s serviced by background threads:
//!
//! - The **pusher** drains the outgoing queue and sends each request to the broker.
//! - The **puller** polls the broker for messages addressed to this client and
//!   feeds them into the incoming queue, where [`Client::retrieve`] picks them up.
//!
//! # Lifecycle
//!
//! `new` → [`start`](Client::start) → publish/subscribe/retrieve →
//! [`stop`](Client::stop). Starting subscribes the client to the reserved
//! [`SENTINEL`] topic; stopping publishes the sentinel, so the broker routes it
//! back through the puller and wakes anything blocked on the incoming queue.
//! After the workers are joined one more sentinel is queued locally, which keeps
//! `retrieve` from blocking forever when the broker is gone.
//!
//! # Example
//! ```no_run
//! use mercury::Client;
//!
//! let client = Client::new("alice", "localhost", "9620").unwrap();
//! client.start().unwrap();
//! client.subscribe("weather");
//! client.publish("weather", "sunny");
//!
//! while let Some(message) = client.retrieve() {
//!     println!("{message}");
//! }
//! ```
mod config;
mod worker;

use std::{
    sync::{Arc, Mutex, MutexGuard},
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    Command,
    protocol::{Connector, Request, TcpConnector},
    queue::BlockingQueue,
};

pub use config::{
    ClientConfig, DEFAULT_IDLE_WAIT, DEFAULT_MAX_RETRY_DELAY, DEFAULT_RETRY_DELAY,
};
use worker::Backoff;

/// Reserved topic and body used to signal shutdown. Applications must not
/// publish to it.
pub const SENTINEL: &str = "SHUTDOWN";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid client name '{0}': must be non-empty without '/' or whitespace")]
    InvalidName(String),
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("client has already been started")]
    AlreadyStarted,
    #[error("failed to spawn {worker} thread: {source}")]
    Spawn {
        worker: &'static str,
        source: std::io::Error,
    },
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

/// State shared between the client handle and its workers.
pub(crate) struct Shared<C> {
    name: String,
    config: ClientConfig,
    connector: C,
    outgoing: BlockingQueue<Request>,
    incoming: BlockingQueue<Request>,
    shutdown: Mutex<bool>,
}

impl<C> Shared<C> {
    fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_shutdown(&self) {
        *self.shutdown.lock().unwrap_or_else(|p| p.into_inner()) = true;
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(self.config.retry_delay, self.config.max_retry_delay)
    }
}

#[derive(Debug)]
struct Workers {
    pusher: JoinHandle<()>,
    puller: JoinHandle<()>,
}

#[derive(Debug)]
enum State {
    Created,
    Running(Workers),
    Stopped,
}

pub struct Client<C: Connector = TcpConnector> {
    shared: Arc<Shared<C>>,
    state: Mutex<State>,
}

impl Client<TcpConnector> {
    /// Create a client named `name` for the broker at `host:port`.
    pub fn new(name: &str, host: &str, port: &str) -> Result<Self, ClientError> {
        Self::with_config(name, ClientConfig::parse(host, port)?)
    }

    pub fn with_config(name: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let connector = config.connector();
        Self::with_connector(name, connector, config)
    }
}

impl<C: Connector> Client<C> {
    /// Create a client that opens its connections through `connector`.
    pub fn with_connector(
        name: &str,
        connector: C,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        if name.is_empty() || name.contains(|c: char| c == '/' || c.is_whitespace()) {
            return Err(ClientError::InvalidName(name.to_string()));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                name: name.to_string(),
                config,
                connector,
                outgoing: BlockingQueue::new(),
                incoming: BlockingQueue::new(),
                shutdown: Mutex::new(false),
            }),
            state: Mutex::new(State::Created),
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Spawn the pusher and puller, then subscribe to the shutdown sentinel.
    pub fn start(&self) -> Result<(), ClientError> {
        let mut state = self.state();
        if !matches!(*state, State::Created) {
            return Err(ClientError::AlreadyStarted);
        }

        let pusher = self.spawn("pusher", worker::pusher::<C>)?;
        let puller = match self.spawn("puller", worker::puller::<C>) {
            Ok(puller) => puller,
            Err(e) => {
                self.shared.set_shutdown();
                if pusher.join().is_err() {
                    warn!("{} pusher panicked", self.shared.name);
                }
                *state = State::Stopped;
                return Err(e);
            }
        };
        *state = State::Running(Workers { pusher, puller });
        drop(state);

        info!("{} started", self.shared.name);
        self.subscribe(SENTINEL);
        Ok(())
    }

    fn spawn(
        &self,
        worker: &'static str,
        run: fn(Arc<Shared<C>>),
    ) -> Result<JoinHandle<()>, ClientError> {
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name(format!("{}-{worker}", self.shared.name))
            .spawn(move || run(shared))
            .map_err(|source| ClientError::Spawn { worker, source })
    }

    /// Queue `body` for publication on `topic`.
    pub fn publish(&self, topic: &str, body: &str) {
        self.shared.outgoing.push(Request::publish(topic, body));
    }

    pub fn subscribe(&self, topic: &str) {
        self.shared
            .outgoing
            .push(Request::subscribe(&self.shared.name, topic));
    }

    pub fn unsubscribe(&self, topic: &str) {
        self.shared
            .outgoing
            .push(Request::unsubscribe(&self.shared.name, topic));
    }

    /// Block until a message is delivered and return its body.
    ///
    /// Returns `None` when the shutdown sentinel is dequeued instead.
    pub fn retrieve(&self) -> Option<String> {
        let message = self.shared.incoming.pop();
        match message.into_body() {
            Some(body) if body == SENTINEL => {
                debug!("{} retrieved shutdown sentinel", self.shared.name);
                None
            }
            body => Some(body.unwrap_or_default()),
        }
    }

    /// Block until a message arrives or this client shuts down.
    ///
    /// Unlike [`retrieve`](Self::retrieve), sentinels routed here because
    /// another client stopped are skipped; only this client's own shutdown
    /// yields `None`.
    pub fn next_message(&self) -> Option<String> {
        while !self.is_shutdown() {
            if let Some(message) = self.retrieve() {
                return Some(message);
            }
        }
        None
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Publish the sentinel, raise the shutdown flag and join both workers.
    ///
    /// Calling `stop` on a client that was never started, or more than once,
    /// only raises the flag and wakes `retrieve`.
    pub fn stop(&self) -> Result<(), ClientError> {
        let mut state = self.state();
        let previous = std::mem::replace(&mut *state, State::Stopped);

        let mut result = Ok(());
        if let State::Running(workers) = previous {
            info!("{} stopping", self.shared.name);
            self.publish(SENTINEL, SENTINEL);
            self.shared.set_shutdown();

            if workers.pusher.join().is_err() {
                result = Err(ClientError::WorkerPanicked("pusher"));
            }
            if workers.puller.join().is_err() {
                result = Err(ClientError::WorkerPanicked("puller"));
            }
            info!("{} stopped", self.shared.name);
        } else {
            self.shared.set_shutdown();
        }

        self.shared
            .incoming
            .push(Request::delivery(&self.shared.name, SENTINEL.to_string()));
        result
    }

    /// Dispatch a parsed user command. [`Command::Exit`] stops the client.
    pub fn execute(&self, command: Command) -> Result<(), ClientError> {
        match command {
            Command::Subscribe(topic) => self.subscribe(&topic),
            Command::Unsubscribe(topic) => self.unsubscribe(&topic),
            Command::Publish { topic, body } => self.publish(&topic, &body),
            Command::Exit => return self.stop(),
        }
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<C: Connector> Drop for Client<C> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|p| p.into_inner());
        if let State::Running(_) = state {
            // Workers hold their own `Arc` to the shared state; detach them.
            warn!("{} dropped while running, detaching workers", self.shared.name);
            self.shared.set_shutdown();
        }
    }
}
