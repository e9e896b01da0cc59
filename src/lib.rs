pub mod client;
pub mod command;
pub mod protocol;
pub mod queue;

pub use client::{Client, ClientConfig, ClientError, SENTINEL};
pub use command::{Command, CommandError};
pub use protocol::BodyFraming;
pub use queue::BlockingQueue;
