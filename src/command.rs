//! Line-oriented user commands.
//!
//! This module defines the [`Command`] enum, the commands an interactive front-end
//! can issue against a [`Client`](crate::client::Client), and the parser that turns
//! a line of user input into one.
//!
//! # Overview
//!
//! - `sub <topic>`: Subscribe to a topic.
//! - `unsub <topic>`: Unsubscribe from a topic.
//! - `pub <topic> <text>`: Publish the rest of the line to a topic.
//! - `/exit` or `/quit`: Stop the client and leave.
//!
//! # Example
//! ```rust
//! use mercury::Command;
//!
//! let cmd: Command = "pub weather sunny all day".try_into().unwrap();
//! assert_eq!(
//!     cmd,
//!     Command::Publish {
//!         topic: "weather".to_string(),
//!         body: "sunny all day".to_string(),
//!     }
//! );
//! ```
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized command '{0}'")]
    UnrecognizedCommand(String),

    #[error("invalid '{command}' command, {reason}")]
    InvalidCommandArguments { command: String, reason: String },

    #[error("no command provided")]
    Empty,
}

/// High-level user supplied commands to execute on a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe(String),
    Unsubscribe(String),
    Publish { topic: String, body: String },
    /// Requests the client to stop its workers and the session to end.
    Exit,
}

impl Command {
    /// Prefix a publication's body with `(<name>): ` so readers can tell who
    /// sent it. Other commands are returned unchanged.
    pub fn signed(self, name: &str) -> Self {
        match self {
            Command::Publish { topic, body } => Command::Publish {
                topic,
                body: format!("({name}): {body}"),
            },
            other => other,
        }
    }
}

impl TryFrom<&str> for Command {
    type Error = CommandError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let line = value.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim_start()),
            None => (line, ""),
        };

        match keyword {
            "" => Err(CommandError::Empty),
            "/exit" | "/quit" => Ok(Command::Exit),
            "sub" => Ok(Command::Subscribe(single_topic("sub", rest)?)),
            "unsub" => Ok(Command::Unsubscribe(single_topic("unsub", rest)?)),
            "pub" => {
                let (topic, body) = rest.split_once(char::is_whitespace).ok_or_else(|| {
                    CommandError::InvalidCommandArguments {
                        command: "pub".to_string(),
                        reason: "requires a topic and a message. Example: pub weather sunny"
                            .to_string(),
                    }
                })?;

                Ok(Command::Publish {
                    topic: topic.to_string(),
                    body: body.trim_start().to_string(),
                })
            }
            _ => Err(CommandError::UnrecognizedCommand(line.to_string())),
        }
    }
}

fn single_topic(command: &str, rest: &str) -> Result<String, CommandError> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(topic), None) => Ok(topic.to_string()),
        _ => Err(CommandError::InvalidCommandArguments {
            command: command.to_string(),
            reason: format!("requires exactly one topic. Example: {command} weather"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_from_string() {
        let inputs = vec![
            ("/exit", Command::Exit),
            ("/quit", Command::Exit),
            ("sub weather", Command::Subscribe("weather".to_string())),
            ("  unsub   weather \n", Command::Unsubscribe("weather".to_string())),
            (
                "pub weather  rain, then   sun",
                Command::Publish {
                    topic: "weather".to_string(),
                    body: "rain, then   sun".to_string(),
                },
            ),
        ];

        for (cmd, expected) in inputs {
            let command: Command = cmd.try_into().unwrap();
            assert_eq!(command, expected);
        }
    }

    #[test]
    fn command_signed_prefixes_publications() {
        let cmd: Command = "pub chat hi there".try_into().unwrap();
        assert_eq!(
            cmd.signed("alice"),
            Command::Publish {
                topic: "chat".to_string(),
                body: "(alice): hi there".to_string(),
            }
        );

        let sub = Command::Subscribe("chat".to_string());
        assert_eq!(sub.clone().signed("alice"), sub);
        assert_eq!(Command::Exit.signed("alice"), Command::Exit);
    }

    #[test]
    fn command_empty() {
        let res: Result<Command, _> = "   \n".try_into();
        assert_eq!(res, Err(CommandError::Empty));
    }

    #[test]
    fn command_unrecognized() {
        let res: Result<Command, _> = "publish weather sunny".try_into();
        assert_eq!(
            res,
            Err(CommandError::UnrecognizedCommand(
                "publish weather sunny".to_string()
            ))
        );
    }

    #[test]
    #[should_panic(expected = "InvalidCommandArguments")]
    fn command_publish_without_body() {
        let _: Command = "pub weather".try_into().unwrap();
    }

    #[test]
    #[should_panic(expected = "InvalidCommandArguments")]
    fn command_subscribe_without_topic() {
        let _: Command = "sub".try_into().unwrap();
    }

    #[test]
    fn command_subscribe_rejects_extra_words() {
        let res: Result<Command, _> = "sub weather news".try_into();
        assert!(matches!(
            res,
            Err(CommandError::InvalidCommandArguments { command, .. }) if command == "sub"
        ));
    }
}
