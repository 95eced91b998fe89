//! Command gateway.
//!
//! The boundary between the front-end client and the [`TrackingEngine`].
//! External messages arrive as text lines (`add 300`) or JSON objects
//! (`{"command":"add_water","amount":300}`); both decode into a [`Command`]
//! which is applied to the engine in arrival order.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, Result};
use crate::events::Event;
use crate::tracker::{StatusSnapshot, TrackingEngine};

const COMMAND_NAMES: [&str; 4] = ["start", "stop", "add_water", "query"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Start,
    Stop,
    /// `None` means one glass.
    AddWater {
        #[serde(default)]
        amount: Option<f64>,
    },
    Query,
}

impl Command {
    /// Decode one external message.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CommandError::Empty);
        }
        if input.starts_with('{') {
            Self::parse_json(input)
        } else {
            Self::parse_text(input)
        }
    }

    fn parse_json(input: &str) -> Result<Self, CommandError> {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|e| CommandError::MalformedPayload {
                command: "json".into(),
                message: e.to_string(),
            })?;
        let name = value
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CommandError::MalformedPayload {
                command: "json".into(),
                message: "missing string field 'command'".into(),
            })?
            .to_string();
        if !COMMAND_NAMES.contains(&name.as_str()) {
            return Err(CommandError::Unknown(name));
        }
        let allowed: &[&str] = if name == "add_water" {
            &["command", "amount"]
        } else {
            &["command"]
        };
        if let Some(extra) = value
            .as_object()
            .and_then(|fields| fields.keys().find(|k| !allowed.contains(&k.as_str())))
        {
            return Err(CommandError::MalformedPayload {
                message: format!("unexpected field '{extra}'"),
                command: name,
            });
        }
        serde_json::from_value(value).map_err(|e| CommandError::MalformedPayload {
            command: name,
            message: e.to_string(),
        })
    }

    fn parse_text(input: &str) -> Result<Self, CommandError> {
        let mut words = input.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match name.as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "query" | "status" => Command::Query,
            "add" | "add_water" | "drink" => {
                let amount = match args.as_slice() {
                    [] => None,
                    [amount] => Some(amount.parse::<f64>().map_err(|e| {
                        CommandError::MalformedPayload {
                            command: name.clone(),
                            message: format!("'{amount}' is not a number: {e}"),
                        }
                    })?),
                    _ => {
                        return Err(CommandError::MalformedPayload {
                            command: name.clone(),
                            message: "expected at most one amount".into(),
                        })
                    }
                };
                return Ok(Command::AddWater { amount });
            }
            _ => return Err(CommandError::Unknown(name.clone())),
        };
        if !args.is_empty() {
            return Err(CommandError::MalformedPayload {
                command: name,
                message: "takes no arguments".into(),
            });
        }
        Ok(command)
    }
}

/// Result of one applied command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub command: Command,
    /// `None` when the command was an accepted no-op or a query.
    pub event: Option<Event>,
    pub snapshot: StatusSnapshot,
}

pub struct CommandGateway {
    engine: TrackingEngine,
    /// Held for the whole of one dispatch so replies pair event and snapshot.
    intake: Mutex<()>,
}

impl CommandGateway {
    pub fn new(engine: TrackingEngine) -> Self {
        Self {
            engine,
            intake: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &TrackingEngine {
        &self.engine
    }

    /// Synchronous read of the authoritative state.
    pub fn query(&self) -> StatusSnapshot {
        self.engine.query()
    }

    /// Apply `command` to the engine.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a rejected water amount; nothing is
    /// mutated in that case.
    pub fn dispatch(&self, command: Command) -> Result<CommandReply> {
        let _intake = self.intake.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(?command, "dispatching command");

        let event = match &command {
            Command::Start => self.engine.start(),
            Command::Stop => self.engine.stop(),
            Command::AddWater { amount: Some(amount) } => Some(self.engine.add_water(*amount)?),
            Command::AddWater { amount: None } => Some(self.engine.add_glass()?),
            Command::Query => None,
        };
        Ok(CommandReply {
            command,
            event,
            snapshot: self.engine.query(),
        })
    }

    /// Decode and apply one external message.
    ///
    /// # Errors
    ///
    /// Unknown or malformed messages are rejected before reaching the engine.
    pub fn handle(&self, input: &str) -> Result<CommandReply> {
        let command = Command::parse(input).inspect_err(|e| {
            tracing::warn!(error = %e, "command rejected");
        })?;
        self.dispatch(command)
    }
}
