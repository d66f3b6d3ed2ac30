use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::contracts::types::{ConvertData, HashData};
use crate::error::ClientError;

/// Result payload of a command. Serialized without a tag: the envelope's
/// `command` field already says which one it is.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommandData {
    Convert(ConvertData),
    Hash(HashData),
}

impl CommandData {
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Convert(_) => "convert",
            Self::Hash(_) => "hash",
        }
    }
}

impl From<ConvertData> for CommandData {
    fn from(data: ConvertData) -> Self {
        Self::Convert(data)
    }
}

impl From<HashData> for CommandData {
    fn from(data: HashData) -> Self {
        Self::Hash(data)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: &'static str,
    pub version: &'static str,
    pub data: CommandData,
}

/// Borrowed view of a [`ClientError`] ready for serialization.
#[derive(Debug, Serialize)]
pub struct FailureEnvelope<'a> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<&'a str>,
    pub version: &'static str,
    pub error: ErrorContract<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorContract<'a> {
    pub code: &'a str,
    pub message: &'a str,
    pub recovery_steps: &'a [String],
}

pub fn success(data: impl Into<CommandData>) -> SuccessEnvelope {
    let data = data.into();
    SuccessEnvelope {
        ok: true,
        command: data.command(),
        version: API_VERSION,
        data,
    }
}

/// `command` is `None` when the failure happened before a command was
/// recognized, e.g. an unknown subcommand.
pub fn failure<'a>(command: Option<&'a str>, error: &'a ClientError) -> FailureEnvelope<'a> {
    FailureEnvelope {
        ok: false,
        command,
        version: API_VERSION,
        error: ErrorContract {
            code: &error.code,
            message: &error.message,
            recovery_steps: &error.recovery_steps,
        },
        data: error.data.as_ref(),
    }
}
