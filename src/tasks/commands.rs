//! Commands accepted by the presenter task and their replies

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::{
    document::DocumentSource,
    error::{ConfigValidationError, DocumentError},
    state::{ContainerSize, ConfigUpdate, TimerConfig},
    ui::{DragEvent, KeyInput, KeyOutcome},
};

/// Direct timer controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Reset,
    Toggle,
}

impl FromStr for TimerCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(TimerCommand::Start),
            "pause" => Ok(TimerCommand::Pause),
            "resume" => Ok(TimerCommand::Resume),
            "reset" => Ok(TimerCommand::Reset),
            "toggle" => Ok(TimerCommand::Toggle),
            other => Err(format!("unknown timer command: {}", other)),
        }
    }
}

/// Side effect the browser has to carry out itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientEffect {
    ToggleFullscreen,
}

/// Reply to a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyReply {
    pub outcome: KeyOutcome,
    pub prevent_default: bool,
    pub effect: Option<ClientEffect>,
}

/// Summary of a loaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub load_id: u64,
    pub page_count: u32,
}

pub type Reply<T> = oneshot::Sender<T>;

/// Message from the outside world to the presenter
#[derive(Debug)]
pub enum Command {
    Key {
        input: KeyInput,
        reply: Reply<KeyReply>,
    },
    /// Answered once decoding has finished or failed
    LoadDocument {
        source: DocumentSource,
        reply: Reply<Result<DocumentInfo, DocumentError>>,
    },
    Drag {
        event: DragEvent,
        reply: Reply<bool>,
    },
    GoToPage {
        page: u32,
        reply: Reply<bool>,
    },
    Timer {
        command: TimerCommand,
        reply: Reply<bool>,
    },
    Configure {
        update: ConfigUpdate,
        reply: Reply<Result<TimerConfig, ConfigValidationError>>,
    },
    GetConfig {
        reply: Reply<TimerConfig>,
    },
    Resize {
        container: ContainerSize,
        reply: Reply<bool>,
    },
}

impl Command {
    /// Short name used for last-action tracking and logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Key { .. } => "key",
            Command::LoadDocument { .. } => "load-document",
            Command::Drag { .. } => "drag",
            Command::GoToPage { .. } => "go-to-page",
            Command::Timer { .. } => "timer",
            Command::Configure { .. } => "configure",
            Command::GetConfig { .. } => "get-config",
            Command::Resize { .. } => "resize",
        }
    }
}
