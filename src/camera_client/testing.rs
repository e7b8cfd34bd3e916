//! In-memory `ControlTransport` for unit tests

use super::types::{CameraCommand, CommandResponse, ControlTransport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Records every command and answers from a fixed script
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<CameraCommand>>,
    /// Commands (by name) that answer with status 503
    failing: Mutex<Vec<&'static str>>,
    /// Body returned for image-fetching commands
    image_body: Vec<u8>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(body: &[u8]) -> Self {
        Self {
            image_body: body.to_vec(),
            ..Self::default()
        }
    }

    pub fn fail(&self, command_name: &'static str) {
        self.failing.lock().unwrap().push(command_name);
    }

    pub fn recover(&self, command_name: &'static str) {
        self.failing.lock().unwrap().retain(|c| *c != command_name);
    }

    pub fn calls(&self) -> Vec<CameraCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.name()).collect()
    }

    pub fn count(&self, command_name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.name() == command_name)
            .count()
    }
}

#[async_trait]
impl ControlTransport for RecordingTransport {
    async fn execute(&self, command: &CameraCommand) -> Result<CommandResponse> {
        self.calls.lock().unwrap().push(command.clone());

        if self.failing.lock().unwrap().contains(&command.name()) {
            return Err(Error::Protocol {
                command: command.name().to_string(),
                status: 503,
            });
        }

        let body = match command {
            CameraCommand::GetLastJpg
            | CameraCommand::GetRecView
            | CameraCommand::Thumbnail { .. }
            | CameraCommand::Resize { .. }
            | CameraCommand::Image { .. } => self.image_body.clone(),
            CameraCommand::ConnectMode => b"<connectmode>OPC</connectmode>".to_vec(),
            _ => Vec::new(),
        };

        Ok(CommandResponse::new(body))
    }
}
