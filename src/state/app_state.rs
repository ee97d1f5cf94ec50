//! Shared application state used by the HTTP handlers

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::warn;

use crate::{
    document::DocumentSource,
    error::{Notification, PresenterError},
    state::{ConfigUpdate, ContainerSize, TimerConfig},
    tasks::{Command, DocumentInfo, KeyReply, PresenterHandle, TimerCommand},
    ui::{DragEvent, KeyInput, Projection},
};

/// Handle to the presenter task plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// Command channel into the presenter task
    pub commands: mpsc::Sender<Command>,
    /// Latest projection, updated on every transition and tick
    pub projection: watch::Receiver<Projection>,
    /// User notification channel
    pub notifications: broadcast::Sender<Notification>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(handle: PresenterHandle, host: String, port: u16) -> Self {
        Self {
            commands: handle.commands,
            projection: handle.projection,
            notifications: handle.notifications,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Send a command to the presenter and wait for its reply
    async fn request<T, F>(&self, action: &str, make: F) -> Result<T, PresenterError>
    where
        F: FnOnce(oneshot::Sender<T>) -> Command,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(make(reply_tx)).await.is_err() {
            warn!("Presenter gone, dropping {} request", action);
            return Err(PresenterError::Unavailable);
        }
        self.record_action(action);
        reply_rx.await.map_err(|_| PresenterError::Unavailable)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    pub async fn press_key(&self, input: KeyInput) -> Result<KeyReply, PresenterError> {
        self.request("key", |reply| Command::Key { input, reply }).await
    }

    /// Load a document, answering once decoding is done
    pub async fn load_document(
        &self,
        source: DocumentSource,
    ) -> Result<DocumentInfo, PresenterError> {
        Ok(self
            .request("load-document", |reply| Command::LoadDocument { source, reply })
            .await??)
    }

    pub async fn drag(&self, event: DragEvent) -> Result<bool, PresenterError> {
        self.request("drag", |reply| Command::Drag { event, reply }).await
    }

    pub async fn go_to_page(&self, page: u32) -> Result<bool, PresenterError> {
        self.request("go-to-page", |reply| Command::GoToPage { page, reply })
            .await
    }

    pub async fn timer(&self, command: TimerCommand) -> Result<bool, PresenterError> {
        self.request("timer", |reply| Command::Timer { command, reply })
            .await
    }

    pub async fn configure(&self, update: ConfigUpdate) -> Result<TimerConfig, PresenterError> {
        Ok(self
            .request("configure", |reply| Command::Configure { update, reply })
            .await??)
    }

    pub async fn config(&self) -> Result<TimerConfig, PresenterError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::GetConfig { reply: reply_tx })
            .await
            .map_err(|_| PresenterError::Unavailable)?;
        reply_rx.await.map_err(|_| PresenterError::Unavailable)
    }

    pub async fn resize(&self, container: ContainerSize) -> Result<bool, PresenterError> {
        self.request("resize", |reply| Command::Resize { container, reply })
            .await
    }

    /// Current projection
    pub fn projection(&self) -> Projection {
        self.projection.borrow().clone()
    }

    pub fn subscribe_projection(&self) -> watch::Receiver<Projection> {
        self.projection.clone()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
