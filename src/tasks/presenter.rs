//! Presenter task: the single event loop owning timer, pages and input state

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::commands::{ClientEffect, Command, DocumentInfo, KeyReply, TimerCommand};
use crate::{
    document::{DocumentBackend, DocumentChange, DocumentEvent, DocumentSource, PageController},
    error::{ConfigValidationError, DocumentError, Notification},
    state::{ConfigUpdate, ContainerSize, TimerConfig},
    timer::{CadenceEvent, TimerEngine},
    ui::{
        project, Action, InputRouter, KeyBindings, KeyInput, Projection, ProjectionInput,
        RouteContext,
    },
};

const COMMAND_BUFFER: usize = 64;
const NOTIFICATION_BUFFER: usize = 32;

/// Channels other tasks use to talk to a running presenter
#[derive(Debug, Clone)]
pub struct PresenterHandle {
    pub commands: mpsc::Sender<Command>,
    pub projection: watch::Receiver<Projection>,
    pub notifications: broadcast::Sender<Notification>,
}

/// Owns every piece of mutable presentation state.
///
/// Commands, cadence ticks and document task completions are handled one at
/// a time, and every handled message republishes the projection.
pub struct Presenter {
    config: TimerConfig,
    engine: TimerEngine,
    pages: PageController,
    router: InputRouter,
    pending_load: Option<(u64, oneshot::Sender<Result<DocumentInfo, DocumentError>>)>,
    projection_tx: watch::Sender<Projection>,
    notifications: broadcast::Sender<Notification>,
    commands: mpsc::Receiver<Command>,
    timer_events: mpsc::UnboundedReceiver<CadenceEvent>,
    document_events: mpsc::UnboundedReceiver<DocumentEvent>,
}

impl Presenter {
    pub fn new(
        config: TimerConfig,
        bindings: KeyBindings,
        backend: Arc<dyn DocumentBackend>,
        container: ContainerSize,
    ) -> (Self, PresenterHandle) {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (timer_tx, timer_events) = mpsc::unbounded_channel();
        let (document_tx, document_events) = mpsc::unbounded_channel();
        let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);

        let engine = TimerEngine::new(&config, timer_tx);
        let pages = PageController::new(backend, container, document_tx);
        let router = InputRouter::new(bindings);
        let initial = project(&ProjectionInput {
            timer: engine.state(),
            config: &config,
            pages: None,
            loading: false,
            settings_open: false,
            dragging: false,
        });
        let (projection_tx, projection) = watch::channel(initial);

        let presenter = Self {
            config,
            engine,
            pages,
            router,
            pending_load: None,
            projection_tx,
            notifications: notifications.clone(),
            commands,
            timer_events,
            document_events,
        };
        let handle = PresenterHandle {
            commands: command_tx,
            projection,
            notifications,
        };
        (presenter, handle)
    }

    /// Run until every command sender is gone
    pub async fn run(mut self) {
        info!(
            "Presenter started: {}s total, countdown {}",
            self.config.total_duration_seconds,
            if self.config.countdown_enabled {
                format!("{}s", self.config.countdown_seconds)
            } else {
                "off".to_string()
            }
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.timer_events.recv() => {
                    if self.engine.on_cadence(event) {
                        self.publish();
                    }
                }
                Some(event) = self.document_events.recv() => self.on_document_event(event),
            }
        }

        info!("Presenter stopped");
    }

    fn handle_command(&mut self, command: Command) {
        debug!("Handling {} command", command.name());
        match command {
            Command::Key { input, reply } => {
                let key_reply = self.press_key(&input);
                self.reply(reply, key_reply);
            }
            Command::LoadDocument { source, reply } => self.load_document(source, reply),
            Command::Drag { event, reply } => {
                let changed = self.router.drag(event);
                self.reply(reply, changed);
            }
            Command::GoToPage { page, reply } => {
                let changed = self.navigate(page);
                self.reply(reply, changed);
            }
            Command::Timer { command, reply } => {
                let changed = self.timer(command);
                self.reply(reply, changed);
            }
            Command::Configure { update, reply } => {
                let result = self.configure(&update);
                self.reply(reply, result);
            }
            Command::GetConfig { reply } => self.reply(reply, self.config),
            Command::Resize { container, reply } => {
                let scheduled = self.pages.resize(container);
                self.reply(reply, scheduled);
            }
        }
    }

    /// Publish first so the caller sees the projection its command produced
    fn reply<T>(&self, reply: oneshot::Sender<T>, value: T) {
        self.publish();
        let _ = reply.send(value);
    }

    fn route_context(&self) -> RouteContext {
        let pages = self.pages.pages();
        RouteContext {
            document_loaded: pages.is_some(),
            current_page: pages.map_or(0, |p| p.current_page),
            page_count: pages.map_or(0, |p| p.page_count),
            phase: self.engine.state().phase,
        }
    }

    fn press_key(&mut self, input: &KeyInput) -> KeyReply {
        let outcome = self.router.route_key(input, &self.route_context());
        let effect = outcome.action().and_then(|action| self.apply(action));
        KeyReply {
            outcome,
            prevent_default: outcome.prevent_default(),
            effect,
        }
    }

    fn apply(&mut self, action: Action) -> Option<ClientEffect> {
        debug!("Applying {:?}", action);
        match action {
            Action::GoToPage(page) => {
                self.navigate(page);
            }
            Action::StartTimer => {
                self.engine.start(&self.config);
            }
            Action::PauseTimer => {
                self.engine.pause();
            }
            Action::ResetTimer => self.engine.reset(&self.config),
            Action::ToggleFullscreen => return Some(ClientEffect::ToggleFullscreen),
            // the router already flipped its flag
            Action::ToggleSettings => {}
        }
        None
    }

    /// Render `page` and reset the timer, both or neither
    fn navigate(&mut self, page: u32) -> bool {
        if !self.pages.go_to(page) {
            return false;
        }
        self.engine.reset(&self.config);
        info!("Navigated to page {}", page);
        true
    }

    fn timer(&mut self, command: TimerCommand) -> bool {
        match command {
            TimerCommand::Start => self.engine.start(&self.config),
            TimerCommand::Pause => self.engine.pause(),
            TimerCommand::Resume => self.engine.resume(&self.config),
            TimerCommand::Reset => {
                self.engine.reset(&self.config);
                true
            }
            TimerCommand::Toggle => {
                if self.engine.state().phase.is_active() {
                    self.engine.pause()
                } else {
                    self.engine.start(&self.config)
                }
            }
        }
    }

    fn configure(&mut self, update: &ConfigUpdate) -> Result<TimerConfig, ConfigValidationError> {
        match self.config.apply(update) {
            Ok(change) => {
                if change.total_set {
                    self.engine.reset(&self.config);
                }
                info!("Configuration updated: {:?}", self.config);
                Ok(self.config)
            }
            Err(e) => {
                warn!("Rejected configuration update: {}", e);
                self.notify(e.notification());
                Err(e)
            }
        }
    }

    fn load_document(
        &mut self,
        source: DocumentSource,
        reply: oneshot::Sender<Result<DocumentInfo, DocumentError>>,
    ) {
        self.router.dropped();
        let result = self.pages.load_document(source);
        self.publish();
        match result {
            Ok(load_id) => {
                if let Some((previous, waiting)) = self.pending_load.replace((load_id, reply)) {
                    debug!("Load {} superseded by {}", previous, load_id);
                    let _ = waiting.send(Err(DocumentError::Superseded));
                }
            }
            Err(e) => {
                if let Some(note) = e.notification() {
                    self.notify(note);
                }
                let _ = reply.send(Err(e));
            }
        }
    }

    fn on_document_event(&mut self, event: DocumentEvent) {
        let Some(change) = self.pages.on_event(event) else {
            return;
        };

        let answer = match change {
            DocumentChange::Loaded {
                load_id,
                page_count,
            } => {
                self.engine.reset(&self.config);
                Some((load_id, Ok(DocumentInfo { load_id, page_count })))
            }
            DocumentChange::LoadFailed { load_id, error } => {
                let error = DocumentError::Decode(error);
                if let Some(note) = error.notification() {
                    self.notify(note);
                }
                Some((load_id, Err(error)))
            }
            DocumentChange::Rendered(frame) => {
                debug!("Page {} on screen", frame.page);
                None
            }
            DocumentChange::RenderCancelled { page } => {
                debug!("Render of page {} cancelled", page);
                None
            }
            DocumentChange::RenderFailed { .. } | DocumentChange::ResizeSettled { .. } => None,
        };

        self.publish();
        if let Some((load_id, result)) = answer {
            self.answer_load(load_id, result);
        }
    }

    fn answer_load(&mut self, load_id: u64, result: Result<DocumentInfo, DocumentError>) {
        match self.pending_load.take() {
            Some((pending, reply)) if pending == load_id => {
                let _ = reply.send(result);
            }
            other => self.pending_load = other,
        }
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("No notification subscribers");
        }
    }

    fn publish(&self) {
        let projection = project(&ProjectionInput {
            timer: self.engine.state(),
            config: &self.config,
            pages: self.pages.pages(),
            loading: self.pages.is_busy(),
            settings_open: self.router.settings_open(),
            dragging: self.router.dragging(),
        });
        self.projection_tx.send_replace(projection);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::sleep;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{
        document::{Document, RenderOutcome},
        error::DecodeError,
        state::{PageSize, RenderedFrame, TimerPhase, Viewport},
        ui::{DragEvent, KeyOutcome, VisualMode},
    };

    #[derive(Debug)]
    struct Deck {
        pages: u32,
    }

    #[async_trait]
    impl Document for Deck {
        fn page_count(&self) -> u32 {
            self.pages
        }

        fn page_size(&self, page: u32) -> Option<PageSize> {
            (1..=self.pages).contains(&page).then_some(PageSize::LETTER)
        }

        async fn render(
            &self,
            page: u32,
            viewport: Viewport,
            cancel: CancellationToken,
        ) -> RenderOutcome {
            tokio::select! {
                _ = cancel.cancelled() => RenderOutcome::Cancelled,
                _ = sleep(Duration::from_millis(5)) => {
                    RenderOutcome::Completed(RenderedFrame::new(page, viewport))
                }
            }
        }
    }

    /// First byte is the page count; zero bytes is a decode failure
    struct DeckBackend;

    #[async_trait]
    impl DocumentBackend for DeckBackend {
        async fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn Document>, DecodeError> {
            match bytes.first() {
                Some(&pages) => Ok(Arc::new(Deck {
                    pages: u32::from(pages),
                })),
                None => Err(DecodeError::MissingHeader),
            }
        }
    }

    fn start(config: TimerConfig) -> PresenterHandle {
        let (presenter, handle) = Presenter::new(
            config,
            KeyBindings::default(),
            Arc::new(DeckBackend),
            ContainerSize::default(),
        );
        tokio::spawn(presenter.run());
        handle
    }

    async fn send<T>(
        handle: &PresenterHandle,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> T {
        let (tx, rx) = oneshot::channel();
        handle.commands.send(make(tx)).await.expect("presenter running");
        rx.await.expect("reply")
    }

    async fn load(handle: &PresenterHandle, pages: u8) -> Result<DocumentInfo, DocumentError> {
        let source = DocumentSource::new(Some("application/pdf".into()), vec![pages]);
        send(handle, |reply| Command::LoadDocument { source, reply }).await
    }

    async fn key(handle: &PresenterHandle, key: &str) -> KeyReply {
        let input = KeyInput::plain(key);
        send(handle, |reply| Command::Key { input, reply }).await
    }

    fn projection(handle: &PresenterHandle) -> Projection {
        handle.projection.borrow().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_ignored_until_a_document_is_loaded() {
        let handle = start(TimerConfig::default());

        assert_eq!(key(&handle, " ").await.outcome, KeyOutcome::Suppressed);
        assert_eq!(projection(&handle).phase, TimerPhase::Stopped);

        let info = load(&handle, 3).await.expect("loaded");
        assert_eq!(info.page_count, 3);
        let reply = key(&handle, " ").await;
        assert!(reply.prevent_default);
        assert_eq!(projection(&handle).mode, VisualMode::Counting);
        assert_eq!(projection(&handle).countdown.value, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_overlay_never_shows_zero() {
        let handle = start(TimerConfig::new(60, true, 3).expect("valid"));
        load(&handle, 1).await.expect("loaded");
        let mut rx = handle.projection.clone();

        key(&handle, " ").await;
        let mut values = Vec::new();
        loop {
            let p = rx.borrow_and_update().clone();
            if p.countdown.visible && values.last() != Some(&p.countdown.value) {
                values.push(p.countdown.value);
            }
            assert_ne!(p.countdown.value, Some(0));
            if p.phase == TimerPhase::Running {
                break;
            }
            rx.changed().await.expect("presenter running");
        }

        assert_eq!(values, vec![Some(3), Some(2), Some(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_resets_a_running_timer() {
        let handle = start(TimerConfig::new(30, false, 3).expect("valid"));
        load(&handle, 2).await.expect("loaded");

        key(&handle, " ").await;
        sleep(Duration::from_millis(1050)).await;
        assert_eq!(projection(&handle).time_text, "29");

        let reply = key(&handle, "ArrowRight").await;
        assert_eq!(reply.outcome.action(), Some(Action::GoToPage(2)));
        let p = projection(&handle);
        assert_eq!(p.phase, TimerPhase::Stopped);
        assert_eq!(p.time_text, "30");
        assert_eq!(p.pages.map(|pages| pages.current_page), Some(2));

        // last page: handled, nothing happens
        key(&handle, " ").await;
        let reply = key(&handle, "ArrowRight").await;
        assert_eq!(reply.outcome.action(), None);
        assert_eq!(projection(&handle).phase, TimerPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn fullscreen_is_delegated_to_the_client() {
        let handle = start(TimerConfig::default());
        load(&handle, 1).await.expect("loaded");

        let reply = key(&handle, "f").await;
        assert_eq!(reply.effect, Some(ClientEffect::ToggleFullscreen));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_file_is_reported_and_changes_nothing() {
        let handle = start(TimerConfig::default());
        load(&handle, 4).await.expect("loaded");
        let mut notes = handle.notifications.subscribe();

        let source = DocumentSource::new(Some("image/jpeg".into()), vec![1]);
        let result = send(&handle, |reply| Command::LoadDocument { source, reply }).await;
        assert!(matches!(result, Err(DocumentError::InvalidInput { .. })));

        let note = notes.recv().await.expect("notification");
        assert_eq!(note.code, "invalid_input");
        assert_eq!(projection(&handle).pages.map(|p| p.page_count), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn decode_failure_is_reported_and_clears_the_document() {
        let handle = start(TimerConfig::default());
        load(&handle, 4).await.expect("loaded");
        let mut notes = handle.notifications.subscribe();

        let result = load(&handle, 0).await;
        assert!(result.is_err());
        let source = DocumentSource::new(Some("application/pdf".into()), vec![]);
        let result = send(&handle, |reply| Command::LoadDocument { source, reply }).await;
        assert_eq!(result, Err(DocumentError::Decode(DecodeError::MissingHeader)));

        assert_eq!(notes.recv().await.expect("notification").code, "decode_failed");
        assert!(!projection(&handle).document_loaded);
        assert_eq!(key(&handle, " ").await.outcome, KeyOutcome::Suppressed);
    }

    #[tokio::test(start_paused = true)]
    async fn total_duration_change_resets_and_bad_values_are_kept_out() {
        let handle = start(TimerConfig::new(60, false, 3).expect("valid"));
        load(&handle, 1).await.expect("loaded");
        send(&handle, |reply| Command::Timer {
            command: TimerCommand::Start,
            reply,
        })
        .await;

        let update = ConfigUpdate {
            total_duration_seconds: Some(90),
            ..Default::default()
        };
        let config = send(&handle, |reply| Command::Configure { update, reply })
            .await
            .expect("valid");
        assert_eq!(config.total_duration_seconds, 90);
        assert_eq!(projection(&handle).phase, TimerPhase::Stopped);
        assert_eq!(projection(&handle).time_text, "90");

        let update = ConfigUpdate {
            total_duration_seconds: Some(-1),
            ..Default::default()
        };
        let result = send(&handle, |reply| Command::Configure { update, reply }).await;
        assert!(result.is_err());
        let config = send(&handle, |reply| Command::GetConfig { reply }).await;
        assert_eq!(config.total_duration_seconds, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_load_answers_superseded() {
        let handle = start(TimerConfig::default());

        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        for (pages, reply) in [(2u8, first_tx), (5u8, second_tx)] {
            let source = DocumentSource::new(Some("application/pdf".into()), vec![pages]);
            handle
                .commands
                .send(Command::LoadDocument { source, reply })
                .await
                .expect("presenter running");
        }

        let first = first_rx.await.expect("reply");
        let second = second_rx.await.expect("reply");
        // the first decode may already have finished before the second arrived
        if let Err(e) = first {
            assert_eq!(e, DocumentError::Superseded);
        }
        assert_eq!(second.expect("loaded").page_count, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn settings_panel_blocks_other_keys_and_shows_config() {
        let handle = start(TimerConfig::default());
        load(&handle, 2).await.expect("loaded");

        key(&handle, "s").await;
        let p = projection(&handle);
        assert!(p.settings.open);
        assert_eq!(p.settings.config, Some(TimerConfig::default()));
        assert_eq!(key(&handle, " ").await.outcome, KeyOutcome::Suppressed);

        key(&handle, "S").await;
        assert!(!projection(&handle).settings.open);
    }

    #[tokio::test(start_paused = true)]
    async fn drag_overlay_drops_on_upload() {
        let handle = start(TimerConfig::default());

        assert!(send(&handle, |reply| Command::Drag { event: DragEvent::Over, reply }).await);
        assert!(projection(&handle).drag_overlay);
        load(&handle, 1).await.expect("loaded");
        assert!(!projection(&handle).drag_overlay);
    }
}
