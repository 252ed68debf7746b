use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use spinlab::engine::progress::{Progress, ProgressCallback};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::warn;

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

pub struct UiManager {
    mp: Arc<MultiProgress>,
    state: BarState,
    event_receiver: mpsc::Receiver<UiEvent>,
    shutdown_receiver: watch::Receiver<bool>,
    _sentinel_bar: ProgressBar,
}

#[derive(Default)]
struct BarState {
    active_bar: Option<ProgressBar>,
    duration: f64,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, event_receiver) = mpsc::channel(1024);
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        let mp = Arc::new(MultiProgress::new());
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        let _sentinel_bar = mp.add(ProgressBar::hidden());
        let manager = Self {
            mp,
            state: BarState::default(),
            event_receiver,
            shutdown_receiver,
            _sentinel_bar,
        };

        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.event_receiver.recv() => {
                    self.handle_event(event);
                }
                result = self.shutdown_receiver.changed() => {
                    if result.is_err() || *self.shutdown_receiver.borrow() {
                        break;
                    }
                }
            }
        }
        while let Ok(event) = self.event_receiver.try_recv() {
            self.handle_event(event);
        }
        self._sentinel_bar.finish_and_clear();
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => {
                self.mp.println(msg).ok();
            }
            UiEvent::Progress(progress) => self.handle_progress(progress),
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::RunStart {
                total_frames,
                duration,
            } => {
                if let Some(bar) = self.state.active_bar.take() {
                    bar.finish_and_clear();
                }
                let pb = self.mp.add(ProgressBar::new(total_frames));
                pb.set_style(Self::bar_style());
                pb.set_message(format!("Simulating {:.1}s", duration));
                self.state.active_bar = Some(pb);
                self.state.duration = duration;
            }
            Progress::FramesAdvanced { frames } => {
                if let Some(bar) = self.state.active_bar.as_ref() {
                    bar.inc(frames);
                }
            }
            Progress::RunFinish => {
                if let Some(bar) = self.state.active_bar.take() {
                    bar.finish_and_clear();
                }
                self.mp
                    .println(format!("✓ Simulated {:.1}s", self.state.duration))
                    .ok();
            }
            Progress::EventApplied { at, description } => {
                self.mp
                    .println(format!("  t={:.2}s: {}", at, description))
                    .ok();
            }
            Progress::PhaseChanged { to, .. } => {
                if let Some(bar) = self.state.active_bar.as_ref() {
                    bar.set_message(format!("Simulating [{}]", to));
                }
            }
            Progress::Status { text } => {
                if let Some(bar) = self.state.active_bar.as_ref() {
                    bar.set_message(text);
                }
            }
            Progress::Message(msg) => {
                self.mp.println(format!("  {}", msg)).ok();
            }
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<45} [{bar:30.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("━╸ ")
    }
}

#[derive(Clone)]
pub struct CliProgressHandler {
    sender: mpsc::Sender<UiEvent>,
}

impl CliProgressHandler {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                warn!("Failed to send progress update to UI channel: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinlab::engine::state::Phase;

    fn setup_manager() -> (UiManager, mpsc::Sender<UiEvent>) {
        let (manager, sender, _) = UiManager::new();
        manager.mp.set_draw_target(ProgressDrawTarget::hidden());
        (manager, sender)
    }

    fn start_run(manager: &mut UiManager, total_frames: u64) {
        manager.handle_event(UiEvent::Progress(Progress::RunStart {
            total_frames,
            duration: 2.0,
        }));
    }

    #[test]
    fn run_start_creates_sized_bar() {
        let (mut manager, _) = setup_manager();
        assert!(manager.state.active_bar.is_none());

        start_run(&mut manager, 120);

        let bar = manager.state.active_bar.as_ref().unwrap();
        assert_eq!(bar.length(), Some(120));
        assert_eq!(bar.position(), 0);
        assert_eq!(bar.message(), "Simulating 2.0s");
    }

    #[test]
    fn frames_advance_bar_position() {
        let (mut manager, _) = setup_manager();
        start_run(&mut manager, 120);

        manager.handle_event(UiEvent::Progress(Progress::FramesAdvanced { frames: 12 }));
        manager.handle_event(UiEvent::Progress(Progress::FramesAdvanced { frames: 3 }));

        assert_eq!(manager.state.active_bar.as_ref().unwrap().position(), 15);
    }

    #[test]
    fn phase_and_status_update_message() {
        let (mut manager, _) = setup_manager();
        start_run(&mut manager, 10);

        manager.handle_event(UiEvent::Progress(Progress::PhaseChanged {
            from: Phase::Idle,
            to: Phase::Pulsing,
        }));
        assert_eq!(
            manager.state.active_bar.as_ref().unwrap().message(),
            "Simulating [pulsing]"
        );

        manager.handle_event(UiEvent::Progress(Progress::Status {
            text: "t=1.00s idle".into(),
        }));
        assert_eq!(
            manager.state.active_bar.as_ref().unwrap().message(),
            "t=1.00s idle"
        );
    }

    #[test]
    fn run_finish_clears_active_bar() {
        let (mut manager, _) = setup_manager();
        start_run(&mut manager, 10);

        manager.handle_event(UiEvent::Progress(Progress::RunFinish));

        assert!(manager.state.active_bar.is_none());
    }

    #[test]
    fn events_without_bar_are_ignored() {
        let (mut manager, _) = setup_manager();
        manager.handle_event(UiEvent::Progress(Progress::FramesAdvanced { frames: 1 }));
        manager.handle_event(UiEvent::Progress(Progress::EventApplied {
            at: 0.5,
            description: "pulse 90°".into(),
        }));
        manager.handle_event(UiEvent::Log("Test log message".to_string()));
        assert!(manager.state.active_bar.is_none());
    }

    #[tokio::test]
    async fn cli_progress_handler_sends_progress_event() {
        let (sender, mut receiver) = mpsc::channel(1);
        let handler = CliProgressHandler::new(sender);
        let callback = handler.get_callback();

        callback(Progress::FramesAdvanced { frames: 4 });

        let event = receiver.recv().await.unwrap();
        let UiEvent::Progress(Progress::FramesAdvanced { frames }) = event else {
            panic!("Incorrect event received");
        };
        assert_eq!(frames, 4);
    }

    #[tokio::test]
    async fn manager_exits_on_shutdown_signal() {
        let (manager, sender, shutdown) = UiManager::new();
        manager.mp.set_draw_target(ProgressDrawTarget::hidden());
        let handle = tokio::spawn(manager.run());

        sender
            .send(UiEvent::Progress(Progress::Message("hello".into())))
            .await
            .unwrap();
        shutdown.send(true).unwrap();

        handle.await.unwrap();
    }
}
