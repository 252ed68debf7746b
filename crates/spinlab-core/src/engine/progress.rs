use super::state::Phase;

/// Events emitted while a protocol run advances, for front ends that show progress.
#[derive(Debug, Clone)]
pub enum Progress {
    RunStart { total_frames: u64, duration: f64 },
    FramesAdvanced { frames: u64 },
    RunFinish,

    EventApplied { at: f64, description: String },
    PhaseChanged { from: Phase, to: Phase },
    Status { text: String },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn is_silent(&self) -> bool {
        self.callback.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn silent_reporter_swallows_events() {
        let reporter = ProgressReporter::new();
        assert!(reporter.is_silent());
        reporter.report(Progress::RunFinish);
    }

    #[test]
    fn callback_receives_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let tag = match event {
                Progress::RunStart { .. } => "start",
                Progress::FramesAdvanced { .. } => "frames",
                Progress::RunFinish => "finish",
                _ => "other",
            };
            seen.lock().unwrap().push(tag);
        }));
        reporter.report(Progress::RunStart {
            total_frames: 10,
            duration: 1.0,
        });
        reporter.report(Progress::FramesAdvanced { frames: 10 });
        reporter.report(Progress::RunFinish);
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), vec!["start", "frames", "finish"]);
    }
}
