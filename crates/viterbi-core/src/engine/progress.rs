use std::fmt;

/// Pipeline stage, in the order the stages must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initialize,
    Schedule,
    CollectEvidence,
    DistributeDecisions,
    DistributeEvidence,
    StateRatios,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Initialize => "Initialize",
            Stage::Schedule => "Schedule",
            Stage::CollectEvidence => "Collect Evidence",
            Stage::DistributeDecisions => "Distribute Decisions",
            Stage::DistributeEvidence => "Distribute Evidence",
            Stage::StateRatios => "State Ratios",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub enum Progress {
    StageStart { stage: Stage },
    StageFinish { stage: Stage },

    BatchStart { total_queries: u64 },
    QueryFinished,
    BatchFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Optional sink for [`Progress`] events; a reporter without a callback drops them.
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

    /// Runs `f` bracketed by start and finish events for `stage`.
    ///
    /// The finish event is only sent when `f` succeeds.
    pub fn stage<T, E>(&self, stage: Stage, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.report(Progress::StageStart { stage });
        let value = f()?;
        self.report(Progress::StageFinish { stage });
        Ok(value)
    }
}
