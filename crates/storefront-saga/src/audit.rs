use std::time::{Duration, Instant};

/// Lifecycle of one saga invocation.
///
/// `Pending -> Running -> Succeeded` on success and
/// `Pending -> Running -> RollingBack -> Failed` once anything goes wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Pending,
    Running,
    Succeeded,
    RollingBack,
    Failed,
}

impl SagaState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Where a single step ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// `execute` returned `Ok`, and the step was not undone.
    Executed,
    /// `execute` returned an error.
    Failed,
    /// The step's effect was undone.
    Compensated,
    /// Undoing the step's effect failed; the effect may still be in place.
    CompensationFailed,
}

impl StepStatus {
    fn marker(self) -> &'static str {
        match self {
            Self::Executed => "ok",
            Self::Failed => "failed",
            Self::Compensated => "undone",
            Self::CompensationFailed => "undo failed",
        }
    }
}

/// One step of one invocation.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Position of the step in the saga.
    pub index: usize,
    pub name: &'static str,
    pub status: StepStatus,
    pub started_at: Instant,
    /// Set when `execute` returns, and moved forward again by compensation.
    pub completed_at: Option<Instant>,
    /// `None` for steps without a compensation.
    pub compensation_description: Option<String>,
}

impl StepRecord {
    /// Time between the step starting and its last status change.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.completed_at
            .map(|finished| finished.duration_since(self.started_at))
    }
}

/// Per-invocation trail of step outcomes and lifecycle states.
#[derive(Debug)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
    states: Vec<SagaState>,
}

impl Default for SagaAuditLog {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            states: vec![SagaState::Pending],
        }
    }
}

impl SagaAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn transition(&mut self, state: SagaState) {
        if self.state() != state {
            self.states.push(state);
        }
    }

    pub(crate) fn step_started(&mut self, index: usize, name: &'static str) {
        self.records.push(StepRecord {
            index,
            name,
            status: StepStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
            compensation_description: None,
        });
    }

    pub(crate) fn step_executed(&mut self, index: usize, compensation_description: Option<String>) {
        if let Some(record) = self.finish(index, StepStatus::Executed) {
            record.compensation_description = compensation_description;
        }
    }

    pub(crate) fn step_failed(&mut self, index: usize) {
        self.finish(index, StepStatus::Failed);
    }

    pub(crate) fn step_compensated(&mut self, index: usize, succeeded: bool) {
        let status = if succeeded {
            StepStatus::Compensated
        } else {
            StepStatus::CompensationFailed
        };
        self.finish(index, status);
    }

    fn finish(&mut self, index: usize, status: StepStatus) -> Option<&mut StepRecord> {
        let record = self.records.iter_mut().rev().find(|r| r.index == index)?;
        record.status = status;
        record.completed_at = Some(Instant::now());
        Some(record)
    }

    /// Step records in the order the steps started.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Names of the steps that ended in `status`.
    #[must_use]
    pub fn steps_with_status(&self, status: StepStatus) -> Vec<&'static str> {
        self.records
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.name)
            .collect()
    }

    #[must_use]
    pub fn state(&self) -> SagaState {
        self.states.last().copied().unwrap_or(SagaState::Pending)
    }

    /// Every state passed through, starting with `Pending`.
    #[must_use]
    pub fn state_history(&self) -> &[SagaState] {
        &self.states
    }

    /// One `name: status` line per step.
    #[must_use]
    pub fn summary(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("{}: {}", r.name, r.status.marker()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
