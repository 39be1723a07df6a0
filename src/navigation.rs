//! Wizard navigation
//!
//! The fixed sequence of wizard steps and the controller that moves between
//! them. A transition runs in two timed phases (exit, then settle) and
//! while it runs every other navigation request is dropped.

use crate::config::WizardConfig;
use crate::selection::ExperimentSelection;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Step of the experiment wizard, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    Intro,
    SystemSelection,
    SystemDetail,
    Configuration,
    Results,
    Publishing,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::Intro,
        WizardStep::SystemSelection,
        WizardStep::SystemDetail,
        WizardStep::Configuration,
        WizardStep::Results,
        WizardStep::Publishing,
    ];

    pub fn index(&self) -> usize {
        match self {
            Self::Intro => 0,
            Self::SystemSelection => 1,
            Self::SystemDetail => 2,
            Self::Configuration => 3,
            Self::Results => 4,
            Self::Publishing => 5,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::SystemSelection => "system-selection",
            Self::SystemDetail => "system-detail",
            Self::Configuration => "configuration",
            Self::Results => "results",
            Self::Publishing => "publishing",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.id() == id)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Intro => "Welcome",
            Self::SystemSelection => "Select System",
            Self::SystemDetail => "Basis Set & Experiment",
            Self::Configuration => "Algorithm Configuration",
            Self::Results => "Results",
            Self::Publishing => "Publish",
        }
    }

    pub fn total_steps() -> usize {
        Self::ALL.len()
    }

    /// Next step; the last step wraps around to the first
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous step; the first step stays put
    pub fn previous(&self) -> Self {
        Self::ALL[self.index().saturating_sub(1)]
    }

    /// Selection fields this step needs before "next" is enabled
    pub fn missing_requirements(&self, selection: &ExperimentSelection) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            Self::SystemSelection => {
                if selection.system_id.trim().is_empty() {
                    missing.push("system_id");
                }
            }
            Self::SystemDetail => {
                if selection.system_id.trim().is_empty() {
                    missing.push("system_id");
                }
                if selection.basis_set.trim().is_empty() {
                    missing.push("basis_set");
                }
                if selection.experiment_type.trim().is_empty() {
                    missing.push("experiment_type");
                }
            }
            Self::Configuration => missing.extend(selection.missing_config()),
            Self::Intro | Self::Results | Self::Publishing => {}
        }
        missing
    }

    pub fn can_advance(&self, selection: &ExperimentSelection) -> bool {
        self.missing_requirements(selection).is_empty()
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Forward when `to` is at or after `from`; navigating to the current
    /// step counts as forward
    pub fn between(from: WizardStep, to: WizardStep) -> Self {
        if to.index() >= from.index() {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub current_step: WizardStep,
    pub previous_step: Option<WizardStep>,
    pub direction: Direction,
    pub is_transitioning: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::Intro,
            previous_step: None,
            direction: Direction::Forward,
            is_transitioning: false,
        }
    }
}

/// Delays of the two transition phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTimings {
    pub exit: Duration,
    pub settle: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            exit: Duration::from_millis(300),
            settle: Duration::from_millis(300),
        }
    }
}

impl TransitionTimings {
    pub fn immediate() -> Self {
        Self {
            exit: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

impl From<&WizardConfig> for TransitionTimings {
    fn from(config: &WizardConfig) -> Self {
        Self {
            exit: config.exit_delay(),
            settle: config.settle_delay(),
        }
    }
}

struct PendingTransition {
    target: WizardStep,
    task: JoinHandle<()>,
}

/// Moves the wizard between steps.
///
/// Must be used from within a tokio runtime. Dropping the controller
/// cancels a pending transition and completes it immediately.
pub struct NavigationController {
    state: Arc<watch::Sender<NavigationState>>,
    timings: TransitionTimings,
    pending: Mutex<Option<PendingTransition>>,
}

impl NavigationController {
    pub fn new(timings: TransitionTimings) -> Self {
        let (state, _) = watch::channel(NavigationState::default());
        Self {
            state: Arc::new(state),
            timings,
            pending: Mutex::new(None),
        }
    }

    pub fn state(&self) -> NavigationState {
        *self.state.borrow()
    }

    pub fn current(&self) -> WizardStep {
        self.state.borrow().current_step
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.borrow().is_transitioning
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.state.subscribe()
    }

    /// Start a transition to `target`.
    ///
    /// Returns false, changing nothing, while another transition is in
    /// progress.
    pub fn navigate_to(&self, target: WizardStep) -> bool {
        let accepted = self.state.send_if_modified(|state| {
            if state.is_transitioning {
                return false;
            }
            state.previous_step = Some(state.current_step);
            state.direction = Direction::between(state.current_step, target);
            state.is_transitioning = true;
            true
        });

        if !accepted {
            debug!(step = %target, "Navigation ignored, transition in progress");
            return false;
        }

        let state = self.state.clone();
        let timings = self.timings;
        let task = tokio::spawn(async move {
            tokio::time::sleep(timings.exit).await;
            state.send_modify(|s| s.current_step = target);
            tokio::time::sleep(timings.settle).await;
            state.send_modify(|s| s.is_transitioning = false);
        });

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            // Already finished, otherwise the guard would have rejected us
            previous.task.abort();
        }
        *pending = Some(PendingTransition { target, task });
        true
    }

    /// Navigate by step id. Unknown ids are logged and ignored.
    pub fn navigate_to_id(&self, id: &str) -> bool {
        match WizardStep::from_id(id) {
            Some(step) => self.navigate_to(step),
            None => {
                warn!(id = id, "Ignoring navigation to unknown step");
                false
            }
        }
    }

    /// Go to the next step (wrapping from the last to the first)
    pub fn advance(&self) -> bool {
        self.navigate_to(self.current().next())
    }

    /// Go to the previous step
    pub fn retreat(&self) -> bool {
        self.navigate_to(self.current().previous())
    }

    /// Resolve once no transition is in progress
    pub async fn wait_until_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|s| !s.is_transitioning).await;
    }

    /// Cancel a pending transition and complete it at once
    pub fn shutdown(&self) {
        let Some(pending) = self.pending.lock().take() else {
            return;
        };
        pending.task.abort();
        self.state.send_if_modified(|s| {
            if !s.is_transitioning {
                return false;
            }
            s.current_step = pending.target;
            s.is_transitioning = false;
            true
        });
    }
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(TransitionTimings::default())
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
