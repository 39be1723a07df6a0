//! Experiment wizard - interactive CLI
//!
//! Each step renders from the shared [`ExperimentStore`] and reports what
//! the user chose to do next. The loop applies that choice through the
//! [`NavigationController`], which ignores requests while a transition is
//! still settling.

mod steps;

use crate::print_banner;
use crate::style::*;
use anyhow::Result;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use quantum_lab::{
    ExperimentRun, ExperimentStore, HttpGateway, LabConfig, MockLedger, NavigationController,
    WizardStep,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// What a step asks the wizard to do once it has been rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Next,
    Back,
    Stay,
    Goto(WizardStep),
    Quit,
}

/// State the steps share beyond the store itself
pub struct Session<'a> {
    pub config: &'a LabConfig,
    pub store: Arc<ExperimentStore>,
    pub ledger: MockLedger,
    /// Run currently on screen; may be a placeholder that never entered history
    pub shown_run: Option<ExperimentRun>,
    /// Runs accepted by the ledger, in publish order
    pub published: Vec<ExperimentRun>,
}

pub async fn run_wizard(config: &LabConfig) -> Result<()> {
    let term = Term::stdout();
    term.clear_screen()?;

    print_banner();
    println!(
        "{}",
        style("  Quantum Chemistry Experiment Wizard").cyan().bold()
    );
    println!(
        "  {}",
        style("Configure, run and publish simulated experiments").dim()
    );

    let gateway = Arc::new(HttpGateway::new(&config.api)?);
    let loading = spinner("Loading catalog...");
    let store = ExperimentStore::open(gateway, config.defaults.clone()).await;
    loading.finish_and_clear();

    let nav = NavigationController::new((&config.wizard).into());
    let mut session = Session {
        config,
        store,
        ledger: MockLedger::default(),
        shown_run: None,
        published: Vec::new(),
    };

    loop {
        let step = nav.current();
        print_step_banner(step);

        let action = match step {
            WizardStep::Intro => steps::intro()?,
            WizardStep::SystemSelection => steps::system_selection(&session).await?,
            WizardStep::SystemDetail => steps::system_detail(&session)?,
            WizardStep::Configuration => steps::configuration(&session)?,
            WizardStep::Results => steps::results(&mut session).await?,
            WizardStep::Publishing => steps::publishing(&mut session)?,
        };
        debug!(step = %step, ?action, "Step finished");

        let moved = match action {
            StepAction::Next => {
                let missing = step.missing_requirements(&session.store.selection());
                if !missing.is_empty() {
                    print_warning(&format!("Still missing: {}", missing.join(", ")));
                    continue;
                }
                nav.advance()
            }
            StepAction::Back => nav.retreat(),
            StepAction::Goto(target) => nav.navigate_to(target),
            StepAction::Stay => continue,
            StepAction::Quit => break,
        };
        if moved {
            nav.wait_until_idle().await;
        }
    }

    nav.shutdown();

    let summary = session.store.snapshot();
    println!();
    print_info(&format!(
        "{} run(s) this session, {} published",
        summary.history.len(),
        session.ledger.receipts().len()
    ));
    if let Some(error) = summary.submission.error {
        print_warning(&format!("Last submission failed: {}", error));
    }
    Ok(())
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        bar.set_style(template);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
