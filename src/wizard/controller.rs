use tracing::{debug, error, info, warn};

use super::ach::select_account;
use super::session::{IndicatorState, NotificationLevel, ViewState, WizardSession};
use super::controls::ControlStateEngine;
use super::step::{Control, NavigationControls, StepDefinition, StepRule, Transition};
use super::StepContext;
use crate::config::PortalConfig;
use crate::errors::{PortalError, Result};
use crate::model::{AccountSelection, FormModel};
use crate::services::{Services, SubmitResult};

const SUBMISSION_FAILED: &str = "Your payment could not be submitted. Please try again.";
const DELETE_FAILED: &str = "The bank account could not be removed.";

/// Navigation requests accepted by [`WizardController::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Back,
    Finish,
    Clear,
    Cancel,
}

impl Command {
    fn control(self) -> Control {
        match self {
            Command::Next => Control::Next,
            Command::Back => Control::Back,
            Command::Finish => Control::Finish,
            Command::Clear => Control::Clear,
            Command::Cancel => Control::Cancel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    NotStarted,
    /// The triggering control is hidden or disabled.
    ControlUnavailable(Control),
    NoTargetStep,
    NotFinishStep,
    TermsNotAccepted,
    /// The amount or bank account no longer passes its step's rule.
    IncompletePayment(StepRule),
    RequestPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Moved { from: u8, to: u8 },
    Cleared { step: u8 },
    Finished { transaction_id: Option<String> },
    NotSubmitted { reason: String },
    Exited { url: String },
    Blocked { command: Command, reason: BlockReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(i64),
    Rejected,
    Failed,
    NotRequested,
    Busy,
}

/// Presentation settings the controller applies on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WizardOptions {
    pub page_title_suffix: String,
    pub cancel_url: String,
}

impl WizardOptions {
    pub fn from_config(config: &PortalConfig, submission_id: i64) -> Self {
        Self {
            page_title_suffix: config.page_title_suffix.clone(),
            cancel_url: config.cancel_url(submission_id),
        }
    }
}

/// Finite-state machine over an ordered, contiguous list of steps. The last
/// step is the terminal confirmation page reached only through `finish`.
pub struct WizardController {
    steps: Vec<StepDefinition>,
    ctx: StepContext,
    services: Services,
    options: WizardOptions,
}

impl WizardController {
    pub fn new(
        mut steps: Vec<StepDefinition>,
        model: FormModel,
        services: Services,
        options: WizardOptions,
    ) -> Result<Self> {
        if steps.is_empty() {
            return Err(PortalError::InvalidStepLayout("no steps defined".into()));
        }
        if steps.len() > usize::from(u8::MAX) {
            return Err(PortalError::InvalidStepLayout(format!(
                "{} steps exceed the supported maximum",
                steps.len()
            )));
        }
        steps.sort_by_key(|step| step.index);
        for (position, step) in steps.iter().enumerate() {
            let expected = position + 1;
            if usize::from(step.index) != expected {
                return Err(PortalError::InvalidStepLayout(format!(
                    "expected step {} but found step {}",
                    expected, step.index
                )));
            }
        }

        Ok(Self {
            steps,
            ctx: StepContext::new(model),
            services,
            options,
        })
    }

    /// Loads step 1. Calling it again has no effect.
    pub fn start(&mut self) -> Result<()> {
        if self.ctx.session.is_started() {
            return Ok(());
        }
        for step in &self.steps {
            self.ctx.view.set_indicator(step.index, IndicatorState::Normal);
        }
        self.transition(None, 1)
    }

    pub fn context(&self) -> &StepContext {
        &self.ctx
    }

    pub(crate) fn context_mut(&mut self) -> &mut StepContext {
        &mut self.ctx
    }

    pub fn model(&self) -> &FormModel {
        &self.ctx.model
    }

    pub fn view(&self) -> &ViewState {
        &self.ctx.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.ctx.view
    }

    pub fn controls(&self) -> &NavigationControls {
        &self.ctx.controls
    }

    pub fn session(&self) -> WizardSession {
        self.ctx.session
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, index: u8) -> Result<&StepDefinition> {
        index
            .checked_sub(1)
            .and_then(|position| self.steps.get(usize::from(position)))
            .ok_or(PortalError::UnknownStep(index))
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.step(self.ctx.session.current).ok()
    }

    pub fn terminal_index(&self) -> u8 {
        // `new` caps the step count at u8::MAX.
        self.steps.len() as u8
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<DispatchOutcome> {
        if !self.ctx.session.is_started() {
            return Ok(blocked(command, BlockReason::NotStarted));
        }
        if !self.ctx.controls.is_active(command.control()) {
            debug!(?command, step = self.ctx.session.current, "command blocked by control state");
            return Ok(blocked(command, BlockReason::ControlUnavailable(command.control())));
        }

        match command {
            Command::Next => self.change_step(true),
            Command::Back => self.change_step(false),
            Command::Clear => self.clear(),
            Command::Cancel => Ok(self.cancel()),
            Command::Finish => self.finish().await,
        }
    }

    /// Re-runs control gating for the active step.
    pub fn refresh_controls(&mut self) {
        self.ctx.refresh_controls();
    }

    fn change_step(&mut self, forward: bool) -> Result<DispatchOutcome> {
        let command = if forward { Command::Next } else { Command::Back };
        let from = self.ctx.session.current;
        let target = if forward {
            from.checked_add(1).filter(|to| *to < self.terminal_index())
        } else {
            from.checked_sub(1).filter(|to| *to >= 1)
        };
        let Some(to) = target else {
            return Ok(blocked(command, BlockReason::NoTargetStep));
        };

        self.transition(Some(from), to)?;
        Ok(DispatchOutcome::Moved { from, to })
    }

    fn clear(&mut self) -> Result<DispatchOutcome> {
        let step = self.ctx.session.current;
        let hook = self.step(step)?.hooks.clear.clone();
        if let Some(clear) = hook {
            clear(&mut self.ctx);
        }
        debug!(step, "cleared step values");
        Ok(DispatchOutcome::Cleared { step })
    }

    fn cancel(&mut self) -> DispatchOutcome {
        let url = self.options.cancel_url.clone();
        info!(%url, step = self.ctx.session.current, "wizard cancelled");
        self.ctx.view.exit_url = Some(url.clone());
        DispatchOutcome::Exited { url }
    }

    async fn finish(&mut self) -> Result<DispatchOutcome> {
        let current = self.ctx.session.current;
        if current.checked_add(1) != Some(self.terminal_index()) {
            return Ok(blocked(Command::Finish, BlockReason::NotFinishStep));
        }
        if !self.ctx.model.terms_accepted {
            return Ok(blocked(Command::Finish, BlockReason::TermsNotAccepted));
        }
        // Field events may have changed earlier steps' data since they were left.
        for rule in [StepRule::AmountSelection, StepRule::BankInfo] {
            if ControlStateEngine::evaluate(&self.ctx.model, rule).next != Some(true) {
                warn!(?rule, "payment data no longer valid, finish blocked");
                return Ok(blocked(Command::Finish, BlockReason::IncompletePayment(rule)));
            }
        }
        let Some(guard) = self.ctx.view.loading.begin() else {
            return Ok(blocked(Command::Finish, BlockReason::RequestPending));
        };
        self.ctx.controls.enabled.finish = false;

        info!(
            submission_id = self.ctx.model.submission_id,
            amount = %self.ctx.model.draft_amount,
            "submitting payment"
        );
        let result = self.services.submitter.save(&self.ctx.model).await;
        drop(guard);

        match result {
            Ok(SubmitResult {
                success: true,
                updated_model,
            }) => {
                if let Some(model) = updated_model {
                    self.ctx.model = model;
                }
                let terminal = self.terminal_index();
                self.transition(Some(current), terminal)?;
                let transaction_id = self.ctx.model.transaction_id.clone();
                info!(?transaction_id, "payment submitted");
                Ok(DispatchOutcome::Finished { transaction_id })
            }
            Ok(_) => {
                warn!(submission_id = self.ctx.model.submission_id, "payment was not accepted");
                self.ctx.view.notify(NotificationLevel::Error, SUBMISSION_FAILED);
                self.ctx.refresh_controls();
                Ok(DispatchOutcome::NotSubmitted {
                    reason: "submission was not accepted".into(),
                })
            }
            Err(err) => {
                if err.is_transport() {
                    error!(error = %err, "payment submission failed");
                } else {
                    warn!(error = %err, "payment submission returned an unusable response");
                    self.ctx.view.notify(NotificationLevel::Error, SUBMISSION_FAILED);
                }
                self.ctx.refresh_controls();
                Ok(DispatchOutcome::NotSubmitted {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Runs the transition protocol from `from` to `to`.
    fn transition(&mut self, from: Option<u8>, to: u8) -> Result<()> {
        let target = self.step(to)?.clone();
        let change = Transition { from, to };
        debug!(?from, to, "changing step");

        if let Some(from_index) = from {
            let source = self.step(from_index)?.hooks.clone();
            if let Some(leave) = &source.leave {
                leave(&mut self.ctx, change);
            }
            if let Some(leave_set_state) = &source.leave_set_state {
                leave_set_state(&mut self.ctx);
            }
            let left = if change.is_forward() {
                IndicatorState::Visited
            } else {
                IndicatorState::Normal
            };
            self.ctx.view.set_indicator(from_index, left);
        }

        self.ctx.view.set_indicator(to, IndicatorState::Active);
        self.ctx.rule = target.rule;
        self.ctx.controls = target.base_controls();
        self.ctx.view.page_title = format!("{}{}", target.page_title, self.options.page_title_suffix);
        self.ctx.view.banner_text = target.banner_text.clone();
        if target.is_terminal() {
            self.ctx.view.lock_chrome_hidden();
        } else {
            self.ctx.view.show_chrome();
        }

        if let Some(enter) = &target.hooks.enter {
            enter(&mut self.ctx, change);
        }
        if let Some(enter_set_state) = &target.hooks.enter_set_state {
            enter_set_state(&mut self.ctx);
        }

        self.ctx.session.commit(from, to);
        Ok(())
    }

    /// Opens the delete confirmation when a saved account is selected.
    pub fn request_delete_account(&mut self) -> bool {
        let open = matches!(self.ctx.model.selection(), AccountSelection::Saved(_));
        self.ctx.view.delete_modal_open = open;
        open
    }

    pub fn cancel_delete_account(&mut self) {
        self.ctx.view.delete_modal_open = false;
    }

    pub async fn confirm_delete_account(&mut self) -> Result<DeleteOutcome> {
        if !self.ctx.view.delete_modal_open {
            return Ok(DeleteOutcome::NotRequested);
        }
        self.ctx.view.delete_modal_open = false;

        let AccountSelection::Saved(id) = self.ctx.model.selection() else {
            return Ok(DeleteOutcome::NotRequested);
        };
        let ach = &self.ctx.model.ach_information;
        let account = ach
            .saved_account(id)
            .map(|saved| saved.overlay(&ach.default_bank_account))
            .ok_or(PortalError::UnknownAccount(id))?;

        let Some(guard) = self.ctx.view.loading.begin() else {
            return Ok(DeleteOutcome::Busy);
        };
        info!(account_id = id, "deleting saved bank account");
        let result = self.services.deleter.delete(&account).await;
        drop(guard);

        match result {
            Ok(true) => {
                self.ctx.model.ach_information.remove_saved_account(id);
                select_account(&mut self.ctx, AccountSelection::NONE_CHOSEN_ID);
                info!(account_id = id, "saved bank account removed");
                Ok(DeleteOutcome::Deleted(id))
            }
            Ok(false) => {
                warn!(account_id = id, "bank account removal was rejected");
                self.ctx.view.notify(NotificationLevel::Error, DELETE_FAILED);
                Ok(DeleteOutcome::Rejected)
            }
            Err(err) => {
                if err.is_transport() {
                    error!(error = %err, account_id = id, "bank account removal failed");
                } else {
                    warn!(error = %err, account_id = id, "bank account removal failed");
                    self.ctx.view.notify(NotificationLevel::Error, DELETE_FAILED);
                }
                Ok(DeleteOutcome::Failed)
            }
        }
    }
}

fn blocked(command: Command, reason: BlockReason) -> DispatchOutcome {
    DispatchOutcome::Blocked { command, reason }
}
