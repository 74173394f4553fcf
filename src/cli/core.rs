//! Shell context, error types, and the rendering helpers shared by the
//! command handlers.

use std::{io, path::Path};

use thiserror::Error;
use tokio::runtime::{Builder, Runtime};

use super::output;
use super::registry::{CommandEntry, CommandRegistry};
use crate::config::ConfigManager;
use crate::errors::PortalError;
use crate::utils::persistence::load_model_from_file;
use crate::wizard::{
    ach, BlockReason, Control, DeleteOutcome, DispatchOutcome, NotificationLevel, StepRule,
    WizardController,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Portal(#[from] PortalError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Portal(#[from] PortalError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub wizard: WizardController,
    pub runtime: Runtime,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode, snapshot: &Path) -> Result<Self, CliError> {
        let config = ConfigManager::new()?.load()?;
        let model = load_model_from_file(snapshot)?;
        let wizard = ach::http_payment_wizard(model, &config)?;
        let runtime = Builder::new_current_thread().enable_all().build()?;
        tracing::info!(snapshot = %snapshot.display(), base_url = %config.base_url, "shell ready");

        Ok(Self {
            mode,
            registry: CommandRegistry::new(super::handlers::definitions()),
            wizard,
            runtime,
            last_command: None,
            running: true,
        })
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|entry| entry.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        let result = handler(self, args);
        self.flush_notifications();
        match result {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        let session = self.wizard.session();
        format!("payment[{}/{}]> ", session.current, self.wizard.terminal_index())
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        let best = self
            .registry
            .names()
            .map(|name| (strsim::levenshtein(name, input), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Portal(err) => {
                output::error(err);
                Ok(())
            }
        }
    }

    /// Prints and clears the wizard's pending notifications.
    pub fn flush_notifications(&mut self) {
        for notification in self.wizard.view_mut().take_notifications() {
            match notification.level {
                NotificationLevel::Info => output::info(&notification.text),
                NotificationLevel::Success => output::success(&notification.text),
                NotificationLevel::Warning => output::warning(&notification.text),
                NotificationLevel::Error => output::error(&notification.text),
            }
        }
    }

    pub fn print_status(&self) {
        let wizard = &self.wizard;
        let view = wizard.view();
        let model = wizard.model();
        let session = wizard.session();
        let title = wizard
            .current_step()
            .map(|step| step.title.as_str())
            .unwrap_or("not started");

        output::section(format!(
            "Step {} of {}: {}",
            session.current,
            wizard.terminal_index(),
            title
        ));
        output::detail(format!("Page        : {}", view.page_title));
        output::detail(format!("Pay mode    : {:?}", model.how_to_pay));
        output::detail(format!("Total due   : {}", model.total_due.format(true)));
        output::detail(format!("Draft amount: {}", model.draft_amount.format(true)));
        for line in &model.policy_payments {
            output::detail(format!(
                "Policy {:<6}: due {} / paying {}",
                line.policy_id,
                line.amount_due.format(true),
                line.payment_amount.format(true)
            ));
        }
        let ach = &model.ach_information;
        output::detail(format!("Selection   : {:?}", ach.selection()));
        for account in &ach.saved_bank_accounts {
            output::detail(format!(
                "Saved #{:<5}: {} ({})",
                account.bank_account_info_id, account.bank_account_name, account.account_type
            ));
        }
        if !ach.bank_account_name.is_empty() {
            output::detail(format!("Nickname    : {}", ach.bank_account_name));
        }
        output::detail(format!("Terms       : {}", if model.terms_accepted { "accepted" } else { "not accepted" }));
        output::detail(format!("Controls    : {}", render_controls(wizard)));
        for message in &view.validation_messages {
            output::warning(message.text());
        }
        for (field, message) in &view.field_messages {
            output::warning(format!("{}: {}", field.name(), message.text()));
        }
    }
}

fn render_controls(wizard: &WizardController) -> String {
    let controls = wizard.controls();
    let rendered: Vec<String> = Control::ALL
        .into_iter()
        .filter(|control| controls.shown.get(*control))
        .map(|control| {
            if controls.enabled.get(control) {
                control.label().to_string()
            } else {
                format!("{}(disabled)", control.label())
            }
        })
        .collect();
    if rendered.is_empty() {
        "none".into()
    } else {
        rendered.join(" ")
    }
}

pub(crate) fn describe_block(reason: BlockReason) -> String {
    match reason {
        BlockReason::NotStarted => "the wizard has not started".into(),
        BlockReason::ControlUnavailable(control) => {
            format!("`{}` is not available on this step", control.label())
        }
        BlockReason::NoTargetStep => "there is no step in that direction".into(),
        BlockReason::NotFinishStep => "payments can only be finished from the verify step".into(),
        BlockReason::TermsNotAccepted => "the terms must be accepted first".into(),
        BlockReason::IncompletePayment(StepRule::AmountSelection) => {
            "the payment amount must be greater than zero".into()
        }
        BlockReason::IncompletePayment(_) => "a valid bank account must be selected".into(),
        BlockReason::RequestPending => "a request is already in progress".into(),
    }
}

/// Prints a dispatch outcome; returns true when the wizard was exited.
pub(crate) fn report_outcome(wizard: &WizardController, outcome: &DispatchOutcome) -> bool {
    match outcome {
        DispatchOutcome::Moved { to, .. } => {
            let title = wizard
                .step(*to)
                .map(|step| step.title.clone())
                .unwrap_or_default();
            output::success(format!("Moved to step {}: {}", to, title));
        }
        DispatchOutcome::Cleared { step } => output::info(format!("Cleared step {}", step)),
        DispatchOutcome::Finished { transaction_id } => {
            output::success("Payment submitted.");
            if let Some(id) = transaction_id {
                output::detail(format!("Transaction: {}", id));
            }
        }
        DispatchOutcome::NotSubmitted { reason } => {
            output::error(format!("Payment was not submitted: {}", reason));
        }
        DispatchOutcome::Exited { url } => {
            output::info(format!("Leaving payment wizard for {}", url));
            return true;
        }
        DispatchOutcome::Blocked { reason, .. } => {
            output::warning(format!("Blocked: {}", describe_block(*reason)));
        }
    }
    false
}

pub(crate) fn report_delete(outcome: DeleteOutcome) {
    match outcome {
        DeleteOutcome::Deleted(id) => output::success(format!("Removed saved account {}", id)),
        DeleteOutcome::Rejected => output::warning("The portal kept the account."),
        DeleteOutcome::Failed => output::error("The account could not be removed."),
        DeleteOutcome::NotRequested => {
            output::warning("No removal pending. Select a saved account and run `delete` first.")
        }
        DeleteOutcome::Busy => output::warning("A request is already in progress."),
    }
}
