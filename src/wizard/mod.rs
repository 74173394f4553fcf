//! Multi-step payment wizard: step definitions, the transition state
//! machine, control gating, and the ACH payment handler that plugs into it.

pub mod ach;
pub mod controller;
pub mod controls;
pub mod events;
pub mod session;
pub mod step;
pub mod validation;

pub use controller::{
    BlockReason, Command, DeleteOutcome, DispatchOutcome, WizardController, WizardOptions,
};
pub use controls::{ControlStateEngine, Gating};
pub use events::{EntryField, FieldEvent, PaymentHandler};
pub use session::{
    IndicatorState, Notification, NotificationLevel, Panels, ViewState, WizardSession,
};
pub use step::{
    Control, ControlFlags, NavigationControls, StepDefinition, StepHooks, StepRule, Transition,
};
pub use validation::{MessageKey, RuleOutcome};

use crate::model::FormModel;

/// State threaded through every hook: the model plus what the view shows.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub model: FormModel,
    pub controls: NavigationControls,
    pub view: ViewState,
    pub session: WizardSession,
    /// Rule of the step that currently owns the controls.
    pub rule: StepRule,
}

impl StepContext {
    pub fn new(model: FormModel) -> Self {
        Self {
            model,
            controls: NavigationControls::default(),
            view: ViewState::default(),
            session: WizardSession::default(),
            rule: StepRule::AmountSelection,
        }
    }

    /// Re-runs the control-state engine for the active step.
    pub fn refresh_controls(&mut self) {
        let gating = ControlStateEngine::evaluate(&self.model, self.rule);
        ControlStateEngine::apply(&gating, &mut self.controls, &mut self.view);
    }
}
