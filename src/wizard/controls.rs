use super::session::ViewState;
use super::step::{NavigationControls, StepRule};
use super::validation::{self, MessageKey};
use crate::model::{AccountSelection, FormModel};

/// Control decisions for one step. `None` leaves a control untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gating {
    pub next: Option<bool>,
    pub finish: Option<bool>,
    pub messages: Vec<MessageKey>,
}

/// Derives navigation gating from the model and the active step's rule.
pub struct ControlStateEngine;

impl ControlStateEngine {
    pub fn evaluate(model: &FormModel, rule: StepRule) -> Gating {
        match rule {
            StepRule::AmountSelection => Self::amount_selection(model),
            StepRule::BankInfo => Self::bank_info(model),
            StepRule::Verify => Gating {
                finish: Some(model.terms_accepted),
                ..Gating::default()
            },
            StepRule::Terminal => Gating::default(),
        }
    }

    pub fn apply(gating: &Gating, controls: &mut NavigationControls, view: &mut ViewState) {
        if let Some(next) = gating.next {
            controls.enabled.next = next;
        }
        if let Some(finish) = gating.finish {
            controls.enabled.finish = finish;
        }
        view.validation_messages = gating.messages.clone();
    }

    fn amount_selection(model: &FormModel) -> Gating {
        let outcome = validation::amount_not_positive(model.effective_total());
        Gating {
            next: Some(!outcome.invalid),
            finish: None,
            messages: outcome.message.into_iter().collect(),
        }
    }

    fn bank_info(model: &FormModel) -> Gating {
        let ach = &model.ach_information;
        match ach.selection() {
            AccountSelection::NoneChosen => Gating {
                next: Some(false),
                ..Gating::default()
            },
            AccountSelection::Saved(id) => Gating {
                next: Some(ach.saved_account(id).is_some()),
                ..Gating::default()
            },
            AccountSelection::EnterNew if ach.entry_is_empty() => Gating {
                next: Some(false),
                ..Gating::default()
            },
            AccountSelection::EnterNew => {
                let outcomes = [
                    validation::routing_number_invalid(&ach.routing_number, &ach.routing_number_confirm),
                    validation::account_number_invalid(
                        &ach.bank_account_number,
                        &ach.bank_account_number_confirm,
                    ),
                    validation::bank_name_missing(&ach.bank_name),
                    validation::duplicate_nickname(&ach.bank_account_name, &ach.saved_bank_accounts),
                ];
                Gating {
                    next: Some(outcomes.iter().all(|outcome| !outcome.invalid)),
                    finish: None,
                    messages: outcomes.iter().filter_map(|outcome| outcome.message).collect(),
                }
            }
        }
    }
}
