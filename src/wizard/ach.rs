//! ACH payment flow: the four payment steps, their hooks, and the
//! [`PaymentHandler`] implementation the input layer drives.

use std::sync::Arc;

use tracing::{debug, warn};

use super::controller::{WizardController, WizardOptions};
use super::events::{EntryField, PaymentHandler};
use super::session::NotificationLevel;
use super::step::{ControlFlags, StepDefinition, StepRule, Transition};
use super::validation::{self, MessageKey};
use super::StepContext;
use crate::config::PortalConfig;
use crate::currency::{self, Amount};
use crate::errors::{PortalError, Result};
use crate::model::{
    synthesize_nickname, AccountSelection, AccountType, BankAccountInfo, FormModel, PayMode,
};
use crate::services::{HttpAccountDeleter, HttpPaymentSubmitter, Services};

pub const STEP_PAYMENT_AMOUNT: u8 = 1;
pub const STEP_BANK_INFO: u8 = 2;
pub const STEP_VERIFY: u8 = 3;
pub const STEP_THANK_YOU: u8 = 4;

pub fn payment_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(STEP_PAYMENT_AMOUNT, "Select Payment Amount", StepRule::AmountSelection)
            .with_page_title("Make Payment")
            .with_banner("Payment Amount")
            .with_controls(ControlFlags {
                cancel: true,
                clear: true,
                next: true,
                ..ControlFlags::NONE
            })
            .on_enter_set_state(|ctx| ctx.set_draft_amount())
            .on_leave(reconcile_payment_amounts)
            .on_leave_set_state(|ctx| ctx.set_ach_control_state())
            .on_clear(clear_payment_options),
        StepDefinition::new(STEP_BANK_INFO, "Enter Bank Information", StepRule::BankInfo)
            .with_page_title("ACH")
            .with_banner("Bank Account Information")
            .with_controls(ControlFlags {
                back: true,
                cancel: true,
                clear: true,
                next: true,
                finish: false,
            })
            .on_enter(|ctx, _| sync_account_panels(ctx))
            .on_enter_set_state(enter_bank_info_set_state)
            .on_leave(materialize_selected_account)
            .on_clear(clear_active_bank_account),
        StepDefinition::new(STEP_VERIFY, "Verify and Submit", StepRule::Verify)
            .with_page_title("Payment Verification")
            .with_banner("Verify Payment Information")
            .with_controls(ControlFlags {
                back: true,
                cancel: true,
                finish: true,
                ..ControlFlags::NONE
            })
            .with_enabled(ControlFlags {
                back: true,
                cancel: true,
                ..ControlFlags::NONE
            })
            .on_enter(|ctx, _| show_confirmed_draft(ctx))
            .on_enter_set_state(enter_verify_set_state),
        StepDefinition::new(STEP_THANK_YOU, "Thank You For Your Payment!", StepRule::Terminal)
            .with_page_title("Thank You")
            .on_enter_set_state(show_confirmed_draft),
    ]
}

/// Builds, initializes and starts the payment wizard.
pub fn payment_wizard(
    model: FormModel,
    services: Services,
    options: WizardOptions,
) -> Result<WizardController> {
    let mut controller = WizardController::new(payment_steps(), model, services, options)?;
    initialize(controller.context_mut());
    controller.start()?;
    Ok(controller)
}

/// Payment wizard wired to the portal's HTTP endpoints.
pub fn http_payment_wizard(model: FormModel, config: &PortalConfig) -> Result<WizardController> {
    let services = Services::new(
        Arc::new(HttpPaymentSubmitter::new(config)?),
        Arc::new(HttpAccountDeleter::new(config)?),
    );
    let options = WizardOptions::from_config(config, model.submission_id);
    payment_wizard(model, services, options)
}

/// Normalizes a freshly loaded snapshot before the first step is shown.
pub fn initialize(ctx: &mut StepContext) {
    let ach = &mut ctx.model.ach_information;
    ach.saved_bank_accounts
        .iter_mut()
        .for_each(BankAccountInfo::normalize_account_type);
    ach.account_type_id = AccountType::Checking.id();
    ach.account_type = AccountType::Checking.label().into();

    for line in &mut ctx.model.policy_payments {
        line.entered_amount = line.payment_amount.format(false);
    }
    ctx.view.panels.partial_amounts = ctx.model.how_to_pay == PayMode::Partial;
    ctx.view.terms_checked = ctx.model.terms_accepted;

    select_account(ctx, AccountSelection::NONE_CHOSEN_ID);
    ctx.set_draft_amount();
    debug!(
        accounts = ctx.model.ach_information.saved_bank_accounts.len(),
        policies = ctx.model.policy_payments.len(),
        "payment model initialized"
    );
}

/// Records the bank-account choice and toggles the matching panels.
pub fn select_account(ctx: &mut StepContext, id: i64) {
    let ach = &mut ctx.model.ach_information;
    let selection = match AccountSelection::from_id(id) {
        AccountSelection::Saved(saved_id) => {
            let merged = ach
                .saved_account(saved_id)
                .map(|saved| saved.overlay(&ach.default_bank_account));
            match merged {
                Some(record) => {
                    ach.selected_bank_account_info = record;
                    AccountSelection::Saved(saved_id)
                }
                None => {
                    warn!(account_id = saved_id, "selected bank account is not saved");
                    ach.selected_bank_account_info = ach.default_bank_account.clone();
                    AccountSelection::NoneChosen
                }
            }
        }
        other => {
            ach.selected_bank_account_info = ach.default_bank_account.clone();
            other
        }
    };
    ach.selected_bank_account_info_id = selection.id();

    sync_account_panels(ctx);
    ctx.set_ach_control_state();
}

fn sync_account_panels(ctx: &mut StepContext) {
    let selection = ctx.model.selection();
    ctx.view.panels.enter_new_account = selection == AccountSelection::EnterNew;
    ctx.view.panels.saved_account = matches!(selection, AccountSelection::Saved(_));
}

fn reconcile_payment_amounts(ctx: &mut StepContext, _change: Transition) {
    let pay_full = ctx.model.how_to_pay == PayMode::Full;
    for line in &mut ctx.model.policy_payments {
        if pay_full {
            line.payment_amount = line.amount_due;
        } else {
            line.payment_amount = Amount::parse_or_zero(&line.entered_amount);
            line.entered_amount = line.payment_amount.format(false);
        }
    }
    ctx.set_draft_amount();
}

fn clear_payment_options(ctx: &mut StepContext) {
    for line in &mut ctx.model.policy_payments {
        line.payment_amount = Amount::ZERO;
        line.entered_amount = Amount::ZERO.format(false);
    }
    ctx.set_draft_amount();
}

fn enter_bank_info_set_state(ctx: &mut StepContext) {
    ctx.set_ach_control_state();
    if ctx.model.selection() == AccountSelection::NoneChosen {
        ctx.controls.enabled.next = false;
    }
}

fn materialize_selected_account(ctx: &mut StepContext, change: Transition) {
    let insured_id = ctx.model.insured_id;
    let ach = &mut ctx.model.ach_information;
    match ach.selection() {
        AccountSelection::EnterNew => {
            let kind = ach.entry_account_type();
            let entered = BankAccountInfo {
                bank_account_info_id: 0,
                ach_information_id: 0,
                account_type: kind.label().into(),
                account_type_id: kind.id(),
                bank_account_type: Some(kind.id()),
                bank_account_name: ach.bank_account_name.clone(),
                bank_account_number: ach.bank_account_number.clone(),
                bank_name: ach.bank_name.clone(),
                insured_id,
                is_active: true,
                masked_account_number: currency::mask_number(&ach.bank_account_number),
                masked_routing_number: currency::mask_number(&ach.routing_number),
                routing_number: ach.routing_number.clone(),
            };
            ach.selected_bank_account_info = entered.overlay(&ach.default_bank_account);
        }
        AccountSelection::Saved(id) => {
            let merged = ach
                .saved_account(id)
                .map(|saved| saved.overlay(&ach.default_bank_account));
            if let Some(record) = merged {
                ach.selected_bank_account_info = record;
            }
        }
        AccountSelection::NoneChosen => {}
    }
    debug!(to = change.to, "bank account selection materialized");
    ctx.set_ach_control_state();
}

fn clear_active_bank_account(ctx: &mut StepContext) {
    ctx.model.ach_information.reset_entry();
    ctx.view.field_messages.clear();
    select_account(ctx, AccountSelection::NONE_CHOSEN_ID);
}

fn show_confirmed_draft(ctx: &mut StepContext) {
    ctx.view.confirmed_draft_amount = ctx.model.draft_amount.format(true);
}

fn enter_verify_set_state(ctx: &mut StepContext) {
    ctx.controls.shown.clear = false;
    ctx.view.terms_checked = ctx.model.terms_accepted;
    ctx.set_ach_control_state();
}

fn set_field_message(ctx: &mut StepContext, field: EntryField, message: Option<MessageKey>) {
    match message {
        Some(key) => {
            ctx.view.field_messages.insert(field, key);
        }
        None => {
            ctx.view.field_messages.remove(&field);
        }
    }
}

impl StepContext {
    fn flag_duplicate_nickname(&mut self) {
        let ach = &self.model.ach_information;
        if validation::is_duplicate_nickname(&ach.bank_account_name, &ach.saved_bank_accounts) {
            self.controls.enabled.next = false;
            self.view.notify(
                NotificationLevel::Error,
                MessageKey::DuplicateNickname.text(),
            );
        }
    }
}

impl PaymentHandler for StepContext {
    fn set_draft_amount(&mut self) {
        self.model.draft_amount = self.model.effective_total();
        show_confirmed_draft(self);
        self.refresh_controls();
    }

    fn set_ach_control_state(&mut self) {
        self.refresh_controls();
    }

    fn set_bank_account_nickname(&mut self) {
        let ach = &mut self.model.ach_information;
        ach.bank_account_name = synthesize_nickname(
            &ach.bank_name,
            ach.entry_account_type().label(),
            &ach.bank_account_number,
        );
        self.flag_duplicate_nickname();
    }

    fn set_pay_mode(&mut self, mode: PayMode) {
        self.model.how_to_pay = mode;
        self.view.panels.partial_amounts = mode == PayMode::Partial;
        if mode == PayMode::Partial {
            for line in &mut self.model.policy_payments {
                line.payment_amount = Amount::parse_or_zero(&line.entered_amount);
            }
        }
        self.set_draft_amount();
    }

    fn set_policy_amount(&mut self, policy_id: i64, raw: &str) -> Result<()> {
        let line = self
            .model
            .payment_mut(policy_id)
            .ok_or(PortalError::UnknownPolicy(policy_id))?;
        line.entered_amount = currency::currency_input(raw);
        line.payment_amount = Amount::parse_or_zero(&line.entered_amount);
        self.set_draft_amount();
        Ok(())
    }

    fn select_account(&mut self, id: i64) {
        select_account(self, id);
    }

    fn set_entry_field(&mut self, field: EntryField, raw: &str) -> Result<()> {
        let ach = &mut self.model.ach_information;
        let message = match field {
            EntryField::BankName => {
                ach.bank_name = raw.to_string();
                None
            }
            EntryField::AccountType => {
                let kind = AccountType::parse(raw)
                    .ok_or_else(|| PortalError::InvalidInput(format!("unknown account type `{raw}`")))?;
                ach.account_type_id = kind.id();
                ach.account_type = kind.label().into();
                None
            }
            EntryField::AccountNumber => {
                ach.bank_account_number = currency::digits_or_uppercase(raw);
                validation::account_number_field_message(&ach.bank_account_number)
            }
            EntryField::AccountNumberConfirm => {
                ach.bank_account_number_confirm = currency::digits_or_uppercase(raw);
                validation::account_confirm_field_message(
                    &ach.bank_account_number,
                    &ach.bank_account_number_confirm,
                )
            }
            EntryField::RoutingNumber => {
                ach.routing_number = currency::digits_only(raw);
                validation::routing_number_field_message(&ach.routing_number)
            }
            EntryField::RoutingNumberConfirm => {
                ach.routing_number_confirm = currency::digits_only(raw);
                validation::routing_confirm_field_message(
                    &ach.routing_number,
                    &ach.routing_number_confirm,
                )
            }
            EntryField::Nickname => {
                ach.bank_account_name = raw.to_string();
                None
            }
        };
        set_field_message(self, field, message);

        if field.feeds_nickname() {
            self.set_bank_account_nickname();
        } else if field == EntryField::Nickname {
            self.flag_duplicate_nickname();
        }
        Ok(())
    }

    fn set_terms_accepted(&mut self, accepted: bool) {
        self.model.terms_accepted = accepted;
        self.view.terms_checked = accepted;
        self.refresh_controls();
    }
}
