use tracing::debug;

use super::controller::WizardController;
use crate::errors::Result;
use crate::model::{AccountType, PayMode};

/// Bank-entry inputs on the bank information step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryField {
    BankName,
    AccountType,
    AccountNumber,
    AccountNumberConfirm,
    RoutingNumber,
    RoutingNumberConfirm,
    Nickname,
}

impl EntryField {
    pub const ALL: [EntryField; 7] = [
        EntryField::BankName,
        EntryField::AccountType,
        EntryField::AccountNumber,
        EntryField::AccountNumberConfirm,
        EntryField::RoutingNumber,
        EntryField::RoutingNumberConfirm,
        EntryField::Nickname,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntryField::BankName => "bank-name",
            EntryField::AccountType => "account-type",
            EntryField::AccountNumber => "account-number",
            EntryField::AccountNumberConfirm => "account-number-confirm",
            EntryField::RoutingNumber => "routing-number",
            EntryField::RoutingNumberConfirm => "routing-number-confirm",
            EntryField::Nickname => "nickname",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let wanted = input.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|field| field.name() == wanted)
    }

    /// Fields whose change regenerates the account nickname.
    pub fn feeds_nickname(self) -> bool {
        matches!(
            self,
            EntryField::BankName | EntryField::AccountType | EntryField::AccountNumber
        )
    }
}

/// A user edit on one of the wizard's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    PayMode(PayMode),
    PolicyAmount { policy_id: i64, value: String },
    SelectAccount(i64),
    Entry { field: EntryField, value: String },
    AccountType(AccountType),
    TermsAccepted(bool),
}

/// Operations the input layer may perform on the payment data.
pub trait PaymentHandler {
    /// Recomputes the draft amount from the current pay mode and lines.
    fn set_draft_amount(&mut self);
    /// Re-evaluates navigation gating for the active step.
    fn set_ach_control_state(&mut self);
    /// Regenerates the nickname from the entry fields and flags duplicates.
    fn set_bank_account_nickname(&mut self);
    fn set_pay_mode(&mut self, mode: PayMode);
    fn set_policy_amount(&mut self, policy_id: i64, raw: &str) -> Result<()>;
    fn select_account(&mut self, id: i64);
    fn set_entry_field(&mut self, field: EntryField, raw: &str) -> Result<()>;
    fn set_terms_accepted(&mut self, accepted: bool);
}

/// Routes one input event to the handler.
pub fn apply<H: PaymentHandler + ?Sized>(handler: &mut H, event: FieldEvent) -> Result<()> {
    debug!(?event, "field event");
    match event {
        FieldEvent::PayMode(mode) => handler.set_pay_mode(mode),
        FieldEvent::PolicyAmount { policy_id, value } => {
            handler.set_policy_amount(policy_id, &value)?
        }
        FieldEvent::SelectAccount(id) => handler.select_account(id),
        FieldEvent::Entry { field, value } => handler.set_entry_field(field, &value)?,
        FieldEvent::AccountType(kind) => {
            handler.set_entry_field(EntryField::AccountType, &kind.id().to_string())?
        }
        FieldEvent::TermsAccepted(accepted) => handler.set_terms_accepted(accepted),
    }
    Ok(())
}

impl WizardController {
    /// Applies a field edit and re-runs gating for the active step.
    pub fn apply(&mut self, event: FieldEvent) -> Result<()> {
        let ctx = self.context_mut();
        apply(&mut *ctx, event)?;
        ctx.set_ach_control_state();
        Ok(())
    }
}
