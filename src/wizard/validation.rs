//! Stateless predicates over bank-entry fields and payment amounts.
//!
//! The control-state engine and the per-field change handlers both call
//! these, so a field never shows a message the gating disagrees with.

use crate::currency::Amount;
use crate::model::BankAccountInfo;

pub const ACCOUNT_NUMBER_MIN: usize = 4;
pub const ACCOUNT_NUMBER_MAX: usize = 14;
pub const ROUTING_NUMBER_LEN: usize = 9;

/// Keys of the validation messages the wizard can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {
    AccountNumberLength,
    AccountNumberMismatch,
    RoutingNumberLength,
    RoutingNumberMismatch,
    BankNameRequired,
    DuplicateNickname,
    AmountNotPositive,
}

impl MessageKey {
    pub fn text(self) -> &'static str {
        match self {
            MessageKey::AccountNumberLength => {
                "Account numbers should be between 4 and 14 characters."
            }
            MessageKey::AccountNumberMismatch => "Account numbers must match.",
            MessageKey::RoutingNumberLength => "Routing numbers must be 9 digits.",
            MessageKey::RoutingNumberMismatch => "Routing numbers must match.",
            MessageKey::BankNameRequired => "Bank name is required.",
            MessageKey::DuplicateNickname => "The Bank Account Nickname is already in use.",
            MessageKey::AmountNotPositive => "Payment value must be greater than zero.",
        }
    }
}

/// Result of a rule: whether the input is invalid and which message explains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOutcome {
    pub invalid: bool,
    pub message: Option<MessageKey>,
}

impl RuleOutcome {
    pub const VALID: RuleOutcome = RuleOutcome {
        invalid: false,
        message: None,
    };

    fn invalid(message: MessageKey) -> Self {
        Self {
            invalid: true,
            message: Some(message),
        }
    }
}

fn length(value: &str) -> usize {
    value.chars().count()
}

fn account_length_ok(value: &str) -> bool {
    (ACCOUNT_NUMBER_MIN..=ACCOUNT_NUMBER_MAX).contains(&length(value))
}

pub fn account_number_invalid(value: &str, confirm: &str) -> RuleOutcome {
    if !account_length_ok(value) {
        RuleOutcome::invalid(MessageKey::AccountNumberLength)
    } else if length(confirm) < ACCOUNT_NUMBER_MIN || value != confirm {
        RuleOutcome::invalid(MessageKey::AccountNumberMismatch)
    } else {
        RuleOutcome::VALID
    }
}

pub fn routing_number_invalid(value: &str, confirm: &str) -> RuleOutcome {
    if length(value) != ROUTING_NUMBER_LEN {
        RuleOutcome::invalid(MessageKey::RoutingNumberLength)
    } else if length(confirm) != ROUTING_NUMBER_LEN || value != confirm {
        RuleOutcome::invalid(MessageKey::RoutingNumberMismatch)
    } else {
        RuleOutcome::VALID
    }
}

/// True when an active saved account already uses `nickname`. An empty
/// nickname never collides.
pub fn is_duplicate_nickname(nickname: &str, saved_accounts: &[BankAccountInfo]) -> bool {
    !nickname.is_empty()
        && saved_accounts
            .iter()
            .any(|account| account.is_active && account.bank_account_name == nickname)
}

pub fn duplicate_nickname(nickname: &str, saved_accounts: &[BankAccountInfo]) -> RuleOutcome {
    if is_duplicate_nickname(nickname, saved_accounts) {
        RuleOutcome::invalid(MessageKey::DuplicateNickname)
    } else {
        RuleOutcome::VALID
    }
}

pub fn bank_name_missing(bank_name: &str) -> RuleOutcome {
    if bank_name.trim().is_empty() {
        RuleOutcome::invalid(MessageKey::BankNameRequired)
    } else {
        RuleOutcome::VALID
    }
}

pub fn amount_not_positive(amount: Amount) -> RuleOutcome {
    if amount.is_positive() {
        RuleOutcome::VALID
    } else {
        RuleOutcome::invalid(MessageKey::AmountNotPositive)
    }
}

pub fn account_number_field_message(value: &str) -> Option<MessageKey> {
    (!account_length_ok(value)).then_some(MessageKey::AccountNumberLength)
}

pub fn account_confirm_field_message(value: &str, confirm: &str) -> Option<MessageKey> {
    (value != confirm).then_some(MessageKey::AccountNumberMismatch)
}

pub fn routing_number_field_message(value: &str) -> Option<MessageKey> {
    (!value.is_empty() && length(value) != ROUTING_NUMBER_LEN)
        .then_some(MessageKey::RoutingNumberLength)
}

pub fn routing_confirm_field_message(value: &str, confirm: &str) -> Option<MessageKey> {
    (value != confirm).then_some(MessageKey::RoutingNumberMismatch)
}
