#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use payment_wizard::currency::Amount;
use payment_wizard::errors::{PortalError, Result};
use payment_wizard::model::{BankAccountInfo, FormModel, PayMode, PolicyPayment};
use payment_wizard::services::{AccountDeleter, PaymentSubmitter, Services, SubmitResult};
use payment_wizard::wizard::{ach, WizardController, WizardOptions};

pub const CANCEL_URL: &str = "http://portal.test/PolicyHolder/77";

/// Snapshot with two policies totalling 120.00 and one saved checking account.
pub fn payment_model() -> FormModel {
    let mut model = FormModel {
        submission_id: 77,
        insured_id: 9,
        how_to_pay: PayMode::Full,
        total_due: Amount::from_cents(12_000),
        policy_payments: vec![
            PolicyPayment {
                policy_id: 101,
                amount_due: Amount::from_cents(7_000),
                ..PolicyPayment::default()
            },
            PolicyPayment {
                policy_id: 102,
                amount_due: Amount::from_cents(5_000),
                ..PolicyPayment::default()
            },
        ],
        ..FormModel::default()
    };
    model.ach_information.saved_bank_accounts = vec![BankAccountInfo {
        bank_account_info_id: 5,
        bank_account_name: "Main".into(),
        bank_account_number: "99887766".into(),
        bank_name: "First Bank".into(),
        routing_number: "123456789".into(),
        bank_account_type: Some(0),
        ..BankAccountInfo::default()
    }];
    model
}

/// What the stub submitter answers.
#[derive(Clone)]
pub enum SubmitReply {
    Accept { transaction_id: &'static str },
    Reject,
    Transport,
    Unusable,
}

pub struct StubSubmitter {
    pub reply: SubmitReply,
    pub calls: Mutex<Vec<FormModel>>,
}

#[async_trait]
impl PaymentSubmitter for StubSubmitter {
    async fn save(&self, model: &FormModel) -> Result<SubmitResult> {
        self.calls.lock().unwrap().push(model.clone());
        match &self.reply {
            SubmitReply::Accept { transaction_id } => {
                let mut updated = model.clone();
                updated.transaction_id = Some((*transaction_id).to_string());
                Ok(SubmitResult::accepted(updated))
            }
            SubmitReply::Reject => Ok(SubmitResult::rejected()),
            SubmitReply::Transport => Err(PortalError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))),
            SubmitReply::Unusable => Err(PortalError::Submission("response has no `jsonModel`".into())),
        }
    }
}

pub struct StubDeleter {
    pub reply: bool,
    pub calls: Mutex<Vec<BankAccountInfo>>,
}

#[async_trait]
impl AccountDeleter for StubDeleter {
    async fn delete(&self, account: &BankAccountInfo) -> Result<bool> {
        self.calls.lock().unwrap().push(account.clone());
        Ok(self.reply)
    }
}

pub struct Harness {
    pub wizard: WizardController,
    pub submitter: Arc<StubSubmitter>,
    pub deleter: Arc<StubDeleter>,
}

pub fn harness_with(model: FormModel, reply: SubmitReply, delete_reply: bool) -> Harness {
    let submitter = Arc::new(StubSubmitter {
        reply,
        calls: Mutex::new(Vec::new()),
    });
    let deleter = Arc::new(StubDeleter {
        reply: delete_reply,
        calls: Mutex::new(Vec::new()),
    });
    let services = Services::new(submitter.clone(), deleter.clone());
    let options = WizardOptions {
        page_title_suffix: " | Portal".into(),
        cancel_url: CANCEL_URL.into(),
    };
    let wizard = ach::payment_wizard(model, services, options).expect("build payment wizard");
    Harness {
        wizard,
        submitter,
        deleter,
    }
}

pub fn harness(reply: SubmitReply) -> Harness {
    harness_with(payment_model(), reply, true)
}
