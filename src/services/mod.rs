//! Network collaborators of the wizard and the loading indicator that
//! brackets every request.

pub mod http;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;
use crate::model::{BankAccountInfo, FormModel};

pub use http::{HttpAccountDeleter, HttpPaymentSubmitter};

/// Outcome of posting the payment.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitResult {
    pub success: bool,
    pub updated_model: Option<FormModel>,
}

impl SubmitResult {
    pub fn accepted(model: FormModel) -> Self {
        Self {
            success: true,
            updated_model: Some(model),
        }
    }

    pub fn rejected() -> Self {
        Self {
            success: false,
            updated_model: None,
        }
    }
}

#[async_trait]
pub trait PaymentSubmitter: Send + Sync {
    async fn save(&self, model: &FormModel) -> Result<SubmitResult>;
}

#[async_trait]
pub trait AccountDeleter: Send + Sync {
    async fn delete(&self, account: &BankAccountInfo) -> Result<bool>;
}

/// The collaborators a wizard controller talks to.
#[derive(Clone)]
pub struct Services {
    pub submitter: Arc<dyn PaymentSubmitter>,
    pub deleter: Arc<dyn AccountDeleter>,
}

impl Services {
    pub fn new(submitter: Arc<dyn PaymentSubmitter>, deleter: Arc<dyn AccountDeleter>) -> Self {
        Self { submitter, deleter }
    }
}

/// Shared loading-indicator flag. At most one request holds it at a time.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicator {
    active: Arc<AtomicBool>,
}

impl BusyIndicator {
    /// Shows the indicator. Returns `None` while another request is pending.
    pub fn begin(&self) -> Option<BusyGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                active: Arc::clone(&self.active),
            })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Hides the loading indicator when dropped.
#[derive(Debug)]
pub struct BusyGuard {
    active: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// JavaScript-style truthiness of a response body.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
