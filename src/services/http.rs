use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{is_truthy, AccountDeleter, PaymentSubmitter, SubmitResult};
use crate::config::PortalConfig;
use crate::errors::{PortalError, Result};
use crate::model::{BankAccountInfo, FormModel};

const JSON_MODEL_KEY: &str = "jsonModel";
const RAW_MODEL_FIELD: &str = "JsonModel";

fn build_client(config: &PortalConfig) -> Result<Client> {
    Ok(Client::builder().timeout(config.request_timeout()).build()?)
}

/// Posts `body` as JSON and returns the parsed response, or `None` for a
/// non-success status or a body that is not JSON.
async fn post_json<T: serde::Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
) -> Result<Option<Value>> {
    let response = client
        .post(url)
        .header(ACCEPT, "application/json")
        .header(CONTENT_TYPE, "application/json")
        .json(body)
        .send()
        .await?;

    let status = response.status();
    debug!(%url, status = status.as_u16(), "portal responded");
    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "portal rejected request");
        return Ok(None);
    }

    let text = response.text().await?;
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(%url, error = %err, "portal response is not JSON");
            Ok(None)
        }
    }
}

/// Submits the payment to the portal's finish endpoint.
pub struct HttpPaymentSubmitter {
    client: Client,
    url: String,
}

impl HttpPaymentSubmitter {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.save_url(),
        })
    }
}

#[async_trait]
impl PaymentSubmitter for HttpPaymentSubmitter {
    async fn save(&self, model: &FormModel) -> Result<SubmitResult> {
        let Some(body) = post_json(&self.client, &self.url, model).await? else {
            return Ok(SubmitResult::rejected());
        };
        if !is_truthy(&body) {
            return Ok(SubmitResult::rejected());
        }

        let raw = body
            .get(JSON_MODEL_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| PortalError::Submission(format!("response has no `{JSON_MODEL_KEY}`")))?;
        let mut updated = FormModel::from_json(raw)?;
        updated
            .extra
            .insert(RAW_MODEL_FIELD.to_string(), Value::String(raw.to_string()));
        Ok(SubmitResult::accepted(updated))
    }
}

/// Removes a saved bank account through the portal API.
pub struct HttpAccountDeleter {
    client: Client,
    url: String,
}

impl HttpAccountDeleter {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.delete_url(),
        })
    }
}

#[async_trait]
impl AccountDeleter for HttpAccountDeleter {
    async fn delete(&self, account: &BankAccountInfo) -> Result<bool> {
        let body = post_json(&self.client, &self.url, account).await?;
        Ok(body.as_ref().map_or(false, is_truthy))
    }
}
