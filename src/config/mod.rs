use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::errors::PortalError;

const CONFIG_FILE: &str = "config.json";
const DEFAULT_DIR_NAME: &str = "payment_wizard";
const HOME_ENV: &str = "PAYMENT_WIZARD_HOME";
const TMP_SUFFIX: &str = "tmp";
const SUBMISSION_PLACEHOLDER: &str = "{submission_id}";

/// Endpoint paths used by the payment wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortalUrls {
    pub save: String,
    pub delete: String,
    /// Exit target; `{submission_id}` is substituted on cancel.
    pub cancel: String,
}

impl Default for PortalUrls {
    fn default() -> Self {
        Self {
            save: "/api/PolicyHolder/FinishPayment".into(),
            delete: "/api/PolicyHolder/RemoveBankAccount".into(),
            cancel: format!("/PolicyHolder/{SUBMISSION_PLACEHOLDER}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortalConfig {
    pub base_url: String,
    pub urls: PortalUrls,
    pub page_title_suffix: String,
    pub request_timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            urls: PortalUrls::default(),
            page_title_suffix: " - Policy Holder Portal".into(),
            request_timeout_secs: 30,
        }
    }
}

impl PortalConfig {
    /// Joins an endpoint path onto `base_url`.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn save_url(&self) -> String {
        self.endpoint(&self.urls.save)
    }

    pub fn delete_url(&self) -> String {
        self.endpoint(&self.urls.delete)
    }

    pub fn cancel_url(&self, submission_id: i64) -> String {
        self.urls
            .cancel
            .replace(SUBMISSION_PLACEHOLDER, &submission_id.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, PortalError> {
        Self::with_base_dir(base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, PortalError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
        })
    }

    pub fn load(&self) -> Result<PortalConfig, PortalError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data).map_err(|err| {
                PortalError::Config(format!("{}: {}", self.path.display(), err))
            })
        } else {
            Ok(PortalConfig::default())
        }
    }

    pub fn save(&self, config: &PortalConfig) -> Result<(), PortalError> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `$PAYMENT_WIZARD_HOME`, otherwise the platform config directory.
pub fn base_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

fn ensure_dir(path: &Path) -> Result<(), PortalError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), PortalError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
