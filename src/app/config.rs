// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::pacing::Pacing;
use crate::common::retry::RetryPolicy;
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::services::execution::scheduler::SchedulerPacing;
use crate::services::execution::submission::SubmissionConfig;
use crate::services::protocols::ProtocolSettings;
use crate::services::protocols::deploy::load_init_code;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,

    // Network
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Auto-detected through `eth_chainId` when unset.
    pub chain_id: Option<u64>,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    // Files
    #[serde(default = "default_private_keys_path")]
    pub private_keys_path: String,
    #[serde(default = "default_recipients_path")]
    pub recipients_path: String,
    pub deploy_bytecode_path: Option<String>,

    // Submission
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
    #[serde(default = "default_priority_fee_floor_gwei")]
    pub priority_fee_floor_gwei: u64,

    // Pacing
    #[serde(default = "default_delay_min_secs")]
    pub step_delay_min_secs: u64,
    #[serde(default = "default_delay_max_secs")]
    pub step_delay_max_secs: u64,
    #[serde(default = "default_delay_min_secs")]
    pub cycle_delay_min_secs: u64,
    #[serde(default = "default_delay_max_secs")]
    pub cycle_delay_max_secs: u64,
    #[serde(default = "default_delay_min_secs")]
    pub account_delay_min_secs: u64,
    #[serde(default = "default_delay_max_secs")]
    pub account_delay_max_secs: u64,
    #[serde(default = "default_claim_delay_secs")]
    pub claim_delay_secs: u64,
    #[serde(default = "default_transfer_delay_min_secs")]
    pub transfer_delay_min_secs: u64,
    #[serde(default = "default_transfer_delay_max_secs")]
    pub transfer_delay_max_secs: u64,

    // Protocols
    #[serde(default = "default_apriori_api_url")]
    pub apriori_api_url: String,
}

fn default_false() -> bool {
    false
}
fn default_rpc_url() -> String {
    constants::DEFAULT_RPC_URL.to_string()
}
fn default_explorer_url() -> String {
    constants::DEFAULT_EXPLORER_URL.to_string()
}
fn default_private_keys_path() -> String {
    "pvkey.txt".to_string()
}
fn default_recipients_path() -> String {
    "address.txt".to_string()
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    1_000
}
fn default_retry_max_delay_ms() -> u64 {
    8_000
}
fn default_retry_jitter_ms() -> u64 {
    1_000
}
fn default_receipt_poll_ms() -> u64 {
    2_000
}
fn default_receipt_timeout_ms() -> u64 {
    180_000
}
fn default_priority_fee_floor_gwei() -> u64 {
    constants::DEFAULT_PRIORITY_FEE_GWEI
}
fn default_delay_min_secs() -> u64 {
    60
}
fn default_delay_max_secs() -> u64 {
    180
}
fn default_claim_delay_secs() -> u64 {
    660
}
fn default_transfer_delay_min_secs() -> u64 {
    1
}
fn default_transfer_delay_max_secs() -> u64 {
    3
}
fn default_apriori_api_url() -> String {
    constants::APRIORI_API_URL.to_string()
}

impl GlobalSettings {
    /// `path` (or `config.toml` if present), then env/.env on top.
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        Url::parse(self.rpc_url.trim())
            .map_err(|e| AppError::Config(format!("Invalid rpc_url '{}': {e}", self.rpc_url)))?;
        if self.explorer_url.trim().is_empty() {
            return Err(AppError::Config("explorer_url is empty".into()));
        }
        if self.chain_id == Some(0) {
            return Err(AppError::Config("chain_id must be non-zero".into()));
        }
        Ok(())
    }

    pub fn retry_attempts_value(&self) -> u32 {
        self.retry_attempts.max(1)
    }

    pub fn receipt_poll_ms_value(&self) -> u64 {
        self.receipt_poll_ms.max(100)
    }

    pub fn receipt_timeout_ms_value(&self) -> u64 {
        self.receipt_timeout_ms.max(self.receipt_poll_ms_value())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts_value(),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms.max(self.retry_base_delay_ms)),
            jitter: Duration::from_millis(self.retry_jitter_ms),
        }
    }

    pub fn submission_config(&self) -> SubmissionConfig {
        SubmissionConfig {
            retry: self.retry_policy(),
            poll_interval: Duration::from_millis(self.receipt_poll_ms_value()),
            receipt_timeout: Duration::from_millis(self.receipt_timeout_ms_value()),
            explorer_url: self.explorer_url.trim().to_string(),
        }
    }

    pub fn scheduler_pacing(&self) -> SchedulerPacing {
        SchedulerPacing {
            between_cycles: Pacing::secs(self.cycle_delay_min_secs, self.cycle_delay_max_secs),
            between_accounts: Pacing::secs(self.account_delay_min_secs, self.account_delay_max_secs),
        }
    }

    pub fn private_keys_path(&self) -> PathBuf {
        PathBuf::from(self.private_keys_path.trim())
    }

    pub fn recipients_path(&self) -> PathBuf {
        PathBuf::from(self.recipients_path.trim())
    }

    /// Reads the deploy bytecode file when one is configured.
    pub fn protocol_settings(&self) -> Result<ProtocolSettings, AppError> {
        let deploy_bytecode = match self
            .deploy_bytecode_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            Some(path) => Some(load_init_code(Path::new(path))?),
            None => None,
        };
        Ok(ProtocolSettings {
            step_delay: Pacing::secs(self.step_delay_min_secs, self.step_delay_max_secs),
            claim_delay: Pacing::secs(self.claim_delay_secs, self.claim_delay_secs),
            transfer_delay: Pacing::secs(self.transfer_delay_min_secs, self.transfer_delay_max_secs),
            apriori_api_url: self.apriori_api_url.trim().to_string(),
            deploy_bytecode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, OnceLock};

    fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_apply_to_empty_file() {
        let _guard = env_lock_guard();
        let f = write_config("");
        let s = GlobalSettings::load_with_path(f.path().to_str()).unwrap();
        assert_eq!(s.rpc_url, constants::DEFAULT_RPC_URL);
        assert_eq!(s.chain_id, None);
        assert_eq!(s.retry_attempts_value(), 3);
        assert_eq!(s.claim_delay_secs, 660);

        let sub = s.submission_config();
        assert_eq!(sub.poll_interval, Duration::from_secs(2));
        assert_eq!(sub.receipt_timeout, Duration::from_secs(180));
        assert_eq!(sub.retry.max_delay, Duration::from_secs(8));
    }

    #[test]
    fn floors_clamp_nonsense_values() {
        let _guard = env_lock_guard();
        let f = write_config(
            "retry_attempts = 0\nreceipt_poll_ms = 5\nreceipt_timeout_ms = 1\n",
        );
        let s = GlobalSettings::load_with_path(f.path().to_str()).unwrap();
        assert_eq!(s.retry_attempts_value(), 1);
        assert_eq!(s.receipt_poll_ms_value(), 100);
        assert_eq!(s.receipt_timeout_ms_value(), 100);
    }

    #[test]
    fn rejects_bad_rpc_url_and_zero_chain() {
        let _guard = env_lock_guard();
        let f = write_config("rpc_url = \"not a url\"\n");
        assert!(matches!(
            GlobalSettings::load_with_path(f.path().to_str()),
            Err(AppError::Config(_))
        ));
        let f = write_config("chain_id = 0\n");
        assert!(GlobalSettings::load_with_path(f.path().to_str()).is_err());
    }

    #[test]
    fn protocol_settings_read_bytecode_file() {
        let _guard = env_lock_guard();
        let mut code = tempfile::NamedTempFile::new().unwrap();
        writeln!(code, "0x602a").unwrap();
        let f = write_config(&format!(
            "deploy_bytecode_path = \"{}\"\nstep_delay_min_secs = 5\nstep_delay_max_secs = 5\n",
            code.path().display()
        ));
        let s = GlobalSettings::load_with_path(f.path().to_str()).unwrap();
        let p = s.protocol_settings().unwrap();
        assert_eq!(p.deploy_bytecode.unwrap().as_ref(), &[0x60, 0x2a]);
        assert_eq!(p.step_delay, Pacing::Fixed(Duration::from_secs(5)));

        let f = write_config("deploy_bytecode_path = \"/nonexistent/code.hex\"\n");
        let s = GlobalSettings::load_with_path(f.path().to_str()).unwrap();
        assert!(matches!(
            s.protocol_settings(),
            Err(AppError::ConfigurationMissing { .. })
        ));
    }
}
