use anyhow::Result;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_smithy_types::{DateTime, date_time::Format};
use tracing::info;

pub mod iam;
pub mod sts;

use crate::{constants::DEFAULT_AWS_REGION, resolver::IdentityClient};

/// AWS temporary credentials structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

/// The authenticated IAM principal
#[derive(Debug, Clone)]
pub struct Principal {
    pub arn: String,
    pub user_name: String,
}

impl Principal {
    /// Derive the principal from its ARN; the user name is the final path
    /// segment (arn:aws:iam::123456789012:user/path/name -> name)
    pub fn from_arn(arn: String) -> Self {
        let user_name = arn
            .rsplit('/')
            .next()
            .map_or_else(String::new, String::from);

        Self { arn, user_name }
    }
}

/// Registered MFA device. Fetched fresh on every resolve, never persisted.
#[derive(Debug, Clone)]
pub struct MfaDevice {
    pub serial_number: String,
    pub enabled_at: DateTime,
}

impl MfaDevice {
    /// Display label for interactive selection
    pub fn label(&self) -> String {
        let enabled = self
            .enabled_at
            .fmt(Format::DateTime)
            .unwrap_or_else(|_| "unknown".to_string());
        format!("{} - {}", self.serial_number, enabled)
    }
}

/// Load AWS config with automatic region fallback
/// Priority: ENV vars -> Config file -> EC2 metadata -> DEFAULT_AWS_REGION
pub async fn load_sdk_config(profile: Option<&str>) -> SdkConfig {
    let loaded = config_loader(profile).load().await;

    match loaded.region() {
        Some(region) => {
            info!("Using region: {}", region);
            loaded
        }
        None => {
            info!(
                "No region configured, using default {} for IAM/STS",
                DEFAULT_AWS_REGION
            );
            config_loader(profile)
                .region(Region::new(DEFAULT_AWS_REGION))
                .load()
                .await
        }
    }
}

fn config_loader(profile: Option<&str>) -> ConfigLoader {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    match profile {
        Some(name) => loader.profile_name(name),
        None => loader,
    }
}

/// Identity-provider client backed by the real AWS IAM and STS APIs
pub struct AwsClient {
    config: SdkConfig,
}

impl AwsClient {
    pub async fn new(profile: Option<&str>) -> Self {
        Self {
            config: load_sdk_config(profile).await,
        }
    }
}

#[async_trait]
impl IdentityClient for AwsClient {
    async fn current_principal(&self) -> Result<Principal> {
        sts::current_principal(&self.config).await
    }

    async fn list_mfa_devices(&self, user_name: &str) -> Result<Vec<MfaDevice>> {
        iam::list_mfa_devices(&self.config, user_name).await
    }

    async fn exchange_token(
        &self,
        serial_number: &str,
        token_code: &str,
        duration_seconds: i32,
    ) -> Result<Credentials> {
        sts::get_session_token(&self.config, serial_number, token_code, duration_seconds).await
    }

    async fn probe(&self, credentials: &Credentials) -> bool {
        iam::probe(credentials).await
    }
}
