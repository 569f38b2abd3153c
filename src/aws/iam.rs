use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_iam::Client as IamClient;
use tracing::{debug, info};

use super::{Credentials, MfaDevice};
use crate::constants::DEFAULT_AWS_REGION;

/// List the MFA devices registered for an IAM user
pub async fn list_mfa_devices(config: &SdkConfig, user_name: &str) -> Result<Vec<MfaDevice>> {
    info!("Calling AWS IAM ListMFADevices");
    debug!("User name: {}", user_name);

    let client = IamClient::new(config);

    let response = client
        .list_mfa_devices()
        .user_name(user_name)
        .send()
        .await
        .context("Failed to list MFA devices")?;

    let devices = response
        .mfa_devices()
        .iter()
        .map(|device| MfaDevice {
            serial_number: device.serial_number().to_string(),
            enabled_at: *device.enable_date(),
        })
        .collect();

    Ok(devices)
}

/// Check whether cached credentials are still accepted by the provider.
///
/// Any failure means invalid: an expired token, a revoked session and a
/// network error all force a fresh exchange.
pub async fn probe(credentials: &Credentials) -> bool {
    let provider = aws_sdk_iam::config::Credentials::new(
        credentials.access_key_id.clone(),
        credentials.secret_access_key.clone(),
        Some(credentials.session_token.clone()),
        None,
        "aws-sudo",
    );

    let config = aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(provider)
        .region(Region::new(DEFAULT_AWS_REGION))
        .load()
        .await;

    let valid = IamClient::new(&config).get_user().send().await.is_ok();
    debug!("Cached credential probe: {}", if valid { "valid" } else { "invalid" });

    valid
}
