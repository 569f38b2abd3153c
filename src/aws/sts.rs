use anyhow::{Context, Result};
use aws_config::SdkConfig;
use aws_sdk_sts::Client as StsClient;
use tracing::{debug, info};

use super::{Credentials, Principal};

/// Identify the calling principal ("who am I")
pub async fn current_principal(config: &SdkConfig) -> Result<Principal> {
    info!("Calling AWS STS GetCallerIdentity");

    let client = StsClient::new(config);

    let identity = client
        .get_caller_identity()
        .send()
        .await
        .context("Failed to identify the current principal")?;

    let arn = identity.arn.context("AWS STS returned no caller ARN")?;
    debug!("Current principal: {}", arn);

    Ok(Principal::from_arn(arn))
}

/// Exchange an MFA token code for temporary session credentials
pub async fn get_session_token(
    config: &SdkConfig,
    serial_number: &str,
    token_code: &str,
    duration_seconds: i32,
) -> Result<Credentials> {
    info!("Calling AWS STS GetSessionToken");
    debug!("MFA device: {}", serial_number);
    debug!("Duration: {} seconds", duration_seconds);

    let client = StsClient::new(config);

    let response = client
        .get_session_token()
        .serial_number(serial_number)
        .token_code(token_code)
        .duration_seconds(duration_seconds)
        .send()
        .await
        .context("Failed to get session token")?;

    let sts_creds = response
        .credentials()
        .context("AWS STS returned no credentials")?;

    let credentials = Credentials {
        access_key_id: sts_creds.access_key_id().to_string(),
        secret_access_key: sts_creds.secret_access_key().to_string(),
        session_token: sts_creds.session_token().to_string(),
    };

    info!("Successfully obtained AWS session credentials");
    Ok(credentials)
}
