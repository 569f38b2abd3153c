use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    aws::{Credentials, MfaDevice, Principal},
    error::{AuthError, validate_token_code},
    store::CredentialStore,
};

/// Identity-provider operations the resolver consumes
#[async_trait]
pub trait IdentityClient {
    async fn current_principal(&self) -> Result<Principal>;
    async fn list_mfa_devices(&self, user_name: &str) -> Result<Vec<MfaDevice>>;
    async fn exchange_token(
        &self,
        serial_number: &str,
        token_code: &str,
        duration_seconds: i32,
    ) -> Result<Credentials>;
    async fn probe(&self, credentials: &Credentials) -> bool;
}

/// Source of an MFA token code when none was given on the command line
pub trait TokenSource {
    fn token_code(&self) -> Result<String>;
}

/// Picks one of several registered MFA devices
pub trait DeviceSelector {
    fn select(&self, devices: &[MfaDevice]) -> Result<MfaDevice>;
}

/// Resolves session credentials: cached if still accepted by the provider,
/// freshly exchanged otherwise.
///
/// Validity is decided by a live probe against the provider, never by a
/// stored timestamp.
pub struct CredentialResolver<'a, C, T, D> {
    client: &'a C,
    token_source: &'a T,
    device_selector: &'a D,
    duration_seconds: i32,
}

impl<'a, C, T, D> CredentialResolver<'a, C, T, D>
where
    C: IdentityClient,
    T: TokenSource,
    D: DeviceSelector,
{
    pub fn new(
        client: &'a C,
        token_source: &'a T,
        device_selector: &'a D,
        duration_seconds: i32,
    ) -> Self {
        Self {
            client,
            token_source,
            device_selector,
            duration_seconds,
        }
    }

    /// Hand back credentials for the identity key, fetching and caching a
    /// fresh record when nothing valid is stored.
    pub async fn resolve<S: CredentialStore>(
        &self,
        store: &S,
        identity: &str,
        user_name: &str,
        token_flag: Option<&str>,
    ) -> Result<Credentials> {
        // A malformed command-line token fails before anything is attempted
        if let Some(code) = token_flag {
            validate_token_code(code)?;
        }

        if let Some(cached) = store.lookup(identity).await? {
            debug!("Cached credentials found for {}", identity);
            if self.client.probe(&cached).await {
                info!("Using cached session credentials");
                return Ok(cached);
            }
            info!("Cached session credentials are no longer valid");
        }

        let fresh = self.fetch(user_name, token_flag).await?;
        store.persist(identity, &fresh).await?;

        Ok(fresh)
    }

    async fn fetch(&self, user_name: &str, token_flag: Option<&str>) -> Result<Credentials> {
        let devices = self.client.list_mfa_devices(user_name).await?;
        let device = self.choose_device(devices)?;

        let token_code = match token_flag {
            Some(code) => code.to_string(),
            None => self.token_source.token_code()?,
        };
        validate_token_code(&token_code)?;

        self.client
            .exchange_token(&device.serial_number, &token_code, self.duration_seconds)
            .await
    }

    fn choose_device(&self, devices: Vec<MfaDevice>) -> Result<MfaDevice> {
        match devices.len() {
            0 => Err(AuthError::NoMfaDevice.into()),
            1 => Ok(devices.into_iter().next().unwrap()),
            _ => self.device_selector.select(&devices),
        }
    }
}
