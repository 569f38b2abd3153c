use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use super::{CredentialStore, restrict_permissions};
use crate::aws::Credentials;

/// One cached credential record, keyed by the owning identity
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    #[serde(rename = "UserArn")]
    user_arn: String,
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,
    #[serde(rename = "SessionToken")]
    session_token: String,
}

/// JSON credential cache keyed by user ARN.
///
/// An absent or unparsable file is an empty mapping; a damaged cache costs
/// one extra MFA round trip, never an error.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the whole mapping
    async fn load(&self) -> BTreeMap<String, CacheEntry> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(_) => return BTreeMap::new(),
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            debug!("Ignoring unparsable cache file: {}", e);
            BTreeMap::new()
        })
    }

    /// Serialize and overwrite the whole mapping, creating parent directories
    async fn save(&self, entries: &BTreeMap<String, CacheEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = serde_json::to_string(entries)?;
        fs::write(&self.path, contents)
            .await
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))?;

        restrict_permissions(&self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for CacheStore {
    async fn lookup(&self, identity: &str) -> Result<Option<Credentials>> {
        let entries = self.load().await;

        Ok(entries.get(identity).map(|entry| Credentials {
            access_key_id: entry.access_key_id.clone(),
            secret_access_key: entry.secret_access_key.clone(),
            session_token: entry.session_token.clone(),
        }))
    }

    async fn persist(&self, identity: &str, credentials: &Credentials) -> Result<()> {
        let mut entries = self.load().await;

        entries.insert(
            identity.to_string(),
            CacheEntry {
                user_arn: identity.to_string(),
                access_key_id: credentials.access_key_id.clone(),
                secret_access_key: credentials.secret_access_key.clone(),
                session_token: credentials.session_token.clone(),
            },
        );

        self.save(&entries).await?;
        info!("Session credentials cached for {}", identity);

        Ok(())
    }
}
