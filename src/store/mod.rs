use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;

pub mod cache;
pub mod profile;

pub use cache::CacheStore;
pub use profile::ProfileStore;

use crate::aws::Credentials;

/// Persisted identity -> credentials mapping behind the resolver.
///
/// `persist` is load, merge, full-file overwrite. There is no locking and no
/// rename-on-write: concurrent invocations race and the last write wins.
#[async_trait]
pub trait CredentialStore {
    /// Cached credentials for an identity key, if any
    async fn lookup(&self, identity: &str) -> Result<Option<Credentials>>;

    /// Merge one record into the mapping and overwrite the backing file
    async fn persist(&self, identity: &str, credentials: &Credentials) -> Result<()>;
}

/// Credential files are secrets; keep them owner-only on Unix
pub(crate) async fn restrict_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path).await?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = fs::metadata(path).await?;
    }
    Ok(())
}
