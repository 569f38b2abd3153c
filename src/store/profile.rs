use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use ini::Ini;
use tokio::fs;
use tracing::info;

use super::{CredentialStore, restrict_permissions};
use crate::aws::Credentials;

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const SESSION_TOKEN: &str = "aws_session_token";

/// Session credentials cached as named profiles of the shared AWS
/// credentials file.
///
/// The file must already exist: it also carries the base profile the
/// provider calls run under, so a missing or malformed file is fatal.
/// Sections that are not session profiles (no session token) are preserved
/// untouched.
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the whole credentials file
    fn load(&self) -> Result<Ini> {
        if !self.path.exists() {
            bail!("AWS credentials file not found: {}", self.path.display());
        }

        Ini::load_from_file(&self.path).context("Failed to read AWS credentials file")
    }

    /// Overwrite the whole credentials file, sections in mapping order
    async fn save(&self, ini: &Ini) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        ini.write_to_file(&self.path)
            .context("Failed to write credentials file")?;

        restrict_permissions(&self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for ProfileStore {
    async fn lookup(&self, identity: &str) -> Result<Option<Credentials>> {
        let ini = self.load()?;

        let Some(section) = ini.section(Some(identity)) else {
            return Ok(None);
        };

        // A section missing any credential key is not a cached session
        // profile (e.g. a long-term profile)
        let (Some(access_key_id), Some(secret_access_key), Some(session_token)) = (
            section.get(ACCESS_KEY_ID),
            section.get(SECRET_ACCESS_KEY),
            section.get(SESSION_TOKEN),
        ) else {
            return Ok(None);
        };

        Ok(Some(Credentials {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: session_token.to_string(),
        }))
    }

    async fn persist(&self, identity: &str, credentials: &Credentials) -> Result<()> {
        let mut ini = self.load()?;

        ini.with_section(Some(identity))
            .set(ACCESS_KEY_ID, &credentials.access_key_id)
            .set(SECRET_ACCESS_KEY, &credentials.secret_access_key)
            .set(SESSION_TOKEN, &credentials.session_token);

        self.save(&ini).await?;
        info!("Session credentials saved to profile: {}", identity);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn credentials(tag: &str) -> Credentials {
        Credentials {
            access_key_id: format!("ASIA{tag}"),
            secret_access_key: format!("secret-{tag}"),
            session_token: format!("token-{tag}"),
        }
    }

    fn base_file(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("credentials");
        std::fs::write(
            &path,
            "[work]\naws_access_key_id=AKIAWORK\naws_secret_access_key=longterm\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("credentials"));

        let err = store.lookup("work-mfa").await.unwrap_err();
        assert!(err.to_string().contains("credentials file not found"));
    }

    #[tokio::test]
    async fn test_unknown_profile_is_none() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(base_file(dir.path()));

        assert_eq!(store.lookup("work-mfa").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_long_term_profile_is_not_a_cached_record() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(base_file(dir.path()));

        // [work] has no session token and must not be treated as cached
        assert_eq!(store.lookup("work").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persist_then_lookup_round_trip() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(base_file(dir.path()));

        let creds = credentials("mfa");
        store.persist("work-mfa", &creds).await.unwrap();

        assert_eq!(store.lookup("work-mfa").await.unwrap(), Some(creds));
    }

    #[tokio::test]
    async fn test_persist_preserves_other_sections() {
        let dir = tempdir().unwrap();
        let path = base_file(dir.path());

        let store = ProfileStore::new(&path);
        store.persist("work-mfa", &credentials("mfa")).await.unwrap();

        let ini = Ini::load_from_file(&path).unwrap();
        let base = ini.section(Some("work")).unwrap();
        assert_eq!(base.get(ACCESS_KEY_ID), Some("AKIAWORK"));
        assert_eq!(base.get(SECRET_ACCESS_KEY), Some("longterm"));
    }

    #[tokio::test]
    async fn test_persist_overwrites_same_profile() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(base_file(dir.path()));

        store.persist("work-mfa", &credentials("old")).await.unwrap();
        store.persist("work-mfa", &credentials("new")).await.unwrap();

        assert_eq!(store.lookup("work-mfa").await.unwrap(), Some(credentials("new")));
    }

    #[tokio::test]
    async fn test_sections_use_recognized_keys() {
        let dir = tempdir().unwrap();
        let path = base_file(dir.path());

        let store = ProfileStore::new(&path);
        store.persist("work-mfa", &credentials("mfa")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[work-mfa]"));
        assert!(contents.contains("aws_access_key_id=ASIAmfa"));
        assert!(contents.contains("aws_secret_access_key=secret-mfa"));
        assert!(contents.contains("aws_session_token=token-mfa"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_credentials_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = base_file(dir.path());

        let store = ProfileStore::new(&path);
        store.persist("work-mfa", &credentials("mfa")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
