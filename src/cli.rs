use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use crate::{
    aws::AwsClient,
    constants::{
        self, DEFAULT_SESSION_DURATION_SECS, MAX_SESSION_DURATION_SECS, MIN_SESSION_DURATION_SECS,
    },
    error::validate_token_code,
    launcher::{self, LaunchOutcome},
    prompt::{DevicePrompt, TokenPrompt},
    resolver::{CredentialResolver, IdentityClient},
    store::{CacheStore, ProfileStore},
};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "aws-sudo",
    version,
    about = "Run commands with MFA-backed temporary AWS session credentials",
    long_about = None
)]
pub struct Cli {
    #[arg(short = 't', long, help = "Token from your MFA device")]
    pub token: Option<String>,

    #[arg(
        short = 'd',
        long,
        env = "AWS_SESSION_DURATION",
        default_value_t = DEFAULT_SESSION_DURATION_SECS,
        value_parser = clap::value_parser!(u32)
            .range(MIN_SESSION_DURATION_SECS as i64..=MAX_SESSION_DURATION_SECS as i64),
        help = "Seconds to issue the session token for"
    )]
    pub duration: u32,

    #[arg(
        short = 'p',
        long,
        help = "Cache the session under this profile of the shared AWS credentials file"
    )]
    pub profile: Option<String>,

    #[arg(short = 'v', long, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[arg(
        trailing_var_arg = true,
        help = "Command to run with the session credentials; prints export statements when omitted"
    )]
    pub command: Vec<String>,
}

impl Cli {
    pub async fn execute(self) -> Result<LaunchOutcome> {
        // A malformed command-line token fails before any provider call
        if let Some(code) = self.token.as_deref() {
            validate_token_code(code)?;
        }

        let client = AwsClient::new(self.profile.as_deref()).await;
        let principal = client
            .current_principal()
            .await
            .context("Failed to identify the current principal")?;

        let token_prompt = TokenPrompt;
        let device_prompt = DevicePrompt;
        let resolver = CredentialResolver::new(
            &client,
            &token_prompt,
            &device_prompt,
            self.duration as i32,
        );

        let credentials = match self.profile.as_deref() {
            Some(profile) => {
                let path = constants::aws_credentials_path()
                    .context("Could not determine the AWS credentials file path")?;
                let store = ProfileStore::new(path);
                let identity = constants::session_profile_name(profile);
                resolver
                    .resolve(&store, &identity, &principal.user_name, self.token.as_deref())
                    .await?
            }
            None => {
                let path = constants::cache_file_path()
                    .context("Could not determine the credential cache path")?;
                let store = CacheStore::new(path);
                resolver
                    .resolve(&store, &principal.arn, &principal.user_name, self.token.as_deref())
                    .await?
            }
        };

        Ok(launcher::launch(&self.command, &credentials))
    }
}
