use anyhow::{Context, Result};
use dialoguer::{Input, Select, theme::ColorfulTheme};

use crate::{
    aws::MfaDevice,
    constants::TOKEN_CODE_LENGTH,
    resolver::{DeviceSelector, TokenSource},
};

/// Interactive MFA token prompt, re-prompting until the code is well-formed
pub struct TokenPrompt;

impl TokenSource for TokenPrompt {
    fn token_code(&self) -> Result<String> {
        let code = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("MFA token code")
            .validate_with(|input: &String| {
                if input.len() == TOKEN_CODE_LENGTH {
                    Ok(())
                } else {
                    Err(format!("token codes are {TOKEN_CODE_LENGTH} characters"))
                }
            })
            .interact_text()
            .context("Failed to read MFA token code")?;

        Ok(code)
    }
}

/// Interactive chooser for accounts with more than one MFA device
pub struct DevicePrompt;

impl DeviceSelector for DevicePrompt {
    fn select(&self, devices: &[MfaDevice]) -> Result<MfaDevice> {
        let labels: Vec<String> = devices.iter().map(MfaDevice::label).collect();

        let index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Choose an MFA device")
            .items(&labels)
            .default(0)
            .interact()
            .context("Failed to read MFA device choice")?;

        Ok(devices[index].clone())
    }
}
