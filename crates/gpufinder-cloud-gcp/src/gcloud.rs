//! gcloud CLI wrapper
//!
//! Only used to obtain credentials; every compute call goes through the
//! REST client.

use crate::error::{GcpError, Result};
use std::process::Stdio;
use tokio::process::Command;

/// Environment variable checked before falling back to gcloud
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// gcloud CLI wrapper
#[derive(Debug, Default)]
pub struct Gcloud;

impl Gcloud {
    pub fn new() -> Self {
        Self
    }

    /// Check that gcloud is on PATH
    pub async fn check_installed(&self) -> Result<()> {
        let which = Command::new("which").arg("gcloud").output().await?;

        if !which.status.success() {
            return Err(GcpError::GcloudNotFound);
        }
        Ok(())
    }

    /// Run a gcloud command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("gcloud");
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: gcloud {}", args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GcpError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Account gcloud is currently authenticated as
    pub async fn active_account(&self) -> Result<Option<String>> {
        self.check_installed().await?;
        let output = self
            .run_command(&[
                "auth",
                "list",
                "--filter=status:ACTIVE",
                "--format=value(account)",
            ])
            .await?;

        Ok(output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string))
    }

    /// OAuth access token for the active account
    pub async fn print_access_token(&self) -> Result<String> {
        self.check_installed().await?;
        let output = self
            .run_command(&["auth", "print-access-token"])
            .await
            .map_err(|e| match e {
                GcpError::CommandFailed(msg) => GcpError::AuthenticationFailed(msg),
                other => other,
            })?;

        let token = output.trim();
        if token.is_empty() {
            return Err(GcpError::AuthenticationFailed(
                "gcloud returned an empty access token".to_string(),
            ));
        }
        Ok(token.to_string())
    }
}

/// Resolve an access token: explicit value, then the environment, then gcloud
pub async fn resolve_access_token(explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        tracing::debug!("Using access token from command line");
        return Ok(token.to_string());
    }

    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        let token = token.trim();
        if !token.is_empty() {
            tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(token.to_string());
        }
    }

    tracing::debug!("Requesting access token from gcloud");
    Gcloud::new().print_access_token().await
}
