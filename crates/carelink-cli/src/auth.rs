use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use carelink_auth::{BiometricError, BiometricGate, FileVault};

use crate::config::carelink_dir;

fn vault_path(profile: &str) -> Result<PathBuf> {
    Ok(carelink_dir()?.join(format!("vault.{profile}.json")))
}

/// Token vault of one profile.
pub fn open_vault(profile: &str, namespace: &str) -> Result<FileVault> {
    Ok(FileVault::with_namespace(vault_path(profile)?, namespace))
}

/// Presence check for terminals: the user confirms at the prompt.
///
/// A terminal has no sensor, so typing `y` stands in for the biometric
/// match. Non-interactive runs report the gate as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalGate;

#[async_trait]
impl BiometricGate for TerminalGate {
    async fn confirm(&self, reason: &str) -> Result<bool, BiometricError> {
        if !io::stdin().is_terminal() {
            return Err(BiometricError::Unavailable);
        }
        let reason = reason.to_string();
        tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            confirm_with(&mut stdin.lock(), &mut io::stderr(), &reason)
        })
        .await
        .map_err(|e| BiometricError::Prompt(e.to_string()))?
    }
}

fn confirm_with(
    input: &mut impl BufRead,
    output: &mut impl Write,
    reason: &str,
) -> Result<bool, BiometricError> {
    let prompt_err = |e: io::Error| BiometricError::Prompt(e.to_string());
    write!(output, "{reason} [y/N] ").map_err(prompt_err)?;
    output.flush().map_err(prompt_err)?;
    let mut line = String::new();
    input.read_line(&mut line).map_err(prompt_err)?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_accepts_yes() {
        let mut out = Vec::new();
        let confirmed =
            confirm_with(&mut "Yes\n".as_bytes(), &mut out, "Unlock CareLink?").unwrap();
        assert!(confirmed);
        assert_eq!(String::from_utf8(out).unwrap(), "Unlock CareLink? [y/N] ");
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut out = Vec::new();
        assert!(!confirm_with(&mut "\n".as_bytes(), &mut out, "Unlock?").unwrap());
        assert!(!confirm_with(&mut "".as_bytes(), &mut out, "Unlock?").unwrap());
    }
}
