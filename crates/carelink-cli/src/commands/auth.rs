use anyhow::{Context, Result};
use carelink_client::AuthService;
use colored::Colorize;

use crate::cli::{BiometricsCommands, LoginArgs, OutputFormat};
use crate::output::{print_error, print_field, print_json, print_success};

pub async fn login(auth: &AuthService, args: &LoginArgs, server: &str) -> Result<()> {
    if args.biometric {
        auth.login_with_biometrics()
            .await
            .context("Biometric sign-in failed, sign in with your password")?;
        print_success(&format!("Signed in to {} with biometrics", server.cyan()));
        return Ok(());
    }

    let email = args.email.as_deref().context("--email is required")?;
    let password = args
        .password
        .as_deref()
        .context("--password is required (or set CARELINK_PASSWORD)")?;
    let provider = auth.login(email, password).await.context("Sign-in failed")?;
    print_success(&format!(
        "Signed in to {} as {}",
        server.cyan(),
        provider.display_name().cyan()
    ));
    Ok(())
}

pub async fn logout(auth: &AuthService, profile: &str) -> Result<()> {
    if !auth.is_authenticated() && !auth.has_biometric_login() {
        println!("No session found for profile \"{profile}\"");
        return Ok(());
    }
    auth.logout().await;
    print_success("Signed out (session erased)");
    Ok(())
}

pub async fn whoami(auth: &AuthService, profile: &str, format: OutputFormat) -> Result<()> {
    if !auth.is_authenticated() {
        print_error(&format!("Not signed in (profile: \"{profile}\")"));
        return Ok(());
    }
    let provider = auth.current_user().await.context("Failed to load profile")?;
    match format {
        OutputFormat::Json => print_json(&provider)?,
        OutputFormat::Table => {
            print_field("Profile", profile);
            print_field("Name", &provider.display_name());
            print_field("Email", &provider.email);
            if let Some(role) = &provider.role {
                print_field("Role", role);
            }
            if let Some(practice) = &provider.practice_name {
                print_field("Practice", practice);
            }
            let biometrics = if auth.has_biometric_login() {
                "enabled"
            } else {
                "disabled"
            };
            print_field("Biometrics", biometrics);
        }
    }
    Ok(())
}

pub fn biometrics(auth: &AuthService, command: &BiometricsCommands) -> Result<()> {
    match command {
        BiometricsCommands::Enable => {
            auth.enable_biometrics()
                .context("Sign in before enabling biometric sign-in")?;
            print_success("Biometric sign-in enabled");
        }
        BiometricsCommands::Disable => {
            auth.disable_biometrics()?;
            print_success("Biometric sign-in disabled");
        }
    }
    Ok(())
}
