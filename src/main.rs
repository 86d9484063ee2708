//! token-warden - Pluggable authentication and authorization core
//!
//! Command-line companion: hashes passwords for the `users` section, validates
//! configuration files and evaluates authorization decisions offline.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

use token_warden::auth::hash_password;
use token_warden::authz::Decision;
use token_warden::config::Config;
use token_warden::i18n::{MessageProvider, DEFAULT_LOCALE};
use token_warden::logging::{init_from_config, init_tracing};
use token_warden::models::AccessRequest;
use token_warden::store::IdentityProvider;
use token_warden::{AppError, AuthError, SecurityContext};

/// token-warden - Pluggable authentication and authorization core
#[derive(Parser, Debug)]
#[command(name = "token-warden")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an Argon2id hash for a password
    HashPassword {
        /// Password to hash
        password: String,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// Path to the configuration file
        #[arg(short, long, env = "TOKEN_WARDEN_CONFIG")]
        config: PathBuf,
    },

    /// Evaluate an authorization decision for a configured user
    Decide {
        /// Path to the configuration file
        #[arg(short, long, env = "TOKEN_WARDEN_CONFIG")]
        config: PathBuf,

        /// Username of the principal
        #[arg(short, long)]
        user: String,

        /// Resource path
        #[arg(short, long)]
        resource: String,

        /// Action performed on the resource
        #[arg(short, long)]
        action: Option<String>,

        /// Locale for denial messages
        #[arg(long, default_value = DEFAULT_LOCALE)]
        locale: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::HashPassword { password } => {
            init_tracing("warn", "pretty")?;
            let hash = hash_password(&password).map_err(|e| AppError::Internal(e.to_string()))?;
            println!("{}", hash);
        }
        Command::CheckConfig { config } => {
            let config = load_config(&config)?;
            let context = SecurityContext::from_config(&config).map_err(AppError::from)?;
            println!(
                "{}",
                json!({
                    "valid": true,
                    "users": config.users.len(),
                    "acl_entries": config.acl.len(),
                    "lockout": context.features.login_attempt_enabled,
                    "captcha": context.features.captcha_enabled,
                    "federation": context.features.federation_enabled,
                    "default_policy": context.features.default_policy,
                })
            );
        }
        Command::Decide {
            config,
            user,
            resource,
            action,
            locale,
        } => {
            let config = load_config(&config)?;
            let context = SecurityContext::from_config(&config).map_err(AppError::from)?;
            decide(&context, &user, &resource, action, &locale).await?;
        }
    }

    Ok(())
}

/// Read the file, apply environment overrides and install logging
fn load_config(path: &Path) -> Result<Config, AppError> {
    let config = Config::from_file(path)?.with_env_overrides()?;

    init_from_config(&config.logging).map_err(|e| AppError::Internal(e.to_string()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

async fn decide(
    context: &SecurityContext,
    username: &str,
    resource: &str,
    action: Option<String>,
    locale: &str,
) -> Result<(), AppError> {
    let principal = context
        .identity
        .load_user(username)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::CredentialsInvalid)?;

    let mut request = AccessRequest::new(principal, resource);
    if let Some(action) = action {
        request = request.with_action(action);
    }

    let outcome = context.authorization.decide(&request).await;
    debug!(username, resource, allowed = outcome.is_ok(), "Decision evaluated");

    println!("{}", report(context, &outcome, locale));
    outcome.map(|_| ()).map_err(AppError::from)
}

fn report(
    context: &SecurityContext,
    outcome: &Result<Decision, AuthError>,
    locale: &str,
) -> serde_json::Value {
    match outcome {
        Ok(Decision::Granted) => json!({ "allowed": true, "reason": "granted" }),
        Ok(Decision::DefaultPermit) => json!({ "allowed": true, "reason": "default_policy" }),
        Err(err) => json!({
            "allowed": false,
            "reason": err.message_key(),
            "message": context.messages.describe(err, locale),
        }),
    }
}
