use anyhow::Context;
use chrono::{TimeZone, Utc};
use clap::Subcommand;

use crate::auth::TokenService;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a bearer token")]
    Issue {
        #[arg(long, help = "Subject (user id) the token is issued to")]
        subject: String,
        #[arg(long, help = "Email recorded in the token")]
        email: String,
        #[arg(long, help = "Session id (random when omitted)")]
        session: Option<String>,
    },

    #[command(about = "Verify a bearer token and print its claims")]
    Verify {
        #[arg(help = "Token to verify")]
        token: String,
    },
}

fn format_epoch(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let tokens = TokenService::from_config().context("JWT_SECRET is missing")?;

    match cmd {
        TokenCommands::Issue { subject, email, session } => {
            let token = tokens.issue(&subject, &email, session.as_deref())?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(serde_json::json!({
                        "accessToken": token,
                        "tokenType": "Bearer",
                        "expiresIn": tokens.lifetime_secs(),
                    })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::Verify { token } => {
            let claims = tokens.verify(&token).context("Token rejected")?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token valid",
                    Some(serde_json::json!({ "claims": claims })),
                ),
                OutputFormat::Text => {
                    println!("✓ Token valid");
                    println!("User: {}", claims.user_id);
                    println!("Email: {}", claims.email);
                    println!("Session: {}", claims.jti);
                    println!("Issued: {}", format_epoch(claims.iat));
                    println!("Expires: {}", format_epoch(claims.exp));
                    Ok(())
                }
            }
        }
    }
}
