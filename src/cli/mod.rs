pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic CLI - Operator tools for the appointment API payload cipher and tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Encrypt plaintext into a `data` payload")]
    Encrypt {
        #[arg(help = "Plaintext, usually a JSON document")]
        plaintext: String,
    },

    #[command(about = "Decrypt a `data` payload")]
    Decrypt {
        #[arg(help = "Base64 ciphertext")]
        ciphertext: String,
    },

    #[command(about = "Issue and verify bearer tokens")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Encrypt { plaintext } => commands::crypto::encrypt(&plaintext, output_format),
        Commands::Decrypt { ciphertext } => commands::crypto::decrypt(&ciphertext, output_format),
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
    }
}
