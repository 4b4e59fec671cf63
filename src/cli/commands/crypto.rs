use anyhow::Context;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::crypto::PayloadCipher;

fn cipher() -> anyhow::Result<PayloadCipher> {
    PayloadCipher::from_config().context("ENCRYPTION_KEY is missing or unusable")
}

pub fn encrypt(plaintext: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let data = cipher()?.encrypt(plaintext)?;

    match output_format {
        OutputFormat::Json => output_success(&output_format, "Encrypted", Some(json!({ "data": data }))),
        OutputFormat::Text => {
            println!("{}", data);
            Ok(())
        }
    }
}

pub fn decrypt(ciphertext: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let plaintext = cipher()?
        .decrypt_to_string(ciphertext)
        .context("Ciphertext could not be decrypted")?;

    match output_format {
        OutputFormat::Json => {
            // embed JSON payloads as-is, anything else as a string
            let payload = serde_json::from_str(&plaintext).unwrap_or_else(|_| json!(plaintext));
            output_success(&output_format, "Decrypted", Some(json!({ "plaintext": payload })))
        }
        OutputFormat::Text => {
            println!("{}", plaintext);
            Ok(())
        }
    }
}
