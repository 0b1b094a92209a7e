//! near-submit command line
//!
//! Key generation, mnemonic derivation, NEP-413 message signing and
//! verification, and NEAR transfers through the submission pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use near_submit::config::ClientConfig;
use near_submit::keys::{KeyPair, KeyType};
use near_submit::metrics::Metrics;
use near_submit::mnemonic::{derive_key, generate_mnemonic, hd_path_for_index};
use near_submit::nep413::{
    sign_message, verify_signature, verify_signature_with_lookup, SignMessageParams,
    SignedMessage, VerifyOptions,
};
use near_submit::nonce_manager::LocalSigner;
use near_submit::rpc_manager::JsonRpcClient;
use near_submit::structured_logging::init_logging;
use near_submit::tx_builder::{Submitter, TransactionBuilder};
use near_submit::types::{AccountId, WaitUntil};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML or JSON configuration file; the environment is used when absent
    #[arg(short, long, global = true, env = "NEAR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a random key pair
    Keygen {
        #[arg(long, default_value = "ed25519")]
        key_type: KeyType,
    },

    /// Generate a BIP-39 phrase
    Mnemonic {
        #[arg(long, default_value_t = 12)]
        words: usize,
    },

    /// Derive the Ed25519 key at m/44'/397'/<index>'
    Derive {
        #[arg(long, env = "NEAR_MNEMONIC", hide_env_values = true)]
        phrase: String,
        #[arg(long, default_value_t = 0)]
        index: u32,
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Sign an off-chain message (NEP-413) and print the request and signature as JSON
    SignMessage {
        #[arg(long)]
        account: AccountId,
        #[arg(long, env = "NEAR_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        callback_url: Option<String>,
    },

    /// Verify the JSON printed by `sign-message`
    VerifyMessage {
        /// File holding the signed message JSON
        #[arg(long)]
        input: PathBuf,
        /// Reject messages whose nonce timestamp is older than this
        #[arg(long, default_value_t = 300)]
        max_age_secs: u64,
        /// Also check on chain that the key is a full-access key of the account
        #[arg(long)]
        online: bool,
    },

    /// Transfer NEAR and wait for the outcome
    Transfer {
        #[arg(long)]
        signer: AccountId,
        #[arg(long)]
        receiver: AccountId,
        /// Amount such as "1.5 NEAR" or a plain yoctoNEAR integer
        #[arg(long)]
        amount: String,
        #[arg(long, env = "NEAR_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
        #[arg(long, default_value = "EXECUTED_OPTIMISTIC")]
        wait_until: WaitUntil,
        /// Print Prometheus metrics after the transfer
        #[arg(long)]
        metrics: bool,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct SignedMessageFile {
    params: SignMessageParams,
    signed: SignedMessage,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Command::Keygen { key_type } => {
            let key = KeyPair::generate(key_type);
            println!("public_key:  {}", key.public_key());
            println!("private_key: {}", key.to_secret_string());
        }
        Command::Mnemonic { words } => {
            println!("{}", generate_mnemonic(words).context("Failed to generate mnemonic")?);
        }
        Command::Derive {
            phrase,
            index,
            passphrase,
        } => {
            let path = hd_path_for_index(index);
            let key = derive_key(&phrase, passphrase.as_deref(), &path)
                .context("Failed to derive key")?;
            println!("path:        {}", path);
            println!("public_key:  {}", key.public_key());
            println!("private_key: {}", key.to_secret_string());
        }
        Command::SignMessage {
            account,
            private_key,
            message,
            recipient,
            callback_url,
        } => {
            let key: KeyPair = private_key.parse().context("Invalid private key")?;
            let mut params = SignMessageParams::new(message, recipient);
            if let Some(url) = callback_url {
                params = params.with_callback_url(url);
            }
            let signed = sign_message(&key, &account, &params).context("Failed to sign message")?;
            let output = serde_json::to_string_pretty(&SignedMessageFile { params, signed })?;
            println!("{}", output);
        }
        Command::VerifyMessage {
            input,
            max_age_secs,
            online,
        } => {
            let contents = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let file: SignedMessageFile =
                serde_json::from_str(&contents).context("Failed to parse signed message")?;
            let options = VerifyOptions {
                max_age: Some(Duration::from_secs(max_age_secs)),
                ..VerifyOptions::default()
            };

            let valid = if online {
                let rpc = JsonRpcClient::new(&config.network.rpc)?;
                verify_signature_with_lookup(&file.signed, &file.params, &options, &rpc).await
            } else {
                verify_signature(&file.signed, &file.params, &options)
            };
            if !valid {
                bail!("Signature is not valid for {}", file.signed.account_id);
            }
            println!("valid");
        }
        Command::Transfer {
            signer,
            receiver,
            amount,
            private_key,
            wait_until,
            metrics,
        } => {
            let key: KeyPair = private_key.parse().context("Invalid private key")?;
            let registry = Arc::new(Metrics::new().context("Failed to register metrics")?);
            let rpc = Arc::new(
                JsonRpcClient::new(&config.network.rpc)
                    .context("Failed to build RPC client")?
                    .with_metrics(Arc::clone(&registry)),
            );
            let local = LocalSigner::new(signer.clone(), key).with_retry_policy(config.retry.to_policy());
            let submitter = Submitter::from_config(&config, rpc, Arc::new(local))
                .with_metrics(Arc::clone(&registry));

            info!(
                network = %config.network.network_id,
                signer = %signer,
                receiver = %receiver,
                "Submitting transfer"
            );
            let outcome = submitter
                .send(
                    TransactionBuilder::new(signer, receiver)
                        .transfer(amount)
                        .wait_until(wait_until),
                )
                .await
                .context("Transfer failed")?;

            match outcome.transaction_hash() {
                Some(hash) => println!("transaction: {}", hash),
                None => println!("transaction submitted"),
            }
            println!("status: {:?}", outcome.status);
            if metrics {
                print!("{}", registry.gather());
            }
        }
    }

    Ok(())
}

/// Load configuration from file, or from the environment when no file is given
fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return ClientConfig::from_env().context("Failed to load configuration from environment");
    };
    let display = path.display().to_string();
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => ClientConfig::from_json_file(&display),
        _ => ClientConfig::from_toml_file(&display),
    };
    config.with_context(|| format!("Failed to load config from {}", display))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transfer_args_parse() {
        let cli = Cli::try_parse_from([
            "near-submit",
            "transfer",
            "--signer",
            "alice.testnet",
            "--receiver",
            "bob.testnet",
            "--amount",
            "1 NEAR",
            "--private-key",
            "ed25519:abc",
            "--wait-until",
            "final",
        ])
        .unwrap();

        match cli.command {
            Command::Transfer {
                signer, wait_until, ..
            } => {
                assert_eq!(signer.as_str(), "alice.testnet");
                assert_eq!(wait_until, WaitUntil::Final);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_account_is_rejected() {
        let result = Cli::try_parse_from([
            "near-submit",
            "sign-message",
            "--account",
            "Not Valid",
            "--private-key",
            "ed25519:abc",
            "--message",
            "hi",
            "--recipient",
            "app.near",
        ]);
        assert!(result.is_err());
    }
}
