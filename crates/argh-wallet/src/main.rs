//! argh-wallet
//!
//! CLI wallet: generates secp256k1 keypairs and builds `personal_sign`-signed
//! transfer transactions. There is no RPC surface to submit to, so
//! `transfer` prints the signed transaction as canonical JSON for the caller
//! to relay however they see fit.
//!
//! Usage:
//!   argh-wallet keygen   [--keyfile <path>]
//!   argh-wallet transfer --to <address> --asset <asset> --amount <decimal> --nonce <n> [--chain-id <id>] [--keyfile <path>]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use argh_core::{compute_txid, signing_message, Action, Address, Amount, Asset, Transaction};
use argh_crypto::EthKeyPair;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "argh-wallet",
    version,
    about = "Wallet — build and sign transfers"
)]
struct Args {
    /// Path to the keyfile (JSON, holds the raw secp256k1 secret as hex).
    #[arg(long, global = true, default_value = "~/.argh/wallet.json")]
    keyfile: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new secp256k1 keypair and save it to the keyfile.
    Keygen,

    /// Build, sign, and print a `transfer` transaction as canonical JSON.
    Transfer {
        /// Recipient address (0x-prefixed hex).
        #[arg(long)]
        to: String,
        /// Asset symbol, e.g. ARGH.
        #[arg(long)]
        asset: String,
        /// Amount as a decimal string, e.g. "12.5".
        #[arg(long)]
        amount: String,
        /// Sender's next nonce.
        #[arg(long)]
        nonce: u64,
        /// Chain id.
        #[arg(long, default_value_t = 1)]
        chain_id: u64,
    },
}

// ── Keyfile ───────────────────────────────────────────────────────────────────

#[derive(serde::Serialize, serde::Deserialize)]
struct KeyfileContents {
    secret_hex: String,
    address: String,
}

fn load_keypair(keyfile: &Path) -> anyhow::Result<EthKeyPair> {
    let raw = fs::read_to_string(keyfile)
        .with_context(|| format!("reading keyfile {}", keyfile.display()))?;
    let contents: KeyfileContents =
        serde_json::from_str(&raw).context("parsing keyfile — is it a valid wallet keyfile?")?;
    let bytes = hex::decode(&contents.secret_hex).context("decoding keyfile secret")?;
    if bytes.len() != 32 {
        bail!("keyfile secret must be 32 bytes, got {}", bytes.len());
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    EthKeyPair::from_bytes(&arr).context("keyfile secret is not a valid secp256k1 scalar")
}

fn save_keypair(keyfile: &Path, kp: &EthKeyPair) -> anyhow::Result<()> {
    if keyfile.exists() {
        bail!(
            "Keyfile {} already exists. Delete it first to generate a new key.",
            keyfile.display()
        );
    }
    if let Some(parent) = keyfile.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating keyfile directory {}", parent.display()))?;
    }
    let contents = KeyfileContents {
        secret_hex: hex::encode(kp.secret_bytes()),
        address: kp.address.to_hex(),
    };
    fs::write(keyfile, serde_json::to_string_pretty(&contents)?)
        .with_context(|| format!("writing keyfile {}", keyfile.display()))?;
    Ok(())
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let keyfile = expand_tilde(&args.keyfile);

    match args.command {
        Command::Keygen => cmd_keygen(&keyfile),
        Command::Transfer {
            to,
            asset,
            amount,
            nonce,
            chain_id,
        } => cmd_transfer(&keyfile, to, asset, amount, nonce, chain_id),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_keygen(keyfile: &Path) -> anyhow::Result<()> {
    let kp = EthKeyPair::generate();
    save_keypair(keyfile, &kp)?;
    info!(address = %kp.address, keyfile = %keyfile.display(), "generated wallet keypair");
    println!("Generated new keypair.");
    println!("Address:  {}", kp.address.to_hex());
    println!("Keyfile:  {}", keyfile.display());
    println!("\nBack up your keyfile. Loss = permanent loss of funds.");
    Ok(())
}

fn cmd_transfer(
    keyfile: &Path,
    to: String,
    asset: String,
    amount: String,
    nonce: u64,
    chain_id: u64,
) -> anyhow::Result<()> {
    let kp = load_keypair(keyfile)?;
    let to_addr =
        Address::from_hex(&to).map_err(|e| anyhow::anyhow!("invalid --to address: {e}"))?;
    let amount = Amount::from_decimal_str(&amount).context("parsing --amount")?;

    let action = Action::Transfer {
        asset: Asset::new(asset),
        amount,
        to: to_addr,
    };
    let txid = compute_txid(&action, nonce, chain_id);
    let mut tx = Transaction {
        txid,
        sender: kp.address,
        action,
        nonce,
        chain_id,
        timestamp: chrono::Utc::now().timestamp(),
        signature: None,
    };
    tx.signature = Some(kp.personal_sign(&signing_message(&tx)));

    let output = json!({
        "txid": tx.txid.to_hex(),
        "sender": tx.sender.to_hex(),
        "action": tx.action.name(),
        "asset": tx.action.asset().map(|a| a.as_str().to_string()),
        "amount": tx.action.amount().map(|a| a.to_decimal_string()),
        "to": tx.action.to().map(|a| a.to_hex()),
        "nonce": tx.nonce,
        "chainId": tx.chain_id,
        "timestamp": tx.timestamp,
        "signature": tx.signature.as_ref().expect("just assigned above").to_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
