//! # Command Line
//!
//! `connect-kit` subcommands. Everything except `chain-id` works offline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ck_01_chain_client::{ChainApi, ChainClient, HttpTransport, TransportConfig};
use ck_03_config_store::{FileStorage, PersistedEnvelope, Storage, DEFAULT_STORAGE_KEY};
use clap::{Parser, Subcommand};
use shared_crypto::{derive_address, key_hash_from_credential_id, key_hash_from_public_key, new_user_salt, sign_bytes};
use shared_types::{AccountType, Addr, ChainId, Hash256, Message};

/// connect-kit: wallet connection toolkit
#[derive(Parser, Debug)]
#[command(name = "connect-kit", version)]
#[command(about = "Offline helpers and chain probes for connect-kit")]
pub struct Args {
    /// Log filter, overrides CK_LOG_LEVEL
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Address of a contract instantiated by DEPLOYER from CODE_HASH with SALT
    DeriveAddress {
        #[arg(long)]
        deployer: Addr,
        #[arg(long)]
        code_hash: Hash256,
        /// Hex-encoded salt
        #[arg(long)]
        salt: String,
    },

    /// Account salt for a new user
    Salt {
        #[arg(long)]
        username: String,
        #[arg(long)]
        key_hash: Hash256,
        #[arg(long, default_value = "spot")]
        account_type: AccountType,
    },

    /// Fingerprint of a secp256k1 public key or a passkey credential id
    KeyHash {
        /// Hex-encoded compressed SEC1 public key
        #[arg(long, conflicts_with = "credential_id", required_unless_present = "credential_id")]
        public_key: Option<String>,
        /// Hex-encoded WebAuthn credential id
        #[arg(long)]
        credential_id: Option<String>,
    },

    /// Sign bytes of a transaction
    SignBytes {
        /// JSON array of messages
        #[arg(long)]
        msgs: String,
        #[arg(long)]
        sender: Addr,
        #[arg(long)]
        chain_id: String,
        #[arg(long, default_value_t = 0)]
        sequence: u32,
    },

    /// Print the persisted session envelope
    InspectStore {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long, default_value = DEFAULT_STORAGE_KEY)]
        key: String,
    },

    /// Query a node for its chain id
    ChainId {
        #[arg(long, default_value = "http://localhost:26657")]
        rpc_url: String,
    },
}

/// Run a subcommand and return what it prints.
pub async fn execute(command: Command) -> Result<String> {
    match command {
        Command::DeriveAddress {
            deployer,
            code_hash,
            salt,
        } => {
            let salt = decode_hex("salt", &salt)?;
            Ok(derive_address(&deployer, &code_hash, &salt).to_string())
        }

        Command::Salt {
            username,
            key_hash,
            account_type,
        } => {
            let salt = new_user_salt(&username, &key_hash, account_type).context("Failed to build salt")?;
            Ok(hex::encode(salt))
        }

        Command::KeyHash {
            public_key,
            credential_id,
        } => match (public_key, credential_id) {
            (Some(public_key), _) => Ok(key_hash_from_public_key(&decode_hex("public key", &public_key)?).to_string()),
            (None, Some(credential_id)) => {
                Ok(key_hash_from_credential_id(&decode_hex("credential id", &credential_id)?).to_string())
            }
            (None, None) => bail!("either --public-key or --credential-id is required"),
        },

        Command::SignBytes {
            msgs,
            sender,
            chain_id,
            sequence,
        } => {
            let msgs: Vec<Message> = serde_json::from_str(&msgs).context("Invalid messages JSON")?;
            let hash = sign_bytes(&msgs, &sender, &ChainId::new(chain_id), sequence)
                .context("Failed to compute sign bytes")?;
            Ok(hash.to_string())
        }

        Command::InspectStore { dir, key } => inspect_store(dir, &key),

        Command::ChainId { rpc_url } => {
            let transport = HttpTransport::new(&rpc_url, &TransportConfig::default())
                .with_context(|| format!("Failed to build transport for {rpc_url}"))?;
            let client = ChainClient::new(Arc::new(transport));
            let info = client.query_info().await.context("Chain info query failed")?;
            Ok(info.chain_id.to_string())
        }
    }
}

fn inspect_store(dir: PathBuf, key: &str) -> Result<String> {
    let storage = FileStorage::new(&dir).with_context(|| format!("Failed to open {}", dir.display()))?;
    let Some(raw) = storage.get_item(key).context("Failed to read persisted state")? else {
        return Ok(format!("no persisted state under {key}"));
    };
    let envelope: PersistedEnvelope = serde_json::from_str(&raw).context("Persisted state is not a valid envelope")?;
    serde_json::to_string_pretty(&envelope).context("Failed to render envelope")
}

fn decode_hex(what: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).with_context(|| format!("Invalid hex {what}"))
}
