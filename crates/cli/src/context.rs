//! Data directory layout and ledger loading shared by the commands.
//!
//! ```text
//! <data-dir>/
//!   config.json   ledger settings written by `init`
//!   chain/        sled database with the block snapshot
//!   keys/         wallet keypairs (`<name>.json`)
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use starchain_chain::{Ledger, LedgerConfig};
use starchain_core::{Ed25519Verifier, Keypair, SystemClock, CHALLENGE_WINDOW_SECS};
use starchain_storage::{ChainStore, Storage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Contents of `config.json`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub challenge_window_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            challenge_window_secs: CHALLENGE_WINDOW_SECS,
        }
    }
}

impl From<&ChainConfig> for LedgerConfig {
    fn from(config: &ChainConfig) -> Self {
        LedgerConfig {
            challenge_window_secs: config.challenge_window_secs,
            ..LedgerConfig::default()
        }
    }
}

/// A wallet keypair file.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    address: String,
    public_key: String,
    private_key: String,
}

pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.root.join("keys")
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    fn chain_path(&self) -> PathBuf {
        self.root.join("chain")
    }

    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    pub fn open_storage(&self) -> Result<Storage> {
        Storage::open(self.chain_path()).with_context(|| {
            format!(
                "Failed to open chain storage in {}",
                self.chain_path().display()
            )
        })
    }

    pub fn save_config(&self, config: &ChainConfig) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data directory: {:?}", self.root))?;
        fs::write(self.config_path(), serde_json::to_string_pretty(config)?)?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<ChainConfig> {
        let contents = fs::read_to_string(self.config_path())
            .context("Failed to read config.json. Did you run 'starchain init'?")?;
        serde_json::from_str(&contents).context("Invalid config.json")
    }

    /// Rebuild the ledger from the stored snapshot.
    pub fn open_ledger(&self, storage: &Storage) -> Result<Ledger> {
        let config = self.load_config()?;
        let blocks = ChainStore::new(storage)
            .load_snapshot()?
            .context("No chain found. Did you run 'starchain init'?")?;

        Ledger::from_blocks(
            blocks,
            LedgerConfig::from(&config),
            Arc::new(Ed25519Verifier),
            Arc::new(SystemClock),
        )
        .context("Stored chain cannot be loaded")
    }

    /// Write any new blocks of `ledger` to storage. Returns how many were written.
    pub fn persist(&self, storage: &Storage, ledger: &Ledger) -> Result<usize> {
        ChainStore::new(storage)
            .save_snapshot(&ledger.snapshot())
            .context("Failed to save chain")
    }

    pub fn save_keypair(&self, name: &str, keypair: &Keypair) -> Result<PathBuf> {
        let keys_dir = self.keys_dir();
        fs::create_dir_all(&keys_dir)?;

        let key_file = keys_dir.join(format!("{}.json", name));
        if key_file.exists() {
            bail!("Keypair file already exists: {}", key_file.display());
        }

        let contents = KeyFile {
            address: keypair.address().to_hex(),
            public_key: hex::encode(keypair.public_key.as_bytes()),
            private_key: hex::encode(keypair.private_key()),
        };
        fs::write(&key_file, serde_json::to_string_pretty(&contents)?)?;
        Ok(key_file)
    }

    pub fn load_keypair(&self, name: &str) -> Result<Keypair> {
        let key_file = self.keys_dir().join(format!("{}.json", name));
        if !key_file.exists() {
            bail!(
                "Keypair file not found: {}. Use 'starchain wallet new' to create one.",
                key_file.display()
            );
        }

        let contents = fs::read_to_string(&key_file)?;
        let key: KeyFile = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid keypair file: {}", key_file.display()))?;

        let private_key_bytes = hex::decode(&key.private_key).context("Invalid private key hex")?;
        let private_key: [u8; 32] = private_key_bytes.as_slice().try_into().with_context(|| {
            format!(
                "Invalid private key length: expected 32 bytes, got {}",
                private_key_bytes.len()
            )
        })?;

        Ok(Keypair::from_private_key(&private_key))
    }

    /// Names and addresses of the stored keypairs, sorted by name.
    pub fn list_keypairs(&self) -> Result<Vec<(String, String)>> {
        let keys_dir = self.keys_dir();
        if !keys_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&keys_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key: KeyFile = serde_json::from_str(&fs::read_to_string(&path)?)
                .with_context(|| format!("Invalid keypair file: {}", path.display()))?;
            entries.push((name.to_string(), key.address));
        }
        entries.sort();
        Ok(entries)
    }
}
