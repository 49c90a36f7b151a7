//! File-backed [`SecretStore`] holding the persisted session.
//!
//! Secrets are kept as one JSON document. With a key configured the document
//! is sealed with ChaCha20-Poly1305 and only the nonce and ciphertext are
//! written to disk.

use std::{collections::HashMap, fs, path::PathBuf, sync::Mutex};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use stockfolio_core::{
    errors::Error,
    secrets::{format_service_id, SecretStore},
    Result,
};

const FORMAT_VERSION: u32 = 1;
const NONCE_LEN: usize = 12;

#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    key: Option<[u8; 32]>,
    lock: Mutex<()>,
}

#[derive(Serialize, Deserialize, Default)]
struct SecretsDocument {
    version: u32,
    secrets: HashMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct SealedDocument {
    version: u32,
    nonce: String,
    ciphertext: String,
}

impl FileSecretStore {
    pub fn open(path: PathBuf, key: Option<&str>) -> Result<Self> {
        let key = key
            .filter(|value| !value.trim().is_empty())
            .map(parse_key)
            .transpose()?;

        Ok(Self {
            path,
            key,
            lock: Mutex::new(()),
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    fn update<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Secret("Secret file lock poisoned".into()))?;
        let mut secrets = self.load()?;
        op(&mut secrets);
        self.store(secrets)
    }

    fn snapshot(&self) -> Result<HashMap<String, String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Secret("Secret file lock poisoned".into()))?;
        self.load()
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read(&self.path)?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(HashMap::new());
        }

        let value: serde_json::Value = serde_json::from_slice(&raw)?;
        let document: SecretsDocument = if value.get("ciphertext").is_some() {
            let sealed: SealedDocument = serde_json::from_value(value)?;
            serde_json::from_slice(&self.open_sealed(&sealed)?)?
        } else {
            serde_json::from_value(value)?
        };
        Ok(document.secrets)
    }

    fn open_sealed(&self, sealed: &SealedDocument) -> Result<Vec<u8>> {
        let key = self.key.ok_or_else(|| {
            Error::Secret("SF_SECRET_KEY must be set to read the encrypted secrets file".into())
        })?;
        let nonce = BASE64
            .decode(&sealed.nonce)
            .map_err(|e| Error::Secret(format!("Invalid nonce in secrets file: {e}")))?;
        if nonce.len() != NONCE_LEN {
            return Err(Error::Secret("Invalid nonce length in secrets file".into()));
        }
        let ciphertext = BASE64
            .decode(&sealed.ciphertext)
            .map_err(|e| Error::Secret(format!("Invalid ciphertext in secrets file: {e}")))?;

        ChaCha20Poly1305::new(Key::from_slice(&key))
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| Error::Secret("Failed to decrypt secrets file (wrong key?)".into()))
    }

    /// Writes to a sibling temp file first so a crash never leaves half a document.
    fn store(&self, secrets: HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = SecretsDocument {
            version: FORMAT_VERSION,
            secrets,
        };
        let json = match self.key {
            Some(key) => {
                let mut nonce = [0u8; NONCE_LEN];
                OsRng.fill_bytes(&mut nonce);
                let ciphertext = ChaCha20Poly1305::new(Key::from_slice(&key))
                    .encrypt(
                        Nonce::from_slice(&nonce),
                        serde_json::to_vec(&document)?.as_ref(),
                    )
                    .map_err(|_| Error::Secret("Failed to encrypt secrets".into()))?;
                serde_json::to_string_pretty(&SealedDocument {
                    version: FORMAT_VERSION,
                    nonce: BASE64.encode(nonce),
                    ciphertext: BASE64.encode(ciphertext),
                })?
            }
            None => serde_json::to_string_pretty(&document)?,
        };

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn set_secret(&self, service: &str, secret: &str) -> Result<()> {
        let id = format_service_id(service);
        self.update(|secrets| {
            secrets.insert(id, secret.to_string());
        })
    }

    fn get_secret(&self, service: &str) -> Result<Option<String>> {
        let id = format_service_id(service);
        Ok(self.snapshot()?.remove(&id))
    }

    fn delete_secret(&self, service: &str) -> Result<()> {
        let id = format_service_id(service);
        self.update(|secrets| {
            secrets.remove(&id);
        })
    }
}

/// Accepts base64 of 32 bytes, or 32 ascii characters.
fn parse_key(raw: &str) -> Result<[u8; 32]> {
    let trimmed = raw.trim();
    let bytes = match BASE64.decode(trimmed) {
        Ok(bytes) if bytes.len() == 32 => bytes,
        _ if trimmed.len() == 32 => trimmed.as_bytes().to_vec(),
        _ => {
            return Err(Error::Secret(
                "SF_SECRET_KEY must be base64 of 32 bytes or a 32-character ascii string".into(),
            ))
        }
    };

    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}
