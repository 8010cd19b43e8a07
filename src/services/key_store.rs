use crate::models::{ExchangeResult, KeyExchangeError};
use crate::utils::{create_private_dir, write_private_file};
use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use ssh_key::private::RsaKeypair;
use ssh_key::{PrivateKey, PublicKey};
use std::path::Path;
use std::time::Instant;
use tokio::fs;

pub const DEFAULT_RSA_BITS: usize = 4096;

/// Generated keypair, ready to be written out
#[derive(Debug, Clone)]
pub struct GeneratedKeyPair {
    /// PKCS#1 PEM
    pub private_pem: String,
    /// Single-line `ssh-rsa AAAA... comment`
    pub public_openssh: String,
}

/// Local RSA keypair management
#[derive(Debug, Clone)]
pub struct KeyStore {
    bits: usize,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self {
            bits: DEFAULT_RSA_BITS,
        }
    }
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key strength used when generating
    pub fn with_bits(bits: usize) -> Self {
        Self { bits }
    }

    /// Make sure both key files exist, generating a fresh pair when allowed.
    ///
    /// An existing pair is never touched. When only one half exists and
    /// `create_if_missing` is set, both files are rewritten so they match.
    pub async fn ensure(
        &self,
        private_path: &Path,
        public_path: &Path,
        create_if_missing: bool,
    ) -> ExchangeResult<()> {
        let complete = private_path.exists() && public_path.exists();

        if !complete && create_if_missing {
            if let Some(dir) = private_path.parent() {
                create_private_dir(dir).await?;
            }
            if let Some(dir) = public_path.parent() {
                create_private_dir(dir).await?;
            }

            let started = Instant::now();
            let pair = self.generate().await?;
            log::info!(
                "[key_store] Generated {}-bit RSA key in {:.2?}",
                self.bits,
                started.elapsed()
            );

            write_private_file(private_path, pair.private_pem.as_bytes()).await?;
            log::info!("[key_store] private key saved to: {}", private_path.display());

            write_private_file(public_path, format!("{}\n", pair.public_openssh).as_bytes())
                .await?;
            log::info!("[key_store] public key saved to: {}", public_path.display());
        }

        let private_exists = private_path.exists();
        let public_exists = public_path.exists();
        if !private_exists || !public_exists {
            return Err(KeyExchangeError::MissingKeys {
                private_key: private_path.to_string_lossy().to_string(),
                private_exists,
                public_key: public_path.to_string_lossy().to_string(),
                public_exists,
            });
        }

        Ok(())
    }

    /// Generate an RSA keypair off the async runtime
    pub async fn generate(&self) -> ExchangeResult<GeneratedKeyPair> {
        let bits = self.bits;
        tokio::task::spawn_blocking(move || generate_rsa_pair(bits))
            .await
            .map_err(|e| KeyExchangeError::IoError {
                message: format!("Key generation task failed: {}", e),
            })?
    }

    /// Read and validate an OpenSSH public key, returning the trimmed line
    pub async fn read_public_key(&self, public_path: &Path) -> ExchangeResult<String> {
        let content = fs::read_to_string(public_path).await.map_err(|e| {
            KeyExchangeError::IoError {
                message: format!("Failed to read {}: {}", public_path.display(), e),
            }
        })?;

        let line = content.trim();
        PublicKey::from_openssh(line)?;
        Ok(line.to_string())
    }
}

fn generate_rsa_pair(bits: usize) -> ExchangeResult<GeneratedKeyPair> {
    let rsa_private =
        RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| KeyExchangeError::InvalidKeyFormat {
            message: format!("Failed to generate RSA key: {}", e),
        })?;

    let private_pem = rsa_private
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| KeyExchangeError::InvalidKeyFormat {
            message: format!("Failed to serialize private key: {}", e),
        })?;

    // Convert to ssh-key's keypair to get the OpenSSH public encoding
    let rsa_keypair =
        RsaKeypair::try_from(rsa_private).map_err(|e| KeyExchangeError::InvalidKeyFormat {
            message: format!("Failed to convert RSA key: {}", e),
        })?;
    let private_key = PrivateKey::from(rsa_keypair);
    let public_key_openssh = private_key.public_key().to_openssh()?;

    Ok(GeneratedKeyPair {
        private_pem: private_pem.as_str().to_owned(),
        public_openssh: format!("{} {}", public_key_openssh.trim(), key_comment()),
    })
}

/// `user@hostname`, like ssh-keygen
fn key_comment() -> String {
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    format!("{}@{}", whoami::username(), host)
}
