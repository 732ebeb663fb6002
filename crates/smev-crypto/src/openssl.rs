//! External-OpenSSL provider for the GOST algorithm pair.
//!
//! The provider mirrors the interchange deployments that rely on an
//! `openssl` build with the GOST engine: digests run `openssl dgst -binary
//! -md_gost94`, signing adds `-sign` with the passphrase fed through stdin,
//! and verification extracts the public key from the DER certificate with
//! `openssl x509 -pubkey` before running `dgst -verify`.
//!
//! Key and signature bytes cross the process boundary only through
//! `NamedTempFile` handles, which remove the file on drop — on success,
//! verification failure and engine error alike.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CryptoProviderError;
use crate::keys::KeyMaterial;
use crate::provider::CryptoProvider;

/// Digest algorithm flag the protocol mandates (GOST R 34.11-94).
pub const DEFAULT_DIGEST_ALGORITHM: &str = "md_gost94";

/// `CryptoProvider` backed by an external `openssl` binary.
#[derive(Debug, Clone)]
pub struct OpensslProvider {
    openssl: PathBuf,
    digest_algorithm: String,
}

impl Default for OpensslProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpensslProvider {
    /// Provider invoking `openssl` from `PATH` with the mandated GOST
    /// digest algorithm.
    pub fn new() -> Self {
        Self {
            openssl: PathBuf::from("openssl"),
            digest_algorithm: DEFAULT_DIGEST_ALGORITHM.to_string(),
        }
    }

    /// Override the path to the `openssl` binary.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.openssl = path.into();
        self
    }

    /// Override the digest algorithm flag (e.g. for an engine that
    /// registers the GOST algorithms under a different name).
    pub fn with_digest_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.digest_algorithm = algorithm.into();
        self
    }

    fn digest_flag(&self) -> String {
        format!("-{}", self.digest_algorithm)
    }

    /// Run the engine with `input` on stdin and return its stdout.
    fn run(&self, args: &[&str], input: &[u8]) -> Result<EngineOutput, CryptoProviderError> {
        debug!(args = ?args, "invoking openssl");
        let mut child = Command::new(&self.openssl)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // Dropping the handle closes the pipe so the engine sees EOF.
            stdin.write_all(input)?;
        }
        let output = child.wait_with_output()?;
        Ok(EngineOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

struct EngineOutput {
    success: bool,
    stdout: Vec<u8>,
    stderr: String,
}

impl EngineOutput {
    fn expect_success(self, context: &str) -> Result<Vec<u8>, CryptoProviderError> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(CryptoProviderError::Engine(format!(
                "{context}: {}",
                self.stderr.trim()
            )))
        }
    }
}

impl CryptoProvider for OpensslProvider {
    fn digest(&self, data: &[u8]) -> Result<String, CryptoProviderError> {
        let flag = self.digest_flag();
        let out = self
            .run(&["dgst", "-binary", &flag], data)?
            .expect_success("digest")?;
        Ok(BASE64.encode(out))
    }

    fn sign(&self, data: &[u8], key: &KeyMaterial) -> Result<String, CryptoProviderError> {
        // The key travels through a scoped temporary file; the passphrase
        // is prepended to the payload on stdin, the way `-passin stdin`
        // consumes it.
        let mut key_file = NamedTempFile::new()?;
        key_file.write_all(key.pem_bytes())?;
        key_file.flush()?;
        let key_path = key_file.path().to_string_lossy().into_owned();

        let mut input = Vec::with_capacity(key.passphrase().len() + 1 + data.len());
        input.extend_from_slice(key.passphrase().as_bytes());
        input.push(b'\n');
        input.extend_from_slice(data);

        let flag = self.digest_flag();
        let out = self
            .run(
                &["dgst", "-sign", &key_path, "-binary", &flag, "-passin", "stdin"],
                &input,
            )?
            .expect_success("sign")?;
        Ok(BASE64.encode(out))
    }

    fn verify(
        &self,
        data: &[u8],
        certificate_der: &[u8],
        signature: &str,
    ) -> Result<bool, CryptoProviderError> {
        let pubkey_pem = self
            .run(&["x509", "-inform", "DER", "-pubkey", "-noout"], certificate_der)?
            .expect_success("public key extraction")?;

        let cleaned: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
        let signature_bytes = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| CryptoProviderError::InvalidSignatureEncoding(e.to_string()))?;

        let mut pubkey_file = NamedTempFile::new()?;
        pubkey_file.write_all(&pubkey_pem)?;
        pubkey_file.flush()?;
        let mut signature_file = NamedTempFile::new()?;
        signature_file.write_all(&signature_bytes)?;
        signature_file.flush()?;

        let pubkey_path = pubkey_file.path().to_string_lossy().into_owned();
        let signature_path = signature_file.path().to_string_lossy().into_owned();

        let flag = self.digest_flag();
        let out = self.run(
            &[
                "dgst",
                &flag,
                "-verify",
                &pubkey_path,
                "-signature",
                &signature_path,
            ],
            data,
        )?;
        if out.success {
            return Ok(true);
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        if stdout.contains("Verification Failure") || out.stderr.contains("Verification Failure") {
            debug!("openssl reported verification failure");
            return Ok(false);
        }
        Err(CryptoProviderError::Engine(format!(
            "verify: {}",
            out.stderr.trim()
        )))
    }
}
