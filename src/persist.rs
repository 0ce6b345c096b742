//! Reading CA material from disk and writing minted output next to it.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MintError, Result};
use crate::issuer::CaCredential;
use crate::mint::MintResult;

/// Default file name of the CA certificate.
pub const CA_ROOT_CRT: &str = "rootCA.pem.crt";
/// Default file name of the CA private key.
pub const CA_ROOT_KEY: &str = "rootCA.pem.key";

impl CaCredential {
    /// Read the CA certificate and key PEM files.
    pub fn load(certificate_path: &Path, private_key_path: &Path) -> Result<Self> {
        let certificate_pem = read_pem(certificate_path)?;
        let private_key_pem = read_pem(private_key_path)?;
        Ok(Self::new(certificate_pem, private_key_pem))
    }
}

fn read_pem(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        MintError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}

/// Where the key and certificate for one common name are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub private_key: PathBuf,
    pub certificate: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<common_name>.key` and `<dir>/<common_name>.crt`.
    ///
    /// # Errors
    /// `InvalidInput` when the common name cannot be used as a file name.
    pub fn for_common_name(dir: &Path, common_name: &str) -> Result<Self> {
        if common_name.is_empty()
            || common_name == "."
            || common_name == ".."
            || common_name.contains(['/', '\\', '\0'])
        {
            return Err(MintError::InvalidInput(format!(
                "{common_name:?} cannot be used as an output file name"
            )));
        }
        Ok(Self {
            private_key: dir.join(format!("{common_name}.key")),
            certificate: dir.join(format!("{common_name}.crt")),
        })
    }

    /// Fail if either output already exists.
    pub fn ensure_absent(&self) -> Result<()> {
        for path in [&self.private_key, &self.certificate] {
            if path.exists() {
                return Err(MintError::OutputExists(path.clone()));
            }
        }
        Ok(())
    }

    /// Write the key, then the certificate.
    ///
    /// Neither file may exist beforehand. If the certificate cannot be
    /// written the key file is removed again.
    pub fn write(&self, result: &MintResult) -> Result<()> {
        write_new(&self.private_key, result.private_key_pem.as_bytes(), true)?;
        debug!("wrote {}", self.private_key.display());

        if let Err(err) = write_new(&self.certificate, result.certificate_pem.as_bytes(), false) {
            let _ = fs::remove_file(&self.private_key);
            return Err(err);
        }
        debug!("wrote {}", self.certificate.display());
        Ok(())
    }
}

fn write_new(path: &Path, contents: &[u8], secret: bool) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    if secret {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = secret;

    let mut file: File = options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            MintError::OutputExists(path.to_path_buf())
        } else {
            MintError::Io(e)
        }
    })?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}
