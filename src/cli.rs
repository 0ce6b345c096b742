use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::error::Result;
use crate::identity::Identity;
use crate::issuer::CaCredential;
use crate::mint::{DEFAULT_EXPIRY_YEARS, DEFAULT_KEY_LENGTH, MintRequest, mint};
use crate::persist::{CA_ROOT_CRT, CA_ROOT_KEY, OutputPaths};

#[derive(Debug, Parser)]
#[command(name = "certmint")]
#[command(version, about = "Mint a leaf TLS certificate signed by a local CA", long_about = None)]
pub struct Cli {
    #[arg(
        help = "Common name, eg. an IP address, DNS name, or client:<email> for a client certificate"
    )]
    pub common_name: String,

    #[arg(help = "Organization name")]
    pub organization: Option<String>,

    #[arg(help = "Organizational unit")]
    pub organizational_unit: Option<String>,

    #[arg(long, env = "CERTMINT_CA_CERT", default_value = CA_ROOT_CRT, help = "CA certificate PEM")]
    pub ca_cert: PathBuf,

    #[arg(long, env = "CERTMINT_CA_KEY", default_value = CA_ROOT_KEY, help = "CA private key PEM")]
    pub ca_key: PathBuf,

    #[arg(short, long, default_value = ".", help = "Directory for the .key and .crt files")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_KEY_LENGTH, help = "RSA key length in bits")]
    pub key_bits: usize,

    #[arg(long, default_value_t = DEFAULT_EXPIRY_YEARS, help = "Validity in years")]
    pub years: u32,
}

/// Mint one certificate as described by `cli` and write it to disk.
///
/// Existing outputs are detected before the CA is read or a key is generated.
pub fn run(cli: &Cli) -> Result<OutputPaths> {
    let identity = Identity::new(
        &cli.common_name,
        cli.organization.as_deref(),
        cli.organizational_unit.as_deref(),
    )?;

    let paths = OutputPaths::for_common_name(&cli.out_dir, identity.common_name())?;
    paths.ensure_absent()?;

    let ca_credential = CaCredential::load(&cli.ca_cert, &cli.ca_key)?;
    info!(
        "using CA {} / {}",
        cli.ca_cert.display(),
        cli.ca_key.display()
    );

    println!("Creating certificate (CN={})...", identity.common_name());

    let request = MintRequest::builder()
        .ca_credential(ca_credential)
        .subject(identity.subject.clone())
        .extensions(identity.extensions())
        .key_length_bits(cli.key_bits)
        .validity_years(cli.years)
        .build();
    let result = mint(&request)?;

    paths.write(&result)?;
    println!("Wrote file: {}", paths.private_key.display());
    println!("Wrote file: {}", paths.certificate.display());

    Ok(paths)
}
