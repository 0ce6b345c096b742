use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs1v15::{
    Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey,
};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{MintError, Result};
use crate::pem_utils;

/// Smallest RSA modulus this crate will generate.
pub const MIN_RSA_BITS: usize = 2048;

const PRIVATE_KEY_LABELS: &[&str] = &["RSA PRIVATE KEY", "PRIVATE KEY", "EC PRIVATE KEY"];

/// Supported key types for certificate operations.
///
/// Leaf keys are always RSA; a CA key may also be ECDSA P-256.
#[derive(Debug, Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    ///
    /// # Errors
    /// `InvalidInput` when `bits` is below [`MIN_RSA_BITS`], `KeyGenerationFailed`
    /// when the generator itself fails.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        if bits < MIN_RSA_BITS {
            return Err(MintError::InvalidInput(format!(
                "RSA key length {bits} is below the {MIN_RSA_BITS}-bit minimum"
            )));
        }
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| MintError::KeyGenerationFailed(format!("RSA-{bits}: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P256SigningKey::random(&mut rng);
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Import a private key from PEM.
    ///
    /// Accepts PKCS#1 (`RSA PRIVATE KEY`), PKCS#8 (`PRIVATE KEY`, RSA or P-256)
    /// and SEC1 (`EC PRIVATE KEY`, P-256). The first key block is used; other
    /// blocks such as `EC PARAMETERS` are skipped.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let (label, der) = pem_utils::find_any_block(pem, PRIVATE_KEY_LABELS)?;
        match label.as_str() {
            "RSA PRIVATE KEY" => {
                let private = RsaPrivateKey::from_pkcs1_der(&der)
                    .map_err(|e| MintError::InvalidInput(format!("PKCS#1 key: {e}")))?;
                Ok(Self::from_rsa(private))
            }
            "PRIVATE KEY" => {
                if let Ok(private) = RsaPrivateKey::from_pkcs8_der(&der) {
                    return Ok(Self::from_rsa(private));
                }
                let secret = p256::SecretKey::from_pkcs8_der(&der).map_err(|e| {
                    MintError::InvalidInput(format!("PKCS#8 key is neither RSA nor P-256: {e}"))
                })?;
                Ok(Self::from_p256(secret))
            }
            "EC PRIVATE KEY" => {
                let secret = p256::SecretKey::from_sec1_der(&der)
                    .map_err(|e| MintError::InvalidInput(format!("SEC1 key: {e}")))?;
                Ok(Self::from_p256(secret))
            }
            other => Err(MintError::InvalidInput(format!(
                "unsupported private key PEM label: {other}"
            ))),
        }
    }

    fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }

    fn from_p256(secret: p256::SecretKey) -> Self {
        let signing_key = P256SigningKey::from(secret);
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Export the private key as PEM: PKCS#1 for RSA, PKCS#8 for P-256.
    pub fn to_pem(&self) -> Result<String> {
        match self {
            KeyPair::Rsa { private, .. } => {
                let der = private
                    .to_pkcs1_der()
                    .map_err(|e| MintError::EncodingFailed(format!("PKCS#1 key: {e}")))?;
                Ok(pem_utils::der_to_pem(der.as_bytes(), "RSA PRIVATE KEY"))
            }
            KeyPair::EcdsaP256 { signing_key, .. } => {
                let der = signing_key
                    .to_pkcs8_der()
                    .map_err(|e| MintError::EncodingFailed(format!("PKCS#8 key: {e}")))?;
                Ok(pem_utils::der_to_pem(der.as_bytes(), "PRIVATE KEY"))
            }
        }
    }

    /// Modulus length in bits (RSA) or curve size (P-256).
    pub fn bits(&self) -> usize {
        match self {
            KeyPair::Rsa { public, .. } => rsa::traits::PublicKeyParts::size(public) * 8,
            KeyPair::EcdsaP256 { .. } => 256,
        }
    }

    /// The SHA-256 based algorithm this key signs with.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_key_pair(self)
    }

    /// Subject public key info for the public half of this key pair.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.public_key().to_spki()
    }

    /// Sign `data`, returning the signature bytes as they go into a certificate.
    ///
    /// RSA signatures are PKCS#1 v1.5 over SHA-256; ECDSA signatures are
    /// DER-encoded `Ecdsa-Sig-Value`s.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Rsa { private, .. } => {
                let signing_key = RsaSigningKey::<Sha256>::new(*private.clone());
                let signature = signing_key
                    .try_sign(data)
                    .map_err(|e| MintError::SigningFailed(format!("RSA: {e}")))?;
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256 { signing_key, .. } => {
                let signature: p256::ecdsa::Signature = signing_key
                    .try_sign(data)
                    .map_err(|e| MintError::SigningFailed(format!("ECDSA P-256: {e}")))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }
}

/// The public half of a [`KeyPair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
        }
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone()),
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
        };
        spki.map_err(|e| MintError::EncodingFailed(format!("subject public key info: {e}")))
    }

    /// Decode an RSA or P-256 public key from a certificate's SPKI.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        use der::Encode;

        let der = spki.to_der()?;
        if let Ok(public) = RsaPublicKey::from_public_key_der(&der) {
            return Ok(PublicKey::Rsa(public));
        }
        let public = p256::PublicKey::from_public_key_der(&der)
            .map_err(|e| MintError::InvalidInput(format!("unsupported public key: {e}")))?;
        Ok(PublicKey::EcdsaP256(P256VerifyingKey::from(public)))
    }

    /// Check `signature` over `data` with the algorithm that matches this key.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            PublicKey::Rsa(public) => {
                let verifying_key = RsaVerifyingKey::<Sha256>::new(public.clone());
                let signature = RsaSignature::try_from(signature)
                    .map_err(|e| MintError::SigningFailed(e.to_string()))?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|e| MintError::SigningFailed(e.to_string()))
            }
            PublicKey::EcdsaP256(verifying_key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|e| MintError::SigningFailed(e.to_string()))?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|e| MintError::SigningFailed(e.to_string()))
            }
        }
    }
}
