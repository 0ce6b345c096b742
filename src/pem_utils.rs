use crate::error::{MintError, Result};

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}

/// Find the first PEM block whose label is one of `labels`, returning the
/// label and DER contents. Blocks with other labels are skipped.
pub fn find_any_block(pem_str: &str, labels: &[&str]) -> Result<(String, Vec<u8>)> {
    let blocks = pem::parse_many(pem_str).map_err(|e| MintError::InvalidInput(e.to_string()))?;
    blocks
        .into_iter()
        .find(|block| labels.iter().any(|label| *label == block.tag()))
        .map(|block| (block.tag().to_string(), block.contents().to_vec()))
        .ok_or_else(|| {
            MintError::InvalidInput(format!("no {} block found", labels.join(" or ")))
        })
}

/// Find the first PEM block carrying `label` in a bundle that may hold several.
pub fn find_block(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    find_any_block(pem_str, &[label]).map(|(_, der)| der)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_block_skips_other_labels() {
        let bundle = format!(
            "{}{}",
            der_to_pem(&[1, 2, 3], "PRIVATE KEY"),
            der_to_pem(&[4, 5, 6], "CERTIFICATE")
        );
        assert_eq!(find_block(&bundle, "CERTIFICATE").unwrap(), vec![4, 5, 6]);
        assert!(find_block(&bundle, "X509 CRL").is_err());
    }

    #[test]
    fn test_find_any_block_reports_label() {
        let bundle = format!(
            "{}{}",
            der_to_pem(&[1], "EC PARAMETERS"),
            der_to_pem(&[9, 9], "EC PRIVATE KEY")
        );
        let (label, der) = find_any_block(&bundle, &["PRIVATE KEY", "EC PRIVATE KEY"]).unwrap();
        assert_eq!(label, "EC PRIVATE KEY");
        assert_eq!(der, vec![9, 9]);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(find_any_block("not a pem block", &["PRIVATE KEY"]).is_err());
    }
}
