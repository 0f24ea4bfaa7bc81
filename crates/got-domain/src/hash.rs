use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Streams `path` through SHA-256 and returns the lowercase hex digest.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; 64 * 1024];
    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn is_valid_checksum(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn hashes_file_contents() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("data.bin");
        fs::write(&path, b"hello world")?;
        assert_eq!(
            file_sha256(&path)?,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        Ok(())
    }

    #[test]
    fn checksum_validation_requires_64_hex_chars() {
        assert!(is_valid_checksum(&"a".repeat(64)));
        assert!(!is_valid_checksum(&"a".repeat(63)));
        assert!(!is_valid_checksum(&"g".repeat(64)));
    }
}
