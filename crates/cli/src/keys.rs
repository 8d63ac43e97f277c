//! Platform key pair generation.

use std::fs;
use std::path::Path;

use tbep_common::request_signing::Keypair;

use crate::error::CliError;

pub const PRIVATE_KEY_FILE: &str = "platform_private_key.pem";
pub const PUBLIC_KEY_FILE: &str = "platform_public_key.pem";

/// Generate an RSA key pair and write both halves as PEM into `out_dir`.
///
/// Existing key files are never overwritten.
pub fn generate(out_dir: &Path, bits: usize, verbose: bool) -> Result<(), CliError> {
    let private_path = out_dir.join(PRIVATE_KEY_FILE);
    let public_path = out_dir.join(PUBLIC_KEY_FILE);

    for path in [&private_path, &public_path] {
        if path.exists() {
            return Err(CliError::Config(format!(
                "Refusing to overwrite existing file: {}",
                path.display()
            )));
        }
    }

    if verbose {
        println!("Generating {}-bit RSA key pair...", bits);
    }

    let keypair = Keypair::generate(bits)?;
    let private_pem = keypair.private_key_pem()?;
    let public_pem = keypair.public_key_pem()?;

    fs::create_dir_all(out_dir)?;
    write_private(&private_path, &private_pem)?;
    fs::write(&public_path, public_pem)?;

    println!("Private key: {}", private_path.display());
    println!("Public key:  {}", public_path.display());
    println!("Register the public key with the platform and keep the private key secret.");

    Ok(())
}

#[cfg(unix)]
fn write_private(path: &Path, pem: &str) -> Result<(), CliError> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(pem.as_bytes())?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, pem: &str) -> Result<(), CliError> {
    fs::write(path, pem)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbep_common::request_signing::{parse_private_key, parse_public_key};
    use tempfile::TempDir;

    #[test]
    fn test_generate_writes_parsable_pair() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("keys");

        generate(&out_dir, 1024, false).unwrap();

        let private_pem = fs::read_to_string(out_dir.join(PRIVATE_KEY_FILE)).unwrap();
        let public_pem = fs::read_to_string(out_dir.join(PUBLIC_KEY_FILE)).unwrap();
        let private_key = parse_private_key(&private_pem).expect("should parse private key");
        let public_key = parse_public_key(&public_pem).expect("should parse public key");

        assert_eq!(private_key.to_public_key(), public_key);
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PUBLIC_KEY_FILE), "existing").unwrap();

        let result = generate(dir.path(), 1024, false);
        assert!(matches!(result, Err(CliError::Config(_))));
        assert_eq!(
            fs::read_to_string(dir.path().join(PUBLIC_KEY_FILE)).unwrap(),
            "existing"
        );
    }
}
