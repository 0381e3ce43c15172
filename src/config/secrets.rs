//! File-mounted secrets.
//!
//! A secret named `db_password` is read from `$DB_PASSWORD_FILE` when set,
//! otherwise from `/run/secrets/db_password`. Values are trimmed and never
//! logged.

use std::fs;
use std::path::{Path, PathBuf};

const SECRETS_DIR: &str = "/run/secrets";

/// Path a secret is read from.
pub fn secret_path(name: &str) -> PathBuf {
    let env_key = format!("{}_FILE", name.to_uppercase());
    match std::env::var(&env_key) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => Path::new(SECRETS_DIR).join(name),
    }
}

/// Read a secret, `None` when the file is missing or empty.
pub fn read_secret(name: &str) -> Option<String> {
    read_secret_from(&secret_path(name), name)
}

pub(crate) fn read_secret_from(path: &Path, name: &str) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let value = content.trim();
            if value.is_empty() {
                tracing::warn!(secret = name, "Secret file is empty");
                None
            } else {
                Some(value.to_string())
            }
        }
        Err(e) => {
            tracing::debug!(secret = name, path = ?path, error = %e, "Secret not found");
            None
        }
    }
}

/// Which secrets were found at startup. Values are not kept here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecretPresence {
    pub db_password: bool,
    pub api_key: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_secret_trims() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  s3cret  ").unwrap();
        assert_eq!(read_secret_from(file.path(), "db_password").as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_empty_or_missing_secret() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(read_secret_from(file.path(), "api_key"), None);

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_secret_from(&dir.path().join("missing"), "api_key"), None);
    }

    #[test]
    fn test_default_secret_path() {
        assert_eq!(
            secret_path("visit_counter_test_unset"),
            PathBuf::from("/run/secrets/visit_counter_test_unset")
        );
    }
}
