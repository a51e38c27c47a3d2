//! Helpers for reading configuration files.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Format an error message for a problem with the given input file
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// The deserialized TOML data or an error if the file is invalid.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        id: String,
        value: f64,
    }

    #[test]
    fn read_toml_valid() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("record.toml");

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"natgas\"\nvalue = 1.5").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "natgas".to_string(),
                value: 1.5
            }
        );
    }

    #[test]
    fn read_toml_missing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("nope.toml");
        assert!(read_toml::<Record>(&file_path).is_err());
    }
}
