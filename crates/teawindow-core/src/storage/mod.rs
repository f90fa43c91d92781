mod config;
pub mod database;

pub use config::Settings;
pub use database::Store;

use std::path::PathBuf;

use chrono::Local;

/// Returns `~/.config/teawindow[-dev]/` based on TEAWINDOW_ENV.
///
/// Set TEAWINDOW_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TEAWINDOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("teawindow-dev")
    } else {
        base_dir.join("teawindow")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// The local calendar day as `YYYY-MM-DD`, the key progress rows live
/// under.
pub fn today_key() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_key_is_iso_date_shaped() {
        let key = today_key();
        assert_eq!(key.len(), 10);
        let parts: Vec<&str> = key.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4);
    }
}
