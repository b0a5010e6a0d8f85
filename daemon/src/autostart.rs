//! Login-time launch entry for the current user.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENTRY_NAME: &str = "printwatch";

/// Write the login entry, logging instead of failing.
pub fn install_best_effort() {
    match install() {
        Ok(path) => log::info!("Registered login entry at {}", path.display()),
        Err(e) => log::warn!("Could not register login entry: {:#}", e),
    }
}

pub fn install() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate current executable")?;
    let dir = startup_dir()?;
    write_entry(&dir, &exe)
}

#[cfg(windows)]
fn startup_dir() -> Result<PathBuf> {
    let roaming = dirs::data_dir().context("Could not determine roaming app data directory")?;
    Ok(roaming.join("Microsoft").join("Windows").join("Start Menu").join("Programs").join("Startup"))
}

#[cfg(not(windows))]
fn startup_dir() -> Result<PathBuf> {
    let config = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config.join("autostart"))
}

fn write_entry(dir: &Path, exe: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let (path, body) = entry_for(dir, exe);
    fs::write(&path, body).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}

#[cfg(windows)]
fn entry_for(dir: &Path, exe: &Path) -> (PathBuf, String) {
    let path = dir.join(format!("{}.cmd", ENTRY_NAME));
    let body = format!("@echo off\r\nstart \"\" \"{}\"\r\n", exe.display());
    (path, body)
}

#[cfg(not(windows))]
fn entry_for(dir: &Path, exe: &Path) -> (PathBuf, String) {
    let path = dir.join(format!("{}.desktop", ENTRY_NAME));
    let body = format!(
        "[Desktop Entry]\nType=Application\nName=Print Monitor\nExec=\"{}\"\nX-GNOME-Autostart-enabled=true\n",
        exe.display()
    );
    (path, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_at_executable() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("autostart");
        let exe = PathBuf::from("/opt/printwatch/printwatch");

        let path = write_entry(&dir, &exe).unwrap();
        assert!(path.starts_with(&dir));
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains(&exe.display().to_string()));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let exe = PathBuf::from("printwatch");

        let first = write_entry(temp.path(), &exe).unwrap();
        let second = write_entry(temp.path(), &exe).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }
}
