//! Cross-platform application paths

use std::fs;
use std::path::{Path, PathBuf};

use epo::config::Preferences;
use tracing::{info, warn};

use crate::error::PlayerError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, PlayerError> {
        let base = dirs::data_dir().ok_or(PlayerError::NoDataDir)?;
        Self::at(base.join("epo"))
    }

    /// Paths rooted at `data_dir`, created if missing.
    pub fn at(data_dir: PathBuf) -> Result<Self, PlayerError> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn preferences_file(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    /// Stored preferences, or the defaults when the file is missing. A file
    /// that fails to parse is reported and replaced by the defaults in memory.
    pub fn load_preferences(&self) -> Preferences {
        let path = self.preferences_file();
        match fs::read_to_string(&path) {
            Ok(raw) => Preferences::from_json(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), "ignoring preferences: {e}");
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        }
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<(), PlayerError> {
        let path = self.preferences_file();
        fs::write(&path, prefs.to_json()?)?;
        info!(path = %path.display(), "preferences saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epo::config::EffectIntensity;

    fn scratch(name: &str) -> AppPaths {
        let dir = std::env::temp_dir().join(format!("epo-player-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        AppPaths::at(dir).expect("temp dir is writable")
    }

    #[test]
    fn preferences_persist() {
        let paths = scratch("persist");
        assert_eq!(paths.load_preferences(), Preferences::default());
        let prefs = Preferences::default().with_effect_intensity(EffectIntensity::Strong);
        paths.save_preferences(&prefs).expect("writes");
        assert_eq!(paths.load_preferences(), prefs);
        let _ = fs::remove_dir_all(paths.data_dir());
    }

    #[test]
    fn corrupt_file_falls_back() {
        let paths = scratch("corrupt");
        fs::write(paths.preferences_file(), "{{{").expect("writes");
        assert_eq!(paths.load_preferences(), Preferences::default());
        let _ = fs::remove_dir_all(paths.data_dir());
    }
}
