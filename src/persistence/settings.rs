use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::diagram::routing::DEFAULT_CURVE_OFFSET;
use crate::diagram::store::DEFAULT_SPAWN_EXTENT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // If None, use OS default storage directory for diagrams
    #[serde(default)]
    pub storage_override: Option<PathBuf>,
    // If None, use OS temporary directory for exports
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    // Workspace whose diagram is opened on start; None is the default workspace
    #[serde(default)]
    pub workspace: Option<String>,
    // Threat statements shown in the threat panel
    #[serde(default)]
    pub threats_path: Option<PathBuf>,
    #[serde(default = "AppSettings::default_spawn_extent")]
    pub spawn_extent: f32,
    #[serde(default = "AppSettings::default_curve_offset")]
    pub curve_offset: f32,
    #[serde(default = "AppSettings::default_min_zoom")]
    pub min_zoom: f32,
    #[serde(default = "AppSettings::default_max_zoom")]
    pub max_zoom: f32,
    // The first fit-to-content never zooms in beyond this
    #[serde(default = "AppSettings::default_initial_fit_max_zoom")]
    pub initial_fit_max_zoom: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_override: None,
            export_override: None,
            workspace: None,
            threats_path: None,
            spawn_extent: Self::default_spawn_extent(),
            curve_offset: Self::default_curve_offset(),
            min_zoom: Self::default_min_zoom(),
            max_zoom: Self::default_max_zoom(),
            initial_fit_max_zoom: Self::default_initial_fit_max_zoom(),
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Flow-Loom
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Flow-Loom");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Flow-Loom
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Flow-Loom");
            }
            return PathBuf::from("Flow-Loom");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Flow-Loom or ~/.config/Flow-Loom
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Flow-Loom");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Flow-Loom");
        }
    }

    fn storage_default_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            return Self::config_dir().join("Diagrams");
        }
        #[cfg(target_os = "windows")]
        {
            // %LOCALAPPDATA%\Flow-Loom\Diagrams else config dir
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                return PathBuf::from(local).join("Flow-Loom").join("Diagrams");
            }
            return Self::config_dir().join("Diagrams");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_DATA_HOME/flow-loom or ~/.local/share/flow-loom, else /tmp/Flow-Loom
            if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
                return PathBuf::from(xdg).join("flow-loom");
            }
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(".local").join("share").join("flow-loom");
            }
            return PathBuf::from("/tmp").join("Flow-Loom");
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_dir())
    }

    pub fn load_from(dir: &std::path::Path) -> anyhow::Result<Self> {
        let json_path = dir.join("settings.json");
        if json_path.exists() {
            let mut f = fs::File::open(json_path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = serde_json::from_str(&s)?;
            return Ok(v);
        }
        // Migrate from legacy RON if present
        let ron_path = dir.join("settings.ron");
        if ron_path.exists() {
            let mut f = fs::File::open(&ron_path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = ron::from_str(&s)?;
            if let Err(e) = v.save_to(dir) {
                log::warn!("could not migrate settings to JSON: {}", e);
            }
            return Ok(v);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_dir())
    }

    pub fn save_to(&self, dir: &std::path::Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(dir.join("settings.json"))?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn storage_dir(&self) -> PathBuf {
        if let Some(p) = &self.storage_override { return p.clone(); }
        Self::storage_default_dir()
    }

    /// Return the directory where the settings file (settings.json) is stored.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    /// Default export directory when no override is set: {temp_dir}/Flow-Loom/exports
    pub fn export_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push("Flow-Loom");
        p.push("exports");
        p
    }

    pub fn export_dir(&self) -> PathBuf {
        if let Some(p) = &self.export_override { return p.clone(); }
        Self::export_default_dir()
    }

    pub(crate) fn default_spawn_extent() -> f32 { DEFAULT_SPAWN_EXTENT }
    pub(crate) fn default_curve_offset() -> f32 { DEFAULT_CURVE_OFFSET }
    pub(crate) fn default_min_zoom() -> f32 { 0.2 }
    pub(crate) fn default_max_zoom() -> f32 { 4.0 }
    pub(crate) fn default_initial_fit_max_zoom() -> f32 { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = AppSettings::load_from(dir.path()).unwrap();
        assert_eq!(s, AppSettings::default());
        assert_eq!(s.max_zoom, 4.0);
    }

    #[test]
    fn json_round_trip_and_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = AppSettings::default();
        s.workspace = Some("payments".into());
        s.save_to(dir.path()).unwrap();
        assert_eq!(AppSettings::load_from(dir.path()).unwrap(), s);

        fs::write(dir.path().join("settings.json"), r#"{"storage_override": null, "curve_offset": 40.0}"#).unwrap();
        let partial = AppSettings::load_from(dir.path()).unwrap();
        assert_eq!(partial.curve_offset, 40.0);
        assert_eq!(partial.min_zoom, 0.2);
    }

    #[test]
    fn legacy_ron_is_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = AppSettings::default();
        s.spawn_extent = 50.0;
        fs::write(dir.path().join("settings.ron"), ron::to_string(&s).unwrap()).unwrap();
        let loaded = AppSettings::load_from(dir.path()).unwrap();
        assert_eq!(loaded.spawn_extent, 50.0);
        assert!(dir.path().join("settings.json").exists());
    }
}
