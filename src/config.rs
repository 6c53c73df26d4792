use crate::settings::{CfgDefaultKeymaps, Keymap, Settings};
use eyre::Result;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{fs, path::PathBuf};

const APP_DIR: &str = "novel-reader";
const LEGACY_APP_DIR: &str = ".novel-reader";

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub keymap: Keymap,
    keymap_user_dict: CfgDefaultKeymaps, // Used for building help menu text
    filepath: PathBuf,
}

/// Overlay the user's entries on the defaults one key at a time, so a
/// single mistyped value does not discard the rest of the section.
fn overlay_section<T>(user_config: &Value, section: &str) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    let defaults = T::default();
    let Some(user_map) = user_config.get(section).and_then(Value::as_object) else {
        return defaults;
    };
    let Ok(Value::Object(mut merged)) = serde_json::to_value(&defaults) else {
        return defaults;
    };

    for (key, value) in user_map {
        let Some(current) = merged.get(key) else {
            tracing::warn!("unknown configuration entry {}.{}", section, key);
            continue;
        };
        if compatible(current, value) {
            let mut candidate: Map<String, Value> = merged.clone();
            candidate.insert(key.clone(), value.clone());
            if serde_json::from_value::<T>(Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
                continue;
            }
        }
        tracing::warn!("ignoring invalid configuration value for {}.{}", section, key);
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(defaults)
}

fn compatible(default: &Value, user: &Value) -> bool {
    match (default, user) {
        // Option fields serialize as null by default
        (Value::Null, _) => true,
        (_, Value::Null) => false,
        (Value::Bool(_), Value::Bool(_)) => true,
        (Value::Number(_), Value::Number(_)) => true,
        (Value::String(_), Value::String(_)) => true,
        _ => false,
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join("configuration.json");

        if !filepath.exists() {
            // Save initial config if it doesn't exist
            let config = Self::with_settings_at(
                Settings::default(),
                CfgDefaultKeymaps::default(),
                filepath,
            );
            config.save()?;
            return Ok(config);
        }

        Self::load_from(filepath)
    }

    /// Get the configuration file path
    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    /// Get the user-configured keymap dictionary (used for help menu text)
    pub fn keymap_user_dict(&self) -> &CfgDefaultKeymaps {
        &self.keymap_user_dict
    }

    fn with_settings_at(
        settings: Settings,
        keymap_user_dict: CfgDefaultKeymaps,
        filepath: PathBuf,
    ) -> Self {
        let keymap = Keymap::from_user_dict(&keymap_user_dict);
        Self {
            settings,
            keymap,
            keymap_user_dict,
            filepath,
        }
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let config_json = serde_json::json!({
            "Setting": self.settings,
            "Keymap": self.keymap_user_dict,
        });

        let config_str = serde_json::to_string_pretty(&config_json)?;

        // Ensure directory exists before writing
        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.filepath, config_str)?;
        Ok(())
    }

    /// Load configuration from a custom path. A missing file yields defaults.
    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();
        let mut keymap_user_dict = CfgDefaultKeymaps::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<Value>(&config_str) {
                Ok(user_config) => {
                    settings = overlay_section(&user_config, "Setting");
                    keymap_user_dict = overlay_section(&user_config, "Keymap");
                }
                Err(err) => {
                    tracing::warn!("{} is not valid JSON ({}); using defaults", filepath.display(), err);
                }
            }
        }

        Ok(Self::with_settings_at(settings, keymap_user_dict, filepath))
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        let path = PathBuf::from(config_home).join(APP_DIR);
        return Ok(path);
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join(APP_DIR);
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(LEGACY_APP_DIR));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(LEGACY_APP_DIR));
    }

    Err(eyre::eyre!(
        "Could not determine application data directory"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Action, CfgDefaultKeymaps, Settings};
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use tempfile::tempdir;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("lock env mutex")
    }

    fn set_test_environment(dir: &tempfile::TempDir) {
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.path());
            env::remove_var("HOME");
            env::remove_var("USERPROFILE");
        }
    }

    fn restore_test_environment(
        original_home: Option<std::ffi::OsString>,
        original_xdg_config_home: Option<std::ffi::OsString>,
        original_userprofile: Option<std::ffi::OsString>,
    ) {
        unsafe {
            if let Some(home) = original_home {
                env::set_var("HOME", home);
            } else {
                env::remove_var("HOME");
            }
            if let Some(xdg) = original_xdg_config_home {
                env::set_var("XDG_CONFIG_HOME", xdg);
            } else {
                env::remove_var("XDG_CONFIG_HOME");
            }
            if let Some(profile) = original_userprofile {
                env::set_var("USERPROFILE", profile);
            } else {
                env::remove_var("USERPROFILE");
            }
        }
    }

    #[test]
    fn test_config_new_no_existing_file() -> Result<()> {
        let _env_lock = lock_env();
        let original_home = env::var_os("HOME");
        let original_xdg_config_home = env::var_os("XDG_CONFIG_HOME");
        let original_userprofile = env::var_os("USERPROFILE");

        let dir = tempdir()?;
        set_test_environment(&dir);

        let config = Config::new()?;
        let expected_filepath = dir.path().join("novel-reader").join("configuration.json");

        assert_eq!(config.filepath, expected_filepath);
        assert!(expected_filepath.exists());

        let config_str = fs::read_to_string(&expected_filepath)?;
        let json_value: Value = serde_json::from_str(&config_str)?;

        let loaded_settings: Settings = serde_json::from_value(json_value["Setting"].clone())?;
        assert_eq!(loaded_settings, Settings::default());

        let loaded_keymaps: CfgDefaultKeymaps =
            serde_json::from_value(json_value["Keymap"].clone())?;
        assert_eq!(loaded_keymaps, CfgDefaultKeymaps::default());

        restore_test_environment(
            original_home,
            original_xdg_config_home,
            original_userprofile,
        );
        Ok(())
    }

    #[test]
    fn test_config_new_with_existing_file() -> Result<()> {
        let _env_lock = lock_env();
        let original_home = env::var_os("HOME");
        let original_xdg_config_home = env::var_os("XDG_CONFIG_HOME");
        let original_userprofile = env::var_os("USERPROFILE");

        let dir = tempdir()?;
        set_test_environment(&dir);

        let config_path = dir.path().join("novel-reader").join("configuration.json");
        fs::create_dir_all(config_path.parent().unwrap())?;

        let config_json = serde_json::json!({
            "Setting": {
                "default_source": "https://example.org/novels",
                "request_timeout_secs": 15
            },
            "Keymap": {
                "quit": "Q",
                "next_chapter": "n"
            }
        });
        fs::write(&config_path, serde_json::to_string(&config_json)?)?;

        let config = Config::new()?;
        assert_eq!(config.settings.default_source, "https://example.org/novels");
        assert_eq!(config.settings.request_timeout_secs, Some(15));
        assert_eq!(config.keymap_user_dict().quit, "Q");
        assert_eq!(config.keymap.action_for('n'), Some(Action::NextChapter));

        restore_test_environment(
            original_home,
            original_xdg_config_home,
            original_userprofile,
        );
        Ok(())
    }

    #[test]
    fn test_invalid_entries_are_ignored_individually() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("custom.json");
        let config_json = serde_json::json!({
            "Setting": {
                "show_progress_indicator": "yes",
                "text_width": 60,
                "no_such_setting": 1
            },
            "Keymap": {
                "help": 42
            }
        });
        fs::write(&path, serde_json::to_string(&config_json)?)?;

        let config = Config::load_from(path.clone())?;
        assert!(config.settings.show_progress_indicator);
        assert_eq!(config.settings.text_width, 60);
        assert_eq!(config.keymap_user_dict().help, "?");
        assert_eq!(config.filepath(), &path);
        Ok(())
    }

    #[test]
    fn test_load_from_garbage_or_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json")?;
        let config = Config::load_from(path)?;
        assert_eq!(config.settings, Settings::default());

        let missing = Config::load_from(dir.path().join("missing.json"))?;
        assert_eq!(missing.settings, Settings::default());
        Ok(())
    }

    #[test]
    fn test_get_app_data_prefix() {
        let _env_lock = lock_env();
        let original_home = env::var_os("HOME");
        let original_xdg_config_home = env::var_os("XDG_CONFIG_HOME");
        let original_userprofile = env::var_os("USERPROFILE");

        unsafe {
            // XDG_CONFIG_HOME
            let xdg_dir = tempdir().unwrap();
            env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
            env::remove_var("HOME");
            env::remove_var("USERPROFILE");
            assert_eq!(get_app_data_prefix().unwrap(), xdg_dir.path().join("novel-reader"));

            // HOME/.config
            let home_dir = tempdir().unwrap();
            let config_dir = home_dir.path().join(".config").join("novel-reader");
            fs::create_dir_all(&config_dir).unwrap();
            env::set_var("HOME", home_dir.path());
            env::remove_var("XDG_CONFIG_HOME");
            assert_eq!(get_app_data_prefix().unwrap(), config_dir);

            // HOME/.novel-reader
            let home_dir_legacy = tempdir().unwrap();
            env::set_var("HOME", home_dir_legacy.path());
            assert_eq!(
                get_app_data_prefix().unwrap(),
                home_dir_legacy.path().join(".novel-reader")
            );

            // USERPROFILE (Windows)
            let profile_dir = tempdir().unwrap();
            env::set_var("USERPROFILE", profile_dir.path());
            env::remove_var("HOME");
            assert_eq!(
                get_app_data_prefix().unwrap(),
                profile_dir.path().join(".novel-reader")
            );

            env::remove_var("USERPROFILE");
            assert!(get_app_data_prefix().is_err());

            restore_test_environment(
                original_home,
                original_xdg_config_home,
                original_userprofile,
            );
        }
    }

    #[test]
    fn test_config_save_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("configuration.json");

        let settings = Settings {
            text_width: 50,
            ..Settings::default()
        };
        let keymaps = CfgDefaultKeymaps {
            scroll_up: "K".to_string(),
            ..CfgDefaultKeymaps::default()
        };
        let config = Config::with_settings_at(settings, keymaps, path.clone());
        config.save()?;

        let reloaded = Config::load_from(path)?;
        assert_eq!(reloaded.settings.text_width, 50);
        assert_eq!(reloaded.keymap_user_dict().scroll_up, "K");
        assert_eq!(reloaded.keymap.action_for('K'), Some(Action::ScrollUp));
        Ok(())
    }
}
