use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::profile::UserProfile;
use crate::store::EventStore;

/// Preferences for profile selection, stored globally.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Preferences {
    /// Last selected profile
    #[serde(default)]
    pub last_selected: Option<String>,
}

impl Preferences {
    /// Load preferences from the global preferences file
    pub fn load(data_root: &Path) -> Result<Self> {
        let prefs_file = data_root.join("global").join("preferences.json");

        if !prefs_file.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(&prefs_file).context("Failed to read preferences file")?;
        let prefs: Self =
            serde_json::from_str(&contents).context("Failed to parse preferences file")?;
        Ok(prefs)
    }

    /// Save preferences to the global preferences file
    pub fn save(&self, data_root: &Path) -> Result<()> {
        let global_dir = data_root.join("global");
        fs::create_dir_all(&global_dir).context("Failed to create global directory")?;

        let prefs_file = global_dir.join("preferences.json");
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize preferences")?;
        fs::write(&prefs_file, contents).context("Failed to write preferences file")?;
        Ok(())
    }
}

/// Picks the profile a command acts on, remembering the last interactive choice.
pub struct ProfileSelector<'a> {
    data_root: &'a Path,
    preferences: Preferences,
}

impl<'a> ProfileSelector<'a> {
    /// Create a new selector, loading preferences
    pub fn new(data_root: &'a Path) -> Result<Self> {
        let preferences = Preferences::load(data_root)?;
        Ok(Self {
            data_root,
            preferences,
        })
    }

    /// Select one profile based on the user_id flag, profile count, and preferences.
    ///
    /// Behavior:
    /// - If user_id_flag is Some, returns that profile (no UI)
    /// - If only one profile exists, returns it (no UI)
    /// - If several exist: shows a single-select UI starting at the last choice,
    ///   or errors when stdin is not a terminal
    pub fn select_profile(
        &mut self,
        store: &EventStore,
        user_id_flag: Option<String>,
    ) -> Result<UserProfile> {
        if let Some(uid) = user_id_flag {
            return store
                .get_profile(&uid)?
                .with_context(|| format!("Profile not found: {}", uid));
        }

        let mut profiles = store.list_profiles()?;

        if profiles.is_empty() {
            anyhow::bail!("No profiles found. Run 'lovemeter signup' first.");
        }

        // If only one profile exists, return it without prompting
        if profiles.len() == 1 {
            return Ok(profiles.remove(0));
        }

        if !std::io::stdin().is_terminal() {
            anyhow::bail!("Several profiles exist; pass --user-id to choose one");
        }

        self.select_single(profiles)
    }

    /// Show single-select UI for choosing one profile
    fn select_single(&mut self, mut profiles: Vec<UserProfile>) -> Result<UserProfile> {
        let uids: Vec<String> = profiles.iter().map(|p| p.uid.clone()).collect();

        let selected = match self.default_index(&uids) {
            Some(idx) => inquire::Select::new("Select profile:", uids.clone())
                .with_starting_cursor(idx)
                .prompt()?,
            None => inquire::Select::new("Select profile:", uids.clone()).prompt()?,
        };

        // Save preference
        self.preferences.last_selected = Some(selected.clone());
        self.preferences.save(self.data_root)?;

        let idx = uids
            .iter()
            .position(|uid| uid == &selected)
            .with_context(|| format!("Profile not found: {}", selected))?;
        Ok(profiles.swap_remove(idx))
    }

    /// Index of the remembered profile, if it still exists
    fn default_index(&self, uids: &[String]) -> Option<usize> {
        self.preferences
            .last_selected
            .as_ref()
            .and_then(|last| uids.iter().position(|uid| uid == last))
    }
}
