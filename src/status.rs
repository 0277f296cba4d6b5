use anyhow::Result;
use std::path::Path;

use crate::config::{Config, CONFIG_FILENAME};
use crate::store::{EventStore, DB_FILENAME};
use crate::timefmt::format_timestamp_opt;

/// Snapshot of the local installation
pub struct InstallStatus {
    pub config_exists: bool,
    /// Effective configuration, `None` when `config.json` cannot be used
    pub config: Option<Config>,
    pub config_error: Option<String>,
    pub database_exists: bool,
    pub profiles: usize,
    pub linked_profiles: usize,
    pub events: usize,
    pub latest_event_ts: Option<i64>,
}

/// Check the state of the data root without creating anything
pub fn check_status(data_root: &Path) -> Result<InstallStatus> {
    let config_exists = data_root.join(CONFIG_FILENAME).exists();
    let (config, config_error) = match Config::load(data_root) {
        Ok(config) => (Some(config), None),
        Err(e) => (None, Some(format!("{:#}", e))),
    };
    let database_exists = data_root.join(DB_FILENAME).exists();

    if !database_exists {
        return Ok(InstallStatus {
            config_exists,
            config,
            config_error,
            database_exists,
            profiles: 0,
            linked_profiles: 0,
            events: 0,
            latest_event_ts: None,
        });
    }

    let store = EventStore::init(data_root)?;
    let profiles = store.list_profiles()?;

    Ok(InstallStatus {
        config_exists,
        config,
        config_error,
        database_exists,
        profiles: profiles.len(),
        linked_profiles: profiles.iter().filter(|p| p.partner_id.is_some()).count(),
        events: store.event_count()?,
        latest_event_ts: store.latest_event_ts()?,
    })
}

pub fn run(data_root: &Path) -> Result<()> {
    let status = check_status(data_root)?;

    println!("Data directory: {}", data_root.display());
    let config_state = match (&status.config_error, status.config_exists) {
        (Some(error), _) => format!("INVALID ({})", error),
        (None, true) => "OK".to_string(),
        (None, false) => "MISSING (using defaults)".to_string(),
    };
    println!("  {}: {}", CONFIG_FILENAME, config_state);
    println!(
        "  {}: {}",
        DB_FILENAME,
        if status.database_exists {
            "OK"
        } else {
            "MISSING"
        }
    );
    if let Some(ref config) = status.config {
        println!("  Cutoff: {}", config.cutoff.to_rfc3339());
        println!("  Calendar zone: {}", config.utc_offset);
        println!("  Milestones: {}", config.milestones.len());
    }
    println!(
        "  Profiles: {} ({} linked to a partner)",
        status.profiles, status.linked_profiles
    );
    println!("  Recorded interactions: {}", status.events);
    println!(
        "  Latest interaction: {}",
        format_timestamp_opt(status.latest_event_ts)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserProfile;
    use crate::store::EventSource;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_status_empty_data_root() {
        let temp_dir = TempDir::new().unwrap();
        let status = check_status(temp_dir.path()).unwrap();
        assert!(!status.config_exists);
        assert!(status.config_error.is_none());
        assert!(!status.database_exists);
        assert_eq!(status.events, 0);
        // Checking must not create the database
        assert!(!temp_dir.path().join(DB_FILENAME).exists());
    }

    #[test]
    fn test_status_counts() {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        {
            let store = EventStore::init(temp_dir.path()).unwrap();
            store
                .create_profile(&UserProfile::new("alice", "alice@example.org"))
                .unwrap();
            store
                .create_profile(&UserProfile::new("bob", "bob@example.org"))
                .unwrap();
            store.link_partner("alice", "bob").unwrap();
            store.append_event("alice", now).unwrap();
            store.append_event("bob", now).unwrap();
        }

        let status = check_status(temp_dir.path()).unwrap();
        assert!(status.database_exists);
        assert_eq!(status.profiles, 2);
        assert_eq!(status.linked_profiles, 1);
        assert_eq!(status.events, 2);
        assert_eq!(status.latest_event_ts, Some(now.timestamp_millis()));
    }

    #[test]
    fn test_status_reports_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            r#"{"utc_offset": "Mars/Olympus"}"#,
        )
        .unwrap();
        drop(EventStore::init(temp_dir.path()).unwrap());

        let status = check_status(temp_dir.path()).unwrap();
        assert!(status.config_exists);
        assert!(status
            .config_error
            .unwrap()
            .contains("Invalid utc_offset in config"));
        assert!(status.config.is_none());
        assert!(status.database_exists);
        assert!(run(temp_dir.path()).is_ok());
    }
}
