use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(test)]
use anyhow::{anyhow, bail};
#[cfg(test)]
use jsonschema::{Draft, JSONSchema};

/// Rolling counters for one actor, derived from their interaction events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatsSnapshot {
    pub today: u32,
    pub this_week: u32,
    pub this_month: u32,
    pub this_year: u32,
    pub peak_day: PeakDay,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            today: 0,
            this_week: 0,
            this_month: 0,
            this_year: 0,
            peak_day: PeakDay::none(),
        }
    }
}

/// Busiest local date. `date == None` is the "no peak" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PeakDay {
    pub date: Option<NaiveDate>,
    pub count: u32,
}

impl PeakDay {
    pub fn none() -> Self {
        Self {
            date: None,
            count: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.date.is_none()
    }
}

/// One bar of the 7-day chart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub label: String,
    pub count: u32,
}

/// Seven consecutive local dates ending today, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeeklySeries {
    pub label_key: String,
    pub points: Vec<SeriesPoint>,
}

impl WeeklySeries {
    pub fn total(&self) -> u32 {
        self.points.iter().map(|p| p.count).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.points.iter().map(|p| p.count).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Account {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Stats and chart for one direction (sent by the user, or received from the partner).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Section {
    pub title: String,
    pub stats: StatsSnapshot,
    pub weekly: WeeklySeries,
}

/// Full dashboard report, as rendered to Markdown or written as JSON.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dashboard {
    pub schema_version: i32,
    pub generated_at: String,
    pub cutoff: String,
    pub zone: String,
    pub account: Account,
    pub sent: Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<Account>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<Section>,
}

impl Dashboard {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dashboard file: {}", path.display()))?;

        let dashboard: Dashboard = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from: {}", path.display()))?;

        Ok(dashboard)
    }

    #[cfg(test)]
    /// Validate dashboard JSON against the JSON schema
    pub fn validate_with_schema(json: &serde_json::Value, schema: &JSONSchema) -> Result<()> {
        match schema.validate(json) {
            Ok(_) => Ok(()),
            Err(errors) => {
                let error_messages: Vec<String> = errors
                    .map(|e| format!("  - {}: {}", e.instance_path, e))
                    .collect();
                bail!("Dashboard validation failed:\n{}", error_messages.join("\n"))
            }
        }
    }

    #[cfg(test)]
    /// Load and compile the JSON schema
    pub fn load_schema(schema_path: &Path) -> Result<JSONSchema> {
        let schema_content = std::fs::read_to_string(schema_path)
            .with_context(|| format!("Failed to read schema file: {}", schema_path.display()))?;

        let schema_json: serde_json::Value =
            serde_json::from_str(&schema_content).with_context(|| {
                format!(
                    "Failed to parse schema JSON from: {}",
                    schema_path.display()
                )
            })?;

        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_json)
            .map_err(|e| anyhow!("Failed to compile JSON schema: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn get_schema_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stats_schema.json")
    }

    fn get_example_dashboard_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/example-dashboard.json")
    }

    fn minimal_dashboard() -> serde_json::Value {
        json!({
            "schema_version": 1,
            "generated_at": "2024-06-10",
            "cutoff": "2024-01-01T00:00:00Z",
            "zone": "UTC",
            "account": { "user_id": "alice" },
            "sent": {
                "title": "Thoughts Sent",
                "stats": {
                    "today": 0,
                    "this_week": 0,
                    "this_month": 0,
                    "this_year": 0,
                    "peak_day": { "date": null, "count": 0 }
                },
                "weekly": { "label_key": "Clicks", "points": [] }
            }
        })
    }

    #[test]
    fn test_load_schema() {
        let result = Dashboard::load_schema(&get_schema_path());
        assert!(result.is_ok(), "Failed to load schema: {:?}", result.err());
    }

    #[test]
    fn test_validate_example_dashboard() {
        let schema = Dashboard::load_schema(&get_schema_path()).unwrap();
        let path = get_example_dashboard_path();
        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        let result = Dashboard::validate_with_schema(&value, &schema);
        assert!(result.is_ok(), "Example validation failed: {:?}", result.err());

        let dashboard = Dashboard::load_from_file(&path).unwrap();
        assert_eq!(dashboard.schema_version, 1);
        assert!(dashboard.received.is_some());
        assert_eq!(dashboard.sent.weekly.points.len(), 7);
    }

    #[test]
    fn test_validate_minimal_dashboard() {
        let schema = Dashboard::load_schema(&get_schema_path()).unwrap();
        let result = Dashboard::validate_with_schema(&minimal_dashboard(), &schema);
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_validate_missing_required_field() {
        let schema = Dashboard::load_schema(&get_schema_path()).unwrap();
        let mut value = minimal_dashboard();
        value.as_object_mut().unwrap().remove("sent");

        let result = Dashboard::validate_with_schema(&value, &schema);
        assert!(result.is_err(), "Should fail validation for missing 'sent'");
        let err_msg = format!("{:?}", result.err().unwrap());
        assert!(err_msg.contains("sent"), "Error should mention missing field");
    }

    #[test]
    fn test_validate_negative_count() {
        let schema = Dashboard::load_schema(&get_schema_path()).unwrap();
        let mut value = minimal_dashboard();
        value["sent"]["stats"]["today"] = json!(-1);

        let result = Dashboard::validate_with_schema(&value, &schema);
        assert!(result.is_err(), "Should fail validation for negative count");
    }

    #[test]
    fn test_validate_invalid_peak_date() {
        let schema = Dashboard::load_schema(&get_schema_path()).unwrap();
        let mut value = minimal_dashboard();
        value["sent"]["stats"]["peak_day"] = json!({ "date": "June 10", "count": 2 });

        let result = Dashboard::validate_with_schema(&value, &schema);
        assert!(result.is_err(), "Should fail validation for invalid date format");
    }

    #[test]
    fn test_validate_additional_properties() {
        let schema = Dashboard::load_schema(&get_schema_path()).unwrap();
        let mut value = minimal_dashboard();
        value["account"]["unexpected_field"] = json!("should fail");

        let result = Dashboard::validate_with_schema(&value, &schema);
        assert!(result.is_err(), "Should fail validation for additional properties");
    }

    #[test]
    fn test_peak_day_sentinel_serializes_null_date() {
        let value = serde_json::to_value(PeakDay::none()).unwrap();
        assert_eq!(value, json!({ "date": null, "count": 0 }));
    }

    #[test]
    fn test_weekly_series_totals() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let series = WeeklySeries {
            label_key: "Clicks".to_string(),
            points: vec![
                SeriesPoint {
                    date,
                    label: "Jun 10".to_string(),
                    count: 3,
                },
                SeriesPoint {
                    date,
                    label: "Jun 10".to_string(),
                    count: 5,
                },
            ],
        };
        assert_eq!(series.total(), 8);
        assert_eq!(series.max_count(), 5);
    }
}
