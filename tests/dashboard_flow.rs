use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use lovemeter::aggregator::StatsAggregator;
use lovemeter::config::{Config, Milestone};
use lovemeter::counter::milestone_counters;
use lovemeter::dashboard::build_dashboard;
use lovemeter::event::StoredTimestamp;
use lovemeter::profile::{ProfileUpdate, UserProfile};
use lovemeter::renderer::md;
use lovemeter::stats::Dashboard;
use lovemeter::store::{EventSource, EventStore};

fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
}

fn signup(store: &EventStore, uid: &str, name: Option<&str>) {
    let mut profile = UserProfile::new(uid, format!("{}@example.org", uid));
    profile.apply(ProfileUpdate {
        display_name: name.map(str::to_string),
        ..ProfileUpdate::default()
    });
    store.create_profile(&profile).unwrap();
}

#[test]
fn test_couple_dashboard_end_to_end() {
    let data_root = TempDir::new().unwrap();
    let config = Config {
        utc_offset: "+02:00".to_string(),
        ..Config::default()
    };
    config.save(data_root.path()).unwrap();
    let config = Config::load(data_root.path()).unwrap();

    let store = EventStore::init(data_root.path()).unwrap();
    signup(&store, "alice", Some("Alice"));
    signup(&store, "bob", Some("Bob"));
    store.link_partner("alice", "bob").unwrap();
    store.link_partner("bob", "alice").unwrap();

    // Before the cutoff: shows in neither counters nor peak
    store.append_event("alice", at(1, 1, 0)).unwrap();
    // 22:30 UTC on Jun 9 is already Jun 10 at +02:00
    store
        .append_event("alice", Utc.with_ymd_and_hms(2024, 6, 9, 22, 30, 0).unwrap())
        .unwrap();
    store.append_event("alice", at(6, 10, 8)).unwrap();
    store.append_event("alice", at(6, 3, 8)).unwrap();
    store.append_event("bob", at(6, 10, 7)).unwrap();
    // Corrupt timestamp is ignored rather than failing the dashboard
    store
        .insert_raw(
            "bob",
            Some(StoredTimestamp {
                seconds: 1_718_000_000,
                nanoseconds: -5,
            }),
        )
        .unwrap();
    store.insert_raw("bob", None).unwrap();

    let now = at(6, 10, 12);
    let alice = store.get_profile("alice").unwrap().unwrap();
    let bob = store.get_profile("bob").unwrap().unwrap();
    let aggregator = StatsAggregator::new(config.zone().unwrap());
    let dashboard =
        build_dashboard(&store, &alice, Some(&bob), &aggregator, config.cutoff, now).unwrap();

    assert_eq!(dashboard.zone, "+02:00");
    assert_eq!(dashboard.sent.stats.today, 2);
    // Jun 9 (Sun) starts the week at +02:00, Jun 3 is the week before
    assert_eq!(dashboard.sent.stats.this_week, 2);
    assert_eq!(dashboard.sent.stats.this_month, 3);
    assert_eq!(dashboard.sent.stats.this_year, 3);
    assert_eq!(dashboard.sent.stats.peak_day.count, 2);
    assert_eq!(
        dashboard.sent.stats.peak_day.date.map(|d| d.to_string()),
        Some("2024-06-10".to_string())
    );

    let received = dashboard.received.as_ref().unwrap();
    assert_eq!(received.title, "Bob's Thoughts");
    assert_eq!(received.stats.today, 1);
    assert_eq!(received.weekly.total(), 1);

    let markdown = md::render(&dashboard).unwrap();
    assert!(markdown.contains("## 🎁 Bob's Thoughts"));
    assert!(markdown.contains("2 clicks on Jun 10, 2024"));

    // JSON report survives a trip through a file
    let json_path = data_root.path().join("lovemeter-alice.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&dashboard).unwrap()).unwrap();
    let loaded = Dashboard::load_from_file(&json_path).unwrap();
    assert_eq!(loaded.sent.stats, dashboard.sent.stats);
    assert_eq!(loaded.sent.weekly, dashboard.sent.weekly);
}

#[test]
fn test_unlinked_partner_shows_no_received_section() {
    let data_root = TempDir::new().unwrap();
    let store = EventStore::init(data_root.path()).unwrap();
    signup(&store, "alice", None);

    let alice = store.get_profile("alice").unwrap().unwrap();
    let dashboard = build_dashboard(
        &store,
        &alice,
        None,
        &StatsAggregator::default(),
        Config::default().cutoff,
        at(6, 10, 12),
    )
    .unwrap();

    assert!(dashboard.received.is_none());
    assert!(dashboard.sent.stats.peak_day.is_none());
    assert_eq!(dashboard.sent.weekly.points.len(), 7);
    assert!(md::render(&dashboard)
        .unwrap()
        .contains("Connect with your partner"));
}

#[test]
fn test_events_survive_reopening_the_store() {
    let data_root = TempDir::new().unwrap();
    {
        let store = EventStore::init(data_root.path()).unwrap();
        signup(&store, "alice", None);
        store.append_event("alice", at(6, 10, 9)).unwrap();
    }

    let store = EventStore::init(data_root.path()).unwrap();
    let events = store.fetch_events("alice").unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].occurred_at, Some(at(6, 10, 9)));
}

#[test]
fn test_milestone_counters_from_config() {
    let config = Config {
        milestones: vec![Milestone {
            label: "Since our love story began".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
        }],
        ..Config::default()
    };

    let counters = milestone_counters(&config.milestones, at(6, 10, 12), &config.zone().unwrap());
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].days, 117);
}

#[test]
fn test_timestamp_past_zone_calendar_does_not_break_dashboard() {
    let data_root = TempDir::new().unwrap();
    let store = EventStore::init(data_root.path()).unwrap();
    signup(&store, "alice", None);
    store.append_event("alice", at(6, 10, 9)).unwrap();
    store
        .insert_raw(
            "alice",
            Some(StoredTimestamp {
                seconds: DateTime::<Utc>::MAX_UTC.timestamp(),
                nanoseconds: 0,
            }),
        )
        .unwrap();

    let alice = store.get_profile("alice").unwrap().unwrap();
    let zone = lovemeter::zone::CalendarZone::parse("+02:00").unwrap();
    let dashboard = build_dashboard(
        &store,
        &alice,
        None,
        &StatsAggregator::new(zone),
        Config::default().cutoff,
        at(6, 10, 12),
    )
    .unwrap();

    assert_eq!(dashboard.sent.stats.this_year, 1);
    assert_eq!(dashboard.sent.stats.peak_day.count, 1);
    assert_eq!(dashboard.sent.weekly.total(), 1);
}
