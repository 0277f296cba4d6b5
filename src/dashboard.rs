/// Dashboard assembly.
///
/// Fetches the current event snapshot for a user and their partner, then runs
/// the aggregator over it. Nothing is cached: callers rebuild the dashboard
/// whenever they want fresh numbers.
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::aggregator::StatsAggregator;
use crate::profile::UserProfile;
use crate::stats::{Account, Dashboard, Section};
use crate::store::EventSource;

pub const SENT_TITLE: &str = "Thoughts Sent";
pub const SENT_LABEL_KEY: &str = "Clicks";
pub const RECEIVED_LABEL_KEY: &str = "Received";

/// Builds the dashboard for `profile`.
///
/// # Arguments
///
/// * `source` - Where events are read from
/// * `profile` - The viewing user
/// * `partner` - The linked partner's profile, if linked and found
/// * `aggregator` - Statistics aggregator for the configured calendar zone
/// * `cutoff` - Events at or before this instant are left out of the counters
/// * `now` - Reference instant
pub fn build_dashboard(
    source: &dyn EventSource,
    profile: &UserProfile,
    partner: Option<&UserProfile>,
    aggregator: &StatsAggregator,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Dashboard> {
    let sent_events = source.fetch_events(&profile.uid)?;
    debug!("{} sent events for {}", sent_events.len(), profile.uid);

    let sent = Section {
        title: SENT_TITLE.to_string(),
        stats: aggregator.compute_stats(&sent_events, cutoff, now),
        weekly: aggregator.compute_weekly_series(&sent_events, now, SENT_LABEL_KEY),
    };

    if partner.is_none() {
        if let Some(ref partner_id) = profile.partner_id {
            warn!("Partner {} of {} has no profile", partner_id, profile.uid);
        }
    }

    let received = match partner {
        Some(partner) => {
            let received_events = source.fetch_events(&partner.uid)?;
            debug!("{} received events from {}", received_events.len(), partner.uid);
            Some(Section {
                title: format!("{}'s Thoughts", partner.partner_name()),
                stats: aggregator.compute_stats(&received_events, cutoff, now),
                weekly: aggregator.compute_weekly_series(
                    &received_events,
                    now,
                    RECEIVED_LABEL_KEY,
                ),
            })
        }
        None => None,
    };

    Ok(Dashboard {
        schema_version: 1,
        generated_at: aggregator.zone().clamped_local_date(now).format("%Y-%m-%d").to_string(),
        cutoff: cutoff.to_rfc3339(),
        zone: aggregator.zone().to_string(),
        account: account_of(profile),
        sent,
        partner: partner.map(account_of),
        received,
    })
}

fn account_of(profile: &UserProfile) -> Account {
    Account {
        user_id: profile.uid.clone(),
        display_name: profile.display_name.clone(),
    }
}
