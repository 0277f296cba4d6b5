/// Local event and profile store
///
/// Persists interaction events and user profiles in SQLite. This is the
/// collaborator the aggregator reads from; it owns all I/O.
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

use crate::event::{InteractionEvent, StoredTimestamp};
use crate::journal::{validated_lesson_text, FightLesson, StoryDraft, WeeklyStory};
use crate::profile::{ProfileUpdate, UserProfile};

/// File name of the database inside the data root
pub const DB_FILENAME: &str = "lovemeter.sqlite";

/// Read and append access to interaction events for one actor at a time
pub trait EventSource {
    /// All events recorded by `actor_id`. Order is not guaranteed.
    fn fetch_events(&self, actor_id: &str) -> Result<Vec<InteractionEvent>>;

    /// Record one interaction for `actor_id`, timestamped by the store at `now`.
    fn append_event(&self, actor_id: &str, now: DateTime<Utc>) -> Result<InteractionEvent>;
}

/// Database handle for events and profiles
///
/// This abstracts the underlying database implementation (currently SQLite)
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    /// Initialize or open the store in `data_dir`
    pub fn init(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        let db_path = data_dir.join(DB_FILENAME);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        debug!("Opened event store at {}", db_path.display());
        Self::with_connection(conn)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // Timestamps are nullable: partially written records must still load
        conn.execute(
            "CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                actor_id TEXT NOT NULL,
                ts_seconds INTEGER,
                ts_nanos INTEGER
            )",
            [],
        )
        .context("Failed to create interactions table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS interactions_actor ON interactions (actor_id)",
            [],
        )
        .context("Failed to create interactions index")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS profiles (
                uid TEXT NOT NULL PRIMARY KEY,
                email TEXT NOT NULL,
                display_name TEXT,
                username TEXT,
                nicknames TEXT,
                hobby TEXT,
                phone_number TEXT,
                description TEXT,
                partner_id TEXT
            )",
            [],
        )
        .context("Failed to create profiles table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS weekly_stories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                author_id TEXT NOT NULL,
                created_at INTEGER
            )",
            [],
        )
        .context("Failed to create weekly_stories table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS fight_lessons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                author_id TEXT NOT NULL,
                created_at INTEGER
            )",
            [],
        )
        .context("Failed to create fight_lessons table")?;

        Ok(Self { conn })
    }

    /// Total number of stored events across all actors
    pub fn event_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Newest valid event timestamp in milliseconds, across all actors
    pub fn latest_event_ts(&self) -> Result<Option<i64>> {
        let seconds: Option<i64> = self.conn.query_row(
            "SELECT MAX(ts_seconds) FROM interactions WHERE ts_seconds IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(seconds.map(|s| s.saturating_mul(1000)))
    }

    /// Insert a raw row, bypassing timestamp assignment
    pub fn insert_raw(&self, actor_id: &str, timestamp: Option<StoredTimestamp>) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO interactions (actor_id, ts_seconds, ts_nanos) VALUES (?1, ?2, ?3)",
                params![
                    actor_id,
                    timestamp.map(|t| t.seconds),
                    timestamp.map(|t| t.nanoseconds)
                ],
            )
            .with_context(|| format!("Failed to insert interaction for {}", actor_id))?;
        Ok(self.conn.last_insert_rowid())
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    /// Create a new profile; fails if the uid is taken
    pub fn create_profile(&self, profile: &UserProfile) -> Result<()> {
        if profile.uid.trim().is_empty() {
            bail!("User ID must not be empty");
        }
        if self.get_profile(&profile.uid)?.is_some() {
            bail!("Profile already exists: {}", profile.uid);
        }
        self.write_profile(profile)?;
        info!("Created profile {}", profile.uid);
        Ok(())
    }

    /// Get a profile by uid
    pub fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT uid, email, display_name, username, nicknames, hobby, phone_number,
                    description, partner_id
             FROM profiles
             WHERE uid = ?1",
        )?;

        let profile = stmt.query_row(params![uid], profile_from_row).optional()?;
        Ok(profile)
    }

    /// All profiles, ordered by uid
    pub fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT uid, email, display_name, username, nicknames, hobby, phone_number,
                    description, partner_id
             FROM profiles
             ORDER BY uid",
        )?;

        let profiles = stmt
            .query_map([], profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    /// Merge an update into an existing profile and return the result
    pub fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<UserProfile> {
        let mut profile = self
            .get_profile(uid)?
            .with_context(|| format!("Profile not found: {}", uid))?;
        profile.apply(update);
        self.write_profile(&profile)?;
        debug!("Updated profile {}", uid);
        Ok(profile)
    }

    /// Point `uid`'s partner link at `partner_id`
    ///
    /// Links are one-directional; each partner links the other.
    pub fn link_partner(&self, uid: &str, partner_id: &str) -> Result<UserProfile> {
        let partner_id = partner_id.trim();
        if partner_id == uid {
            bail!("Cannot link a profile to itself");
        }
        if self.get_profile(partner_id)?.is_none() {
            bail!("Partner profile not found: {}", partner_id);
        }
        let profile = self.update_profile(
            uid,
            ProfileUpdate {
                partner_id: Some(partner_id.to_string()),
                ..Default::default()
            },
        )?;
        info!("Linked {} to partner {}", uid, partner_id);
        Ok(profile)
    }

    // ------------------------------------------------------------------
    // Journals
    // ------------------------------------------------------------------

    /// Add a weekly story written by `author_id`
    pub fn add_story(
        &self,
        author_id: &str,
        draft: &StoryDraft,
        now: DateTime<Utc>,
    ) -> Result<WeeklyStory> {
        let draft = draft.validated()?;
        self.ensure_profile(author_id)?;
        self.conn
            .execute(
                "INSERT INTO weekly_stories (title, content, start_date, end_date, author_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    draft.title,
                    draft.content,
                    draft.start_date.to_string(),
                    draft.end_date.to_string(),
                    author_id,
                    now.timestamp()
                ],
            )
            .context("Failed to insert weekly story")?;
        let id = self.conn.last_insert_rowid();
        info!("{} added story {}", author_id, id);
        self.get_story(id)?
            .with_context(|| format!("Story not found after insert: {}", id))
    }

    pub fn get_story(&self, id: i64) -> Result<Option<WeeklyStory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, start_date, end_date, author_id, created_at
             FROM weekly_stories
             WHERE id = ?1",
        )?;
        let story = stmt.query_row(params![id], story_from_row).optional()?;
        Ok(story)
    }

    /// Replace a story's content; only its author may do so
    pub fn update_story(&self, id: i64, author_id: &str, draft: &StoryDraft) -> Result<WeeklyStory> {
        let draft = draft.validated()?;
        let story = self
            .get_story(id)?
            .with_context(|| format!("Story not found: {}", id))?;
        ensure_author("story", id, &story.author_id, author_id)?;

        self.conn
            .execute(
                "UPDATE weekly_stories
                 SET title = ?2, content = ?3, start_date = ?4, end_date = ?5
                 WHERE id = ?1",
                params![
                    id,
                    draft.title,
                    draft.content,
                    draft.start_date.to_string(),
                    draft.end_date.to_string()
                ],
            )
            .with_context(|| format!("Failed to update story {}", id))?;
        debug!("Updated story {}", id);
        Ok(WeeklyStory {
            title: draft.title,
            content: draft.content,
            start_date: draft.start_date,
            end_date: draft.end_date,
            ..story
        })
    }

    pub fn delete_story(&self, id: i64, author_id: &str) -> Result<()> {
        let story = self
            .get_story(id)?
            .with_context(|| format!("Story not found: {}", id))?;
        ensure_author("story", id, &story.author_id, author_id)?;
        self.conn
            .execute("DELETE FROM weekly_stories WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to delete story {}", id))?;
        info!("{} deleted story {}", author_id, id);
        Ok(())
    }

    /// Every story from every author, latest start date first
    pub fn list_stories(&self) -> Result<Vec<WeeklyStory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, start_date, end_date, author_id, created_at
             FROM weekly_stories
             ORDER BY start_date DESC, id DESC",
        )?;
        let stories = stmt
            .query_map([], story_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load weekly stories")?;
        Ok(stories)
    }

    /// Write down a lesson authored by `author_id`
    pub fn add_lesson(&self, author_id: &str, text: &str, now: DateTime<Utc>) -> Result<FightLesson> {
        let text = validated_lesson_text(text)?;
        self.ensure_profile(author_id)?;
        self.conn
            .execute(
                "INSERT INTO fight_lessons (text, author_id, created_at) VALUES (?1, ?2, ?3)",
                params![text, author_id, now.timestamp()],
            )
            .context("Failed to insert lesson")?;
        let id = self.conn.last_insert_rowid();
        info!("{} added lesson {}", author_id, id);
        self.get_lesson(id)?
            .with_context(|| format!("Lesson not found after insert: {}", id))
    }

    pub fn get_lesson(&self, id: i64) -> Result<Option<FightLesson>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, text, author_id, created_at FROM fight_lessons WHERE id = ?1",
        )?;
        let lesson = stmt.query_row(params![id], lesson_from_row).optional()?;
        Ok(lesson)
    }

    pub fn update_lesson(&self, id: i64, author_id: &str, text: &str) -> Result<FightLesson> {
        let text = validated_lesson_text(text)?;
        let lesson = self
            .get_lesson(id)?
            .with_context(|| format!("Lesson not found: {}", id))?;
        ensure_author("lesson", id, &lesson.author_id, author_id)?;
        self.conn
            .execute(
                "UPDATE fight_lessons SET text = ?2 WHERE id = ?1",
                params![id, text],
            )
            .with_context(|| format!("Failed to update lesson {}", id))?;
        debug!("Updated lesson {}", id);
        Ok(FightLesson { text, ..lesson })
    }

    pub fn delete_lesson(&self, id: i64, author_id: &str) -> Result<()> {
        let lesson = self
            .get_lesson(id)?
            .with_context(|| format!("Lesson not found: {}", id))?;
        ensure_author("lesson", id, &lesson.author_id, author_id)?;
        self.conn
            .execute("DELETE FROM fight_lessons WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to delete lesson {}", id))?;
        info!("{} deleted lesson {}", author_id, id);
        Ok(())
    }

    /// Every lesson from every author, newest first
    pub fn list_lessons(&self) -> Result<Vec<FightLesson>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, text, author_id, created_at
             FROM fight_lessons
             ORDER BY created_at DESC, id DESC",
        )?;
        let lessons = stmt
            .query_map([], lesson_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load lessons")?;
        Ok(lessons)
    }

    fn ensure_profile(&self, uid: &str) -> Result<()> {
        if self.get_profile(uid)?.is_none() {
            bail!("Profile not found: {}", uid);
        }
        Ok(())
    }

    fn write_profile(&self, profile: &UserProfile) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO profiles (uid, email, display_name, username, nicknames, hobby,
                                       phone_number, description, partner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(uid) DO UPDATE SET
                    email = excluded.email,
                    display_name = excluded.display_name,
                    username = excluded.username,
                    nicknames = excluded.nicknames,
                    hobby = excluded.hobby,
                    phone_number = excluded.phone_number,
                    description = excluded.description,
                    partner_id = excluded.partner_id",
                params![
                    profile.uid,
                    profile.email,
                    profile.display_name,
                    profile.username,
                    profile.nicknames,
                    profile.hobby,
                    profile.phone_number,
                    profile.description,
                    profile.partner_id,
                ],
            )
            .with_context(|| format!("Failed to save profile {}", profile.uid))?;
        Ok(())
    }
}

impl EventSource for EventStore {
    fn fetch_events(&self, actor_id: &str) -> Result<Vec<InteractionEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor_id, ts_seconds, ts_nanos
             FROM interactions
             WHERE actor_id = ?1",
        )?;

        let events = stmt
            .query_map(params![actor_id], |row| {
                let seconds: Option<i64> = row.get(2)?;
                let nanos: Option<i64> = row.get(3)?;
                let timestamp = match (seconds, nanos) {
                    (Some(seconds), Some(nanoseconds)) => Some(StoredTimestamp {
                        seconds,
                        nanoseconds,
                    }),
                    (Some(seconds), None) => Some(StoredTimestamp {
                        seconds,
                        nanoseconds: 0,
                    }),
                    _ => None,
                };
                Ok(InteractionEvent::from_stored(
                    Some(row.get(0)?),
                    row.get(1)?,
                    timestamp,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to load interactions for {}", actor_id))?;

        debug!("Fetched {} events for {}", events.len(), actor_id);
        Ok(events)
    }

    fn append_event(&self, actor_id: &str, now: DateTime<Utc>) -> Result<InteractionEvent> {
        let timestamp = StoredTimestamp::from_instant(now);
        let id = self.insert_raw(actor_id, Some(timestamp))?;
        Ok(InteractionEvent::from_stored(
            Some(id),
            actor_id.to_string(),
            Some(timestamp),
        ))
    }
}

fn ensure_author(kind: &str, id: i64, owner: &str, author_id: &str) -> Result<()> {
    if owner != author_id {
        bail!("Only the author can change {} {}", kind, id);
    }
    Ok(())
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn created_at_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let seconds: Option<i64> = row.get(idx)?;
    Ok(seconds.and_then(|s| DateTime::from_timestamp(s, 0)))
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<WeeklyStory> {
    Ok(WeeklyStory {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        start_date: date_column(row, 3)?,
        end_date: date_column(row, 4)?,
        author_id: row.get(5)?,
        created_at: created_at_column(row, 6)?,
    })
}

fn lesson_from_row(row: &Row<'_>) -> rusqlite::Result<FightLesson> {
    Ok(FightLesson {
        id: row.get(0)?,
        text: row.get(1)?,
        author_id: row.get(2)?,
        created_at: created_at_column(row, 3)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        uid: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        username: row.get(3)?,
        nicknames: row.get(4)?,
        hobby: row.get(5)?,
        phone_number: row.get(6)?,
        description: row.get(7)?,
        partner_id: row.get(8)?,
    })
}
