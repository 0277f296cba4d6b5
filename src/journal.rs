/// Shared journals: weekly stories and lessons learned from fights.
///
/// Both are visible to every profile; only the author may edit or delete an entry.
use anyhow::{bail, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timefmt::format_timestamp_opt;

/// One chapter of the couple's story, covering a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStory {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub author_id: String,
    /// `None` when the stored creation time is unusable
    pub created_at: Option<DateTime<Utc>>,
}

/// The editable part of a [`WeeklyStory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl StoryDraft {
    /// Trimmed copy of the draft; every field is required
    pub fn validated(&self) -> Result<Self> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() {
            bail!("Story title must not be empty");
        }
        if content.is_empty() {
            bail!("Story content must not be empty");
        }
        if self.end_date < self.start_date {
            bail!(
                "Story ends ({}) before it starts ({})",
                self.end_date,
                self.start_date
            );
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

impl From<&WeeklyStory> for StoryDraft {
    fn from(story: &WeeklyStory) -> Self {
        Self {
            title: story.title.clone(),
            content: story.content.clone(),
            start_date: story.start_date,
            end_date: story.end_date,
        }
    }
}

/// A lesson written down after a fight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightLesson {
    pub id: i64,
    pub text: String,
    pub author_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Trimmed lesson text, rejecting blank input
pub fn validated_lesson_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Lesson text must not be empty");
    }
    Ok(text.to_string())
}

/// "Jun 3 - 9, 2024", or with both years/months when the range crosses them
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() != end.year() {
        format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
    } else if start.month() != end.month() {
        format!("{} - {}", start.format("%b %-d"), end.format("%b %-d, %Y"))
    } else {
        format!("{} - {}", start.format("%b %-d"), end.format("%-d, %Y"))
    }
}

pub fn render_story(story: &WeeklyStory, author_name: &str) -> String {
    format!(
        "#{} {}\n   {} · by {} · written {}\n   {}\n",
        story.id,
        story.title,
        format_date_range(story.start_date, story.end_date),
        author_name,
        format_timestamp_opt(story.created_at.map(|ts| ts.timestamp_millis())),
        story.content
    )
}

pub fn render_lesson(lesson: &FightLesson, author_name: &str) -> String {
    format!(
        "#{} {}\n   by {} · {}\n",
        lesson.id,
        lesson.text,
        author_name,
        format_timestamp_opt(lesson.created_at.map(|ts| ts.timestamp_millis()))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> StoryDraft {
        StoryDraft {
            title: "  Our first trip  ".to_string(),
            content: "We got lost and loved it.\n".to_string(),
            start_date: date(2024, 6, 3),
            end_date: date(2024, 6, 9),
        }
    }

    #[test]
    fn test_draft_is_trimmed() {
        let draft = draft().validated().unwrap();
        assert_eq!(draft.title, "Our first trip");
        assert_eq!(draft.content, "We got lost and loved it.");
    }

    #[test]
    fn test_draft_requires_all_fields() {
        let mut blank_title = draft();
        blank_title.title = "   ".to_string();
        assert!(blank_title.validated().is_err());

        let mut blank_content = draft();
        blank_content.content = String::new();
        assert!(blank_content.validated().is_err());

        let mut backwards = draft();
        backwards.end_date = date(2024, 6, 1);
        let err = backwards.validated().unwrap_err().to_string();
        assert!(err.contains("before it starts"));

        let mut single_day = draft();
        single_day.end_date = single_day.start_date;
        assert!(single_day.validated().is_ok());
    }

    #[test]
    fn test_lesson_text() {
        assert_eq!(
            validated_lesson_text(" Listen first. ").unwrap(),
            "Listen first."
        );
        assert!(validated_lesson_text("\n\t").is_err());
    }

    #[test]
    fn test_format_date_range() {
        assert_eq!(
            format_date_range(date(2024, 6, 3), date(2024, 6, 9)),
            "Jun 3 - 9, 2024"
        );
        assert_eq!(
            format_date_range(date(2024, 5, 27), date(2024, 6, 2)),
            "May 27 - Jun 2, 2024"
        );
        assert_eq!(
            format_date_range(date(2024, 12, 29), date(2025, 1, 4)),
            "Dec 29, 2024 - Jan 4, 2025"
        );
    }

    #[test]
    fn test_render_lesson_without_timestamp() {
        let lesson = FightLesson {
            id: 3,
            text: "Never go to bed angry.".to_string(),
            author_id: "bob".to_string(),
            created_at: None,
        };
        let rendered = render_lesson(&lesson, "Bob");
        assert!(rendered.starts_with("#3 Never go to bed angry.\n"));
        assert!(rendered.contains("by Bob"));
    }
}
