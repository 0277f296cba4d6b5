use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use lovemeter::account_selector::ProfileSelector;
use lovemeter::affirmation::{generate_reason, PhraseBook};
use lovemeter::aggregator::StatsAggregator;
use lovemeter::config::{resolve_data_root, Config};
use lovemeter::counter::milestone_counters;
use lovemeter::dashboard::build_dashboard;
use lovemeter::journal::{render_lesson, render_story, StoryDraft};
use lovemeter::logging::init_logging;
use lovemeter::profile::{ProfileUpdate, UserProfile};
use lovemeter::renderer;
use lovemeter::stats::Dashboard;
use lovemeter::store::{EventSource, EventStore};
use lovemeter::timefmt::format_timestamp;
use lovemeter::{reset, status};

#[derive(Parser)]
#[command(name = "lovemeter")]
#[command(about = "Count the moments you think of each other", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Md,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new profile
    Signup {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Record one "thinking of you" moment
    Click {
        /// Profile id. If omitted, interactive selection.
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Show the love meter dashboard
    Stats {
        /// Profile id. If omitted, interactive selection.
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long, value_enum, default_value = "md")]
        format: Format,

        /// Output directory. Prints to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show a profile, or update the fields given
    Profile {
        /// Profile id. If omitted, interactive selection.
        #[arg(long)]
        user_id: Option<String>,
        /// Pass an empty value to clear a field
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        nicknames: Option<String>,
        #[arg(long)]
        hobby: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Link your partner's profile id
    Link {
        #[arg(long)]
        partner: String,
        /// Profile id. If omitted, interactive selection.
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Shared weekly stories
    Story {
        #[command(subcommand)]
        action: StoryAction,
    },
    /// Shared lessons learned from fights
    Lesson {
        #[command(subcommand)]
        action: LessonAction,
    },
    /// Days since each configured milestone
    Counter,
    /// One reason why I love you
    Reason,
    /// Show data directory, configuration and database status
    Status,
    /// Remove the local database of events, profiles and journals (configuration is kept)
    Reset,
}

#[derive(Subcommand)]
enum StoryAction {
    /// Write a story for a date range
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// First day covered (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day covered (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Change one of your stories; omitted fields are kept
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Delete one of your stories
    Rm {
        id: i64,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// All stories, latest first
    List,
}

#[derive(Subcommand)]
enum LessonAction {
    Add {
        text: String,
        #[arg(long)]
        user_id: Option<String>,
    },
    Edit {
        id: i64,
        text: String,
        #[arg(long)]
        user_id: Option<String>,
    },
    Rm {
        id: i64,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// All lessons, newest first
    List,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Signup { .. } => "signup",
            Commands::Click { .. } => "click",
            Commands::Stats { .. } => "stats",
            Commands::Profile { .. } => "profile",
            Commands::Link { .. } => "link",
            Commands::Story { .. } => "story",
            Commands::Lesson { .. } => "lesson",
            Commands::Counter => "counter",
            Commands::Reason => "reason",
            Commands::Status => "status",
            Commands::Reset => "reset",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_root = resolve_data_root()?;
    init_logging(&data_root, cli.command.name())?;

    match cli.command {
        Commands::Signup {
            uid,
            email,
            display_name,
        } => {
            let store = EventStore::init(&data_root)?;
            let mut profile = UserProfile::new(uid, email);
            profile.apply(ProfileUpdate {
                display_name,
                ..ProfileUpdate::default()
            });
            store.create_profile(&profile)?;
            eprintln!("✅ Welcome, {}! Your User ID is {}", profile.name(), profile.uid);
        }
        Commands::Click { user_id } => {
            let store = EventStore::init(&data_root)?;
            let profile = ProfileSelector::new(&data_root)?.select_profile(&store, user_id)?;
            let event = store.append_event(&profile.uid, Utc::now())?;
            let when = event
                .occurred_at
                .map(|ts| format_timestamp(ts.timestamp_millis()))
                .unwrap_or_else(|| "now".to_string());
            eprintln!("💗 Thinking of you, recorded at {}", when);
        }
        Commands::Stats {
            user_id,
            format,
            output,
        } => {
            let config = Config::load(&data_root)?;
            let store = EventStore::init(&data_root)?;
            let profile = ProfileSelector::new(&data_root)?.select_profile(&store, user_id)?;
            let partner = match profile.partner_id {
                Some(ref partner_id) => store.get_profile(partner_id)?,
                None => None,
            };
            let aggregator = StatsAggregator::new(config.zone()?);
            let dashboard = build_dashboard(
                &store,
                &profile,
                partner.as_ref(),
                &aggregator,
                config.cutoff,
                Utc::now(),
            )?;
            write_dashboard(&dashboard, format, output.as_deref())?;
        }
        Commands::Profile {
            user_id,
            display_name,
            username,
            nicknames,
            hobby,
            phone_number,
            description,
        } => {
            let store = EventStore::init(&data_root)?;
            let profile = ProfileSelector::new(&data_root)?.select_profile(&store, user_id)?;
            let update = ProfileUpdate {
                display_name,
                username,
                nicknames,
                hobby,
                phone_number,
                description,
                partner_id: None,
            };
            let profile = if update.is_empty() {
                profile
            } else {
                let updated = store.update_profile(&profile.uid, update)?;
                eprintln!("✅ Profile updated");
                updated
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&profile).context("Failed to serialize profile")?
            );
        }
        Commands::Link { partner, user_id } => {
            let store = EventStore::init(&data_root)?;
            let profile = ProfileSelector::new(&data_root)?.select_profile(&store, user_id)?;
            store.link_partner(&profile.uid, &partner)?;
            eprintln!("🔗 Linked {} with {}", profile.uid, partner);
            eprintln!("   Ask your partner to link your User ID too: {}", profile.uid);
        }
        Commands::Story { action } => {
            let store = EventStore::init(&data_root)?;
            run_story(&store, &data_root, action)?;
        }
        Commands::Lesson { action } => {
            let store = EventStore::init(&data_root)?;
            run_lesson(&store, &data_root, action)?;
        }
        Commands::Counter => {
            let config = Config::load(&data_root)?;
            let counters = milestone_counters(&config.milestones, Utc::now(), &config.zone()?);
            if counters.is_empty() {
                eprintln!("No milestones configured. Add them to config.json in {}", data_root.display());
            }
            for counter in counters {
                println!(
                    "{}: {} days (since {})",
                    counter.label,
                    renderer::md::format_number(counter.days),
                    counter.since
                );
            }
        }
        Commands::Reason => {
            let mut phrases = PhraseBook::new();
            println!("{}", generate_reason(&mut phrases));
        }
        Commands::Status => status::run(&data_root)?,
        Commands::Reset => {
            reset::run(&data_root)?;
        }
    }

    Ok(())
}

fn run_story(store: &EventStore, data_root: &Path, action: StoryAction) -> Result<()> {
    match action {
        StoryAction::Add {
            title,
            content,
            start,
            end,
            user_id,
        } => {
            let author = ProfileSelector::new(data_root)?.select_profile(store, user_id)?;
            let draft = StoryDraft {
                title,
                content,
                start_date: start,
                end_date: end,
            };
            let story = store.add_story(&author.uid, &draft, Utc::now())?;
            eprintln!("📖 Story #{} added", story.id);
        }
        StoryAction::Edit {
            id,
            title,
            content,
            start,
            end,
            user_id,
        } => {
            let author = ProfileSelector::new(data_root)?.select_profile(store, user_id)?;
            let story = store
                .get_story(id)?
                .with_context(|| format!("Story not found: {}", id))?;
            let mut draft = StoryDraft::from(&story);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(content) = content {
                draft.content = content;
            }
            if let Some(start) = start {
                draft.start_date = start;
            }
            if let Some(end) = end {
                draft.end_date = end;
            }
            store.update_story(id, &author.uid, &draft)?;
            eprintln!("✅ Story #{} updated", id);
        }
        StoryAction::Rm { id, user_id } => {
            let author = ProfileSelector::new(data_root)?.select_profile(store, user_id)?;
            store.delete_story(id, &author.uid)?;
            eprintln!("🗑️  Story #{} deleted", id);
        }
        StoryAction::List => {
            let stories = store.list_stories()?;
            if stories.is_empty() {
                eprintln!("No stories yet. Write the first one with 'lovemeter story add'.");
            }
            for story in &stories {
                println!("{}", render_story(story, &author_name(store, &story.author_id)?));
            }
        }
    }
    Ok(())
}

fn run_lesson(store: &EventStore, data_root: &Path, action: LessonAction) -> Result<()> {
    match action {
        LessonAction::Add { text, user_id } => {
            let author = ProfileSelector::new(data_root)?.select_profile(store, user_id)?;
            let lesson = store.add_lesson(&author.uid, &text, Utc::now())?;
            eprintln!("📝 Lesson #{} added", lesson.id);
        }
        LessonAction::Edit { id, text, user_id } => {
            let author = ProfileSelector::new(data_root)?.select_profile(store, user_id)?;
            store.update_lesson(id, &author.uid, &text)?;
            eprintln!("✅ Lesson #{} updated", id);
        }
        LessonAction::Rm { id, user_id } => {
            let author = ProfileSelector::new(data_root)?.select_profile(store, user_id)?;
            store.delete_lesson(id, &author.uid)?;
            eprintln!("🗑️  Lesson #{} deleted", id);
        }
        LessonAction::List => {
            let lessons = store.list_lessons()?;
            if lessons.is_empty() {
                eprintln!("No lessons yet.");
            }
            for lesson in &lessons {
                println!("{}", render_lesson(lesson, &author_name(store, &lesson.author_id)?));
            }
        }
    }
    Ok(())
}

/// Display name of an author, or their id once the profile is gone
fn author_name(store: &EventStore, uid: &str) -> Result<String> {
    Ok(store
        .get_profile(uid)?
        .map(|profile| profile.name().to_string())
        .unwrap_or_else(|| uid.to_string()))
}

fn write_dashboard(dashboard: &Dashboard, format: Format, output: Option<&Path>) -> Result<()> {
    let (contents, extension) = match format {
        Format::Md => (renderer::md::render(dashboard)?, "md"),
        Format::Json => (
            serde_json::to_string_pretty(dashboard).context("Failed to serialize dashboard")?,
            "json",
        ),
    };

    let Some(output_dir) = output else {
        println!("{}", contents);
        return Ok(());
    };

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;
    let output_path = output_dir.join(format!(
        "lovemeter-{}.{}",
        dashboard.account.user_id, extension
    ));
    std::fs::write(&output_path, contents)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    eprintln!("Report written to: {}", output_path.display());
    Ok(())
}
