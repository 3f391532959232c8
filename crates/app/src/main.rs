use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use quest_core::model::{AttemptDraft, UserId};
use services::{AppServices, Clock, SessionOrigin};
use tracing_subscriber::EnvFilter;

mod report;

const DEFAULT_LOG_FILTER: &str = "quest=info,services=info,storage=info";

#[derive(Debug, Parser)]
#[command(name = "quest")]
#[command(about = "Track XP, streaks, daily goals and achievements for web-dev practice")]
#[command(version)]
struct Cli {
    /// SQLite database URL or file path
    #[arg(
        long = "db",
        global = true,
        env = "QUEST_DB_URL",
        default_value = "sqlite://quest.sqlite3"
    )]
    db_url: String,

    /// Learner id
    #[arg(long = "user", global = true, env = "QUEST_USER_ID", default_value_t = 1)]
    user_id: u64,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record one answered question
    Record {
        /// Question identifier
        question: String,

        /// html, css or javascript
        #[arg(long, short)]
        track: String,

        /// beginner, intermediate or advanced
        #[arg(long, short, default_value = "beginner")]
        difficulty: String,

        /// Mark the answer as wrong
        #[arg(long)]
        wrong: bool,

        /// Seconds spent on the question
        #[arg(long, short = 's', default_value_t = 30)]
        seconds: u32,

        /// The learner had seen this question before
        #[arg(long)]
        retry: bool,
    },

    /// Show level, streak, daily goals and track progress
    Status,

    /// Set the daily XP goal
    Goal {
        /// XP target per day
        xp: u32,
    },

    /// Start over; achievements are kept
    Reset {
        /// Required to confirm
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;
    tracing::debug!(%db_url, user = cli.user_id, "starting");

    let clock = Clock::default_clock();
    let app = AppServices::new_sqlite(&db_url, clock, UserId::new(cli.user_id))
        .await
        .with_context(|| format!("opening {db_url}"))?;
    let svc = app.progress();
    let mut session = svc.open(app.user()).await;

    if let SessionOrigin::LoadFailed(reason) = session.origin() {
        eprintln!(
            "warning: saved progress could not be read ({reason}); changes will not be saved"
        );
    }

    match cli.command {
        Command::Record {
            question,
            track,
            difficulty,
            wrong,
            seconds,
            retry,
        } => {
            let draft = AttemptDraft {
                question_id: question,
                track,
                difficulty,
                is_correct: !wrong,
                time_spent_secs: seconds,
                timestamp: clock.now(),
                is_first_attempt: !retry,
            };
            let outcome = svc
                .record_attempt(&mut session, draft)
                .await
                .context("recording attempt")?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                print!("{}", report::attempt(&outcome));
            }
        }
        Command::Status => {
            let overview = svc.overview(&session);
            if cli.json {
                print_json(&overview)?;
            } else {
                print!("{}", report::overview(&overview));
            }
        }
        Command::Goal { xp } => {
            svc.set_daily_goal(&mut session, xp)
                .await
                .context("setting daily goal")?;
            println!("Daily XP goal set to {xp}, starting with tomorrow's goals.");
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("reset discards all XP and streaks; pass --yes to confirm");
            }
            svc.reset(&mut session).await.context("resetting progress")?;
            println!("Progress reset. Achievements were kept.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    run(cli).await
}
