use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use form_coach_core::{
    AppConfig, Difficulty, ExerciseKind, FrameDisposition, GradedCounter, PoseFrame, Session,
};
use tracing_subscriber::EnvFilter;

fn main() -> form_coach_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            frames,
            exercise,
            reps,
            sets,
            config,
        } => run_replay(&frames, exercise, reps, sets, config.as_deref()),
        Commands::Grade {
            frames,
            exercise,
            difficulty,
            config,
        } => run_grade(&frames, exercise, difficulty, config.as_deref()),
        Commands::Profiles => run_profiles(),
    }
}

fn run_replay(
    frames: &Path,
    exercise: Option<ExerciseKind>,
    reps: Option<u32>,
    sets: Option<u32>,
    config: Option<&Path>,
) -> form_coach_core::Result<()> {
    let mut app_config = match config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(exercise) = exercise {
        app_config.session.exercise = exercise;
    }
    if let Some(reps) = reps {
        app_config.session.target_reps = reps;
    }
    if let Some(sets) = sets {
        app_config.session.total_sets = sets;
    }

    tracing::info!(?frames, session = ?app_config.session, "starting replay");

    let mut session = Session::new(app_config.session, app_config.engine)?;
    let mut last_feedback = Vec::new();
    let mut last_timestamp = 0;
    let mut started = false;

    for frame in read_frames(frames)? {
        let frame = frame?;
        if !started {
            session.start(frame.timestamp_ms);
            started = true;
        }
        last_timestamp = frame.timestamp_ms;

        let outcome = session.process_frame(&frame);
        for event in &outcome.events {
            println!("[{:>8}ms] {event}", frame.timestamp_ms);
        }
        if outcome.disposition == FrameDisposition::Processed && outcome.feedback != last_feedback {
            for line in &outcome.feedback {
                println!("[{:>8}ms]   {line}", frame.timestamp_ms);
            }
            last_feedback = outcome.feedback;
        }
        if outcome.stop_capture {
            tracing::info!(at = frame.timestamp_ms, "session requested capture stop");
            break;
        }
    }

    // Let a pending set pause run out so the final state is settled.
    if let Some(resume_at) = session.snapshot().paused_until {
        for event in session.tick(resume_at.max(last_timestamp)).events {
            println!("[{resume_at:>8}ms] {event}");
        }
    }
    session.stop();

    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}

fn run_grade(
    frames: &Path,
    exercise: ExerciseKind,
    difficulty: Difficulty,
    config: Option<&Path>,
) -> form_coach_core::Result<()> {
    let engine = match config {
        Some(path) => AppConfig::load(path)?.engine,
        None => AppConfig::default().engine,
    };
    tracing::info!(?frames, %exercise, %difficulty, "grading recording");

    let mut counter = GradedCounter::new(exercise, difficulty)
        .with_visibility_threshold(engine.visibility_threshold);
    let mut skipped = 0usize;

    for frame in read_frames(frames)? {
        let frame = frame?;
        match counter.grade(&frame) {
            Some(grade) if !grade.errors.is_empty() => {
                println!("[{:>8}ms] {}", frame.timestamp_ms, grade.errors.join(" | "));
            }
            Some(_) => {}
            None => skipped += 1,
        }
    }

    println!("count: {} ({} frames skipped)", counter.count(), skipped);
    Ok(())
}

fn run_profiles() -> form_coach_core::Result<()> {
    let profiles: Vec<_> = ExerciseKind::ALL.iter().map(|kind| kind.profile()).collect();
    println!("{}", serde_json::to_string_pretty(&profiles)?);
    Ok(())
}

/// Lazily parses a JSON-lines recording, one [`PoseFrame`] per line.
fn read_frames(
    path: &Path,
) -> form_coach_core::Result<impl Iterator<Item = form_coach_core::Result<PoseFrame>>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(reader
        .lines()
        .filter(|line| line.as_ref().map(|l| !l.trim().is_empty()).unwrap_or(true))
        .map(|line| -> form_coach_core::Result<PoseFrame> {
            Ok(serde_json::from_str(&line?)?)
        }))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Exercise repetition and form coach", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded pose stream through a coaching session.
    Replay {
        /// JSON-lines file with one pose frame per line.
        frames: PathBuf,
        /// Exercise to analyse, e.g. "squats" or "Jumping Jacks".
        #[arg(short, long)]
        exercise: Option<ExerciseKind>,
        /// Target repetitions per set.
        #[arg(short, long)]
        reps: Option<u32>,
        /// Number of sets.
        #[arg(short, long)]
        sets: Option<u32>,
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Count repetitions with the difficulty-graded threshold counter.
    Grade {
        /// JSON-lines file with one pose frame per line.
        frames: PathBuf,
        #[arg(short, long, default_value = "pushups")]
        exercise: ExerciseKind,
        #[arg(short, long, default_value = "beginner")]
        difficulty: Difficulty,
        /// Optional JSON configuration file; only the visibility threshold is used.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the exercise rule table.
    Profiles,
}
