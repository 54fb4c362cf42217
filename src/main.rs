use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use popcast::{
    profile::{JsonDirProfileStore, Profile, ProfileStore},
    scenario::ScenarioLoader,
    Projector, Snapshot, YearMonth,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Project population groups forward month by month")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug" or "popcast=trace")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Project a scenario file to a target month
    Predict {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/two_villages.yaml")]
        scenario: PathBuf,

        /// Target month, YYYY-MM or YYYY-MM-DD (uses the scenario target when omitted)
        #[arg(long)]
        target: Option<YearMonth>,

        /// Print the snapshot as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also write the snapshot as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manage saved profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileAction {
    /// List saved profiles, oldest first
    List {
        #[arg(long, default_value = "profiles")]
        dir: PathBuf,
    },
    /// Save a scenario's groups and start month as a profile
    Save {
        #[arg(long, default_value = "profiles")]
        dir: PathBuf,
        #[arg(long)]
        scenario: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Delete a saved profile
    Delete {
        #[arg(long, default_value = "profiles")]
        dir: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Project a saved profile to a target month
    Predict {
        #[arg(long, default_value = "profiles")]
        dir: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        target: YearMonth,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Predict {
            scenario,
            target,
            json,
            output,
        } => {
            let loader = ScenarioLoader::new(".");
            let scenario = loader.load(&scenario)?;
            let target = scenario
                .target(target)
                .ok_or_else(|| anyhow!("scenario '{}' has no target; pass --target", scenario.name))?;
            let projector = scenario.projector()?;
            let snapshot = projector.predict_month(target)?;
            print_snapshot(&projector, &snapshot, json)?;
            if let Some(path) = output {
                snapshot
                    .write_json(&path)
                    .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
            }
        }
        Command::Profiles { action } => run_profiles(action)?,
    }
    Ok(())
}

fn run_profiles(action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::List { dir } => {
            let store = JsonDirProfileStore::open(&dir)?;
            for profile in store.load_all()? {
                println!(
                    "{:<20} saved {}  start {}  groups {}",
                    profile.id,
                    profile.saved_at.format("%Y-%m-%d %H:%M:%S"),
                    profile.settings.start,
                    profile.settings.groups.len()
                );
            }
        }
        ProfileAction::Save { dir, scenario, id } => {
            let scenario = ScenarioLoader::new(".").load(&scenario)?;
            let mut store = JsonDirProfileStore::open(&dir)?;
            store.save(Profile::new(id.clone(), Utc::now(), scenario.settings()))?;
            println!("Saved profile '{id}' to {}", store.dir().display());
        }
        ProfileAction::Delete { dir, id } => {
            let mut store = JsonDirProfileStore::open(&dir)?;
            if !store.delete(&id)? {
                bail!("no profile named '{id}' in {}", dir.display());
            }
            println!("Deleted profile '{id}'");
        }
        ProfileAction::Predict {
            dir,
            id,
            target,
            json,
        } => {
            let store = JsonDirProfileStore::open(&dir)?;
            let profile = store
                .load(&id)?
                .ok_or_else(|| anyhow!("no profile named '{id}' in {}", dir.display()))?;
            let projector = Projector::new(profile.settings)
                .with_context(|| format!("Profile '{id}' holds invalid groups"))?;
            let snapshot = projector.predict_month(target)?;
            print_snapshot(&projector, &snapshot, json)?;
        }
    }
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_snapshot(projector: &Projector, snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    println!(
        "Projection from {} to {} ({} months)",
        projector.start(),
        snapshot.month,
        snapshot.months_elapsed
    );
    for group in projector.groups() {
        let population = snapshot.population(&group.id).unwrap_or(0.0);
        let label = if group.label.is_empty() {
            group.id.as_str()
        } else {
            group.label.as_str()
        };
        println!("  {label:<24} {population:>14.1}");
    }
    println!("  {:<24} {:>14.1}", "total", snapshot.total_population());
    Ok(())
}
