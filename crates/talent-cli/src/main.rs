use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;

use talent_kb::{
    load_profiles, BrowseFilter, CandidateId, CandidateProfile, CandidateRepository, JobQuery,
    KbConfig, PageRequest,
};
use talent_monitoring::{init_logging, LogExt, MonitoringConfig};

/// Hybrid structured + semantic search over candidate profiles.
#[derive(Parser, Debug)]
#[command(name = "talent", version, about = "Candidate knowledge base client")]
struct Cli {
    /// SQLite database file (overrides TALENT_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Vector index file (overrides TALENT_INDEX_PATH).
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete every candidate record and vector.
    Reset,
    /// Load a JSON array of profiles.
    Load {
        path: PathBuf,
        /// Keep existing data instead of replacing it.
        #[arg(long)]
        append: bool,
    },
    /// Add one profile from a JSON file, or stdin when the path is `-`.
    Add { path: PathBuf },
    /// Semantic search with free text.
    Search {
        query: String,
        /// Number of results.
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Semantic search composed from a job posting.
    Job {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        languages: Option<String>,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Structured browse, newest first.
    Browse {
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        travel: Option<bool>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Show one candidate.
    Show { id: i64 },
    /// Number of stored candidates.
    Count,
    /// List ids present in only one of the two stores.
    Audit,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_profile(path: &Path) -> Result<CandidateProfile> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Profile is not valid JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&MonitoringConfig::from_env("talent-cli"))?;

    let mut config = KbConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(index) = cli.index {
        config.index_path = index;
    }
    debug!(
        db = %config.db_path.display(),
        index = %config.index_path.display(),
        "Resolved configuration"
    );

    let repo = CandidateRepository::open(&config)
        .await
        .log_err("Failed to open candidate repository")?;

    match cli.command {
        Commands::Reset => {
            repo.reset().await?;
            println!("reset");
        }
        Commands::Load { path, append } => {
            let report = load_profiles(&repo, &path, !append).await?;
            print_json(&report)?;
        }
        Commands::Add { path } => {
            let profile = read_profile(&path).await?;
            let id = repo.ingest(profile).await.log_err("Ingest failed")?;
            print_json(&serde_json::json!({ "id": id }))?;
        }
        Commands::Search { query, k } => {
            let result = repo.search(&query, k.unwrap_or(config.search_k)).await?;
            print_json(&result)?;
        }
        Commands::Job {
            title,
            description,
            location,
            languages,
            k,
        } => {
            let job = JobQuery {
                title,
                description,
                location,
                required_languages: languages,
            };
            let result = repo.search_job(&job, k.unwrap_or(config.search_k)).await?;
            print_json(&result)?;
        }
        Commands::Browse {
            location,
            title,
            travel,
            page,
            page_size,
        } => {
            let filter = BrowseFilter {
                location,
                title,
                travel,
            };
            let request = PageRequest::new(page, page_size.unwrap_or(config.page_size));
            print_json(&repo.browse(&filter, request).await?)?;
        }
        Commands::Show { id } => match repo.get(CandidateId(id)).await? {
            Some(candidate) => print_json(&candidate)?,
            None => anyhow::bail!("Candidate {} not found", id),
        },
        Commands::Count => {
            print_json(&serde_json::json!({ "total": repo.total_candidate_count().await? }))?;
        }
        Commands::Audit => {
            print_json(&repo.audit().await?)?;
        }
    }

    Ok(())
}
