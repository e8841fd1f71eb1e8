//! Problems CLI - print the latest problems of a project from the audit backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use problems::{
    unified_tasks, AggregationConfig, AggregationReport, Aggregator, ApiClient, ApiConfig,
    NormalizedProblem, ProjectStats, Severity, UnifiedTask,
};

/// Latest audit issues and agent findings for a project
#[derive(Parser)]
#[command(name = "problems")]
#[command(about = "Latest audit issues and agent findings for a project")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend API base URL
    #[arg(long, env = "AUDIT_API_URL", global = true)]
    api_url: Option<String>,

    /// Bearer token for the backend
    #[arg(long, env = "AUDIT_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Output format (json or text)
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    Json,
    #[default]
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate the latest problems across audit and agent tasks
    Problems {
        /// Project ID
        project_id: String,

        /// Completed tasks fetched per source
        #[arg(long, env = "PROBLEMS_MAX_TASKS")]
        max_tasks: Option<usize>,

        /// In-flight fetches per source
        #[arg(long, env = "PROBLEMS_FETCH_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Per-task fetch timeout in milliseconds
        #[arg(long, env = "PROBLEMS_REQUEST_TIMEOUT_MS")]
        timeout_ms: Option<u64>,
    },
    /// Show project statistics and all tasks, newest first
    Stats {
        /// Project ID
        project_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("problems=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("problems=info,warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut api = ApiConfig::default();
    if let Some(url) = cli.api_url {
        api.base_url = url;
    }
    if cli.token.is_some() {
        api.token = cli.token;
    }
    let client = Arc::new(ApiClient::new(&api).context("Failed to create API client")?);

    match cli.command {
        Commands::Problems {
            project_id,
            max_tasks,
            concurrency,
            timeout_ms,
        } => {
            let mut config = AggregationConfig::default();
            if let Some(max_tasks) = max_tasks {
                config.max_tasks = max_tasks;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.request_timeout = Duration::from_millis(timeout_ms);
            }

            tracing::info!(
                project_id = %project_id,
                max_tasks = config.max_tasks,
                concurrency = config.concurrency,
                "Loading project problems"
            );
            let tasks = client.load_project_tasks(&project_id).await;
            let report = Aggregator::new(client, config)
                .aggregate(&tasks.audit, &tasks.agent)
                .await;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print_report(&report),
            }
        }
        Commands::Stats { project_id } => {
            let tasks = client.load_project_tasks(&project_id).await;
            let stats = ProjectStats::from_tasks(&tasks.audit, &tasks.agent);
            let unified = unified_tasks(&tasks.audit, &tasks.agent);

            match cli.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "stats": stats,
                        "tasks": unified,
                    }))?
                ),
                OutputFormat::Text => print_stats(&stats, &unified),
            }
        }
    }

    Ok(())
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    let label = severity.as_str().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.bright_red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.cyan(),
    }
}

fn print_problem(problem: &NormalizedProblem) {
    println!("{:>8}  {}", severity_label(problem.severity), problem.title.bold());

    let location = problem.location().unwrap_or_else(|| "unknown file".to_string());
    let category = problem.category.as_deref().unwrap_or("-");
    let task = problem.task_id.chars().take(8).collect::<String>();
    let task_date = problem
        .task_created_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "          {}  {}  {} {} {}",
        location.dimmed(),
        category,
        problem.kind.as_str(),
        task,
        task_date.dimmed()
    );

    if let Some(description) = &problem.description {
        println!("          {description}");
    }
}

fn print_report(report: &AggregationReport) {
    let summary = &report.summary;
    let limited = if summary.is_limited {
        format!(" (latest {} of each shown)", summary.max_tasks)
    } else {
        String::new()
    };
    let header = format!(
        "Completed audit tasks: {} / agent tasks: {}{limited}, {} problems",
        summary.completed_audit_tasks,
        summary.completed_agent_tasks,
        report.problems.len()
    );
    println!("{}", header.bold());

    let failed = summary.failed_audit_tasks + summary.failed_agent_tasks;
    if failed > 0 {
        println!(
            "{}",
            format!("{failed} task(s) could not be fetched; results are partial").yellow()
        );
    }
    println!();

    if report.problems.is_empty() {
        println!("{}", "No problems found".green());
        return;
    }
    for problem in &report.problems {
        print_problem(problem);
        println!();
    }
}

fn print_stats(stats: &ProjectStats, tasks: &[UnifiedTask]) {
    println!("{}", "Project statistics".bold());
    println!("  Total tasks:       {}", stats.total_tasks);
    println!("  Completed tasks:   {}", stats.completed_tasks);
    println!("  Total issues:      {}", stats.total_issues);
    println!("  Avg quality score: {:.1}", stats.avg_quality_score);
    println!();

    for entry in tasks {
        let created = entry
            .task
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<5}  {:<36}  {:<10}  {}",
            entry.kind.as_str(),
            entry.task.id,
            format!("{:?}", entry.task.status).to_lowercase(),
            created.dimmed()
        );
    }
}
