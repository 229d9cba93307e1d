//! Loangraph CLI: load customer/loan Parquet data into Neo4j
//!
//! Settings come from an optional YAML file, then command-line flags.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

use loangraph::query::ingestion_plan;
use loangraph::{BoltSink, GraphSink, MemorySink, Pipeline, PipelineConfig, PipelineReport};

#[derive(Parser)]
#[command(name = "loangraph", version, about = "Load customer/loan Parquet data into Neo4j")]
struct Cli {
    /// YAML config file
    #[arg(long, short, global = true, env = "LOANGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Parquet file or directory
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Bolt URL
    #[arg(long, global = true)]
    url: Option<String>,

    #[arg(long, global = true)]
    database: Option<String>,

    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true, env = "LOANGRAPH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Rows per write transaction
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion (default)
    Run {
        /// Write into an in-memory graph instead of Neo4j
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the Cypher statements each step sends
    Queries,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        None => run(&cli, false).await,
        Some(Commands::Run { dry_run }) => run(&cli, *dry_run).await,
        Some(Commands::Queries) => print_queries(&cli.format),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "loangraph=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(source) = &cli.source {
        config.source.path = source.clone();
    }
    if let Some(url) = &cli.url {
        config.neo4j.url = url.clone();
    }
    if let Some(database) = &cli.database {
        config.neo4j.database = database.clone();
    }
    if let Some(user) = &cli.user {
        config.neo4j.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.neo4j.password = password.clone();
    }
    if let Some(batch_size) = cli.batch_size {
        config.neo4j.batch_size = batch_size;
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: &Cli, dry_run: bool) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    info!(
        "Loading {} into {} database {}",
        config.source.path.display(),
        config.neo4j.url,
        config.neo4j.database
    );

    let pipeline = Pipeline::new(config);
    let report = if dry_run {
        let sink = MemorySink::new();
        let report = run_pipeline(&pipeline, &sink).await?;
        let store = sink.store_read().await;
        info!(
            "In-memory graph: {} nodes, {} relationships",
            store.node_count(),
            store.edge_count()
        );
        report
    } else {
        let sink = BoltSink::connect(&pipeline.config().neo4j).await?;
        run_pipeline(&pipeline, &sink).await?
    };

    print_report(&report, &cli.format)
}

async fn run_pipeline(pipeline: &Pipeline, sink: &dyn GraphSink) -> anyhow::Result<PipelineReport> {
    pipeline.run(sink).await.context("ingestion failed")
}

fn print_report(report: &PipelineReport, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                "Step",
                "Rows",
                "Batches",
                "Nodes created",
                "Relationships created",
            ]);

            for step in &report.steps {
                let (nodes, rels) = match step.report.counters {
                    Some(c) => (c.nodes_created.to_string(), c.relationships_created.to_string()),
                    None => ("-".to_string(), "-".to_string()),
                };
                table.add_row(vec![
                    step.name.clone(),
                    step.report.rows.to_string(),
                    step.report.batches.to_string(),
                    nodes,
                    rels,
                ]);
            }

            println!("{}", table);
            println!("{} row(s) read", report.rows_read);
        }
    }
    Ok(())
}

fn print_queries(format: &OutputFormat) -> anyhow::Result<()> {
    let plan = ingestion_plan();
    match format {
        OutputFormat::Json => {
            let statements: serde_json::Map<String, serde_json::Value> = plan
                .iter()
                .map(|step| {
                    let statement = serde_json::Value::String(step.query.batched());
                    (step.name.to_string(), statement)
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&statements)?);
        }
        OutputFormat::Table => {
            for step in &plan {
                println!("// {}", step.name);
                println!("{}\n", step.query.batched());
            }
        }
    }
    Ok(())
}
