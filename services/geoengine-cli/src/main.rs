//! Geo Engine command-line client.
//!
//! Thin front end over `geoengine-client`:
//! - Create sessions and inspect them
//! - Register workflows and describe their output
//! - Fetch vector results as GeoJSON and download rasters as GeoTIFF
//! - List datasets, show quota and follow background tasks

mod query;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use geoengine_client::{
    get_quota, list_datasets, register_workflow_json, workflow_by_id, ClientConfig, Credentials,
    Session, Task,
};
use geoengine_common::{TaskId, WorkflowId};
use geoengine_protocol::DatasetOrder;

use query::QueryArgs;

#[derive(Parser, Debug)]
#[command(name = "geoengine")]
#[command(about = "Run workflows against a Geo Engine server")]
struct Args {
    /// API base url
    #[arg(long, env = "GEOENGINE_URL", default_value = "http://localhost:3030/api")]
    url: String,

    #[arg(long, env = "GEOENGINE_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "GEOENGINE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Reuse an existing session id instead of logging in
    #[arg(long, env = "GEOENGINE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "GEOENGINE_TIMEOUT_SECS", default_value = "3600")]
    timeout: u64,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a session and print it
    Session,

    /// Register a workflow definition from a JSON file
    Register { file: PathBuf },

    /// Print a workflow's result descriptor
    Describe { id: WorkflowId },

    /// Fetch a vector workflow as GeoJSON
    Dataframe {
        id: WorkflowId,

        #[command(flatten)]
        query: QueryArgs,

        /// Replace classification codes with class names
        #[arg(long)]
        resolve_classifications: bool,
    },

    /// Download a raster workflow as GeoTIFF
    DownloadRaster {
        id: WorkflowId,

        #[command(flatten)]
        query: QueryArgs,

        /// Output file, or directory when tiling
        #[arg(short, long)]
        output: PathBuf,

        /// Split into tiles of this many pixels per side
        #[arg(long)]
        tile_size: Option<u32>,

        /// Force this no-data value
        #[arg(long)]
        no_data: Option<f64>,
    },

    /// List datasets
    Datasets {
        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(long, default_value = "20")]
        limit: usize,

        /// Only names containing this
        #[arg(long)]
        filter: Option<String>,

        /// Sort by name descending
        #[arg(long)]
        desc: bool,
    },

    /// Show the session user's quota
    Quota,

    /// Show a task's status
    TaskStatus {
        id: TaskId,

        /// Poll until the task has finished
        #[arg(long)]
        wait: bool,

        /// Poll interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,
    },
}

impl Args {
    /// Email and password win over a token; nothing means anonymous.
    fn credentials(&self) -> Credentials {
        match (&self.email, &self.password, &self.token) {
            (Some(email), Some(password), _) => Credentials::login(email, password),
            (_, _, Some(token)) => Credentials::Token(token.clone()),
            _ => Credentials::Anonymous,
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let config = ClientConfig::default().with_request_timeout(Duration::from_secs(args.timeout));
    let session = Session::connect(&args.url, args.credentials(), &config)
        .await
        .with_context(|| format!("Failed to create a session on {}", args.url))?;

    match args.command {
        Command::Session => {
            print!("{}", session);
        }
        Command::Register { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let definition: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let handle = register_workflow_json(&session, definition).await?;
            println!("{}\t{}", handle.id(), handle.kind());
        }
        Command::Describe { id } => {
            let handle = workflow_by_id(&session, id).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(handle.get_result_descriptor())?
            );
        }
        Command::Dataframe {
            id,
            query,
            resolve_classifications,
        } => {
            let handle = workflow_by_id(&session, id).await?;
            let table = handle
                .get_dataframe(&session, &query.to_query()?, resolve_classifications)
                .await?;
            info!(rows = table.len(), "Fetched features");
            println!(
                "{}",
                serde_json::to_string_pretty(&table.to_feature_collection())?
            );
        }
        Command::DownloadRaster {
            id,
            query,
            output,
            tile_size,
            no_data,
        } => {
            let handle = workflow_by_id(&session, id).await?;
            let query = query.to_query()?;

            match tile_size {
                Some(size) => {
                    let tiles = handle
                        .download_raster_tiled(&session, &query, size, size, &output)
                        .await?;
                    for tile in tiles {
                        println!("{}\t{}", tile.path.display(), tile.bytes);
                    }
                }
                None => {
                    let bytes = handle
                        .download_raster(&session, &query, &output, no_data)
                        .await?;
                    println!("{}\t{}", output.display(), bytes);
                }
            }
        }
        Command::Datasets {
            offset,
            limit,
            filter,
            desc,
        } => {
            let order = if desc {
                DatasetOrder::NameDesc
            } else {
                DatasetOrder::NameAsc
            };
            let datasets = list_datasets(&session, offset, limit, order, filter.as_deref()).await?;
            for dataset in datasets {
                println!(
                    "{}\t{}\t{}",
                    dataset.name,
                    dataset.result_descriptor.kind(),
                    dataset.display_name
                );
            }
        }
        Command::Quota => {
            let quota = get_quota(&session, None).await?;
            println!("available: {}\nused: {}", quota.available, quota.used);
        }
        Command::TaskStatus { id, wait, interval } => {
            let task = Task::new(id);
            let status = if wait {
                task.wait_for_finish(&session, Duration::from_secs(interval.max(1)))
                    .await?
            } else {
                task.status(&session).await?
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("geoengine").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_login_wins_over_token() {
        let args = parse(&[
            "--email",
            "foo@example.com",
            "--password",
            "secret",
            "--token",
            "e327d9c3-a4f3-4bd7-a5e1-30b26cae8064",
            "quota",
        ]);
        assert_eq!(
            args.credentials(),
            Credentials::login("foo@example.com", "secret")
        );
    }

    #[test]
    fn test_email_without_password_falls_back() {
        let args = parse(&["--email", "foo@example.com", "session"]);
        assert!(matches!(
            args.credentials(),
            Credentials::Anonymous | Credentials::Token(_)
        ));
    }

    #[test]
    fn test_download_raster_args() {
        let args = parse(&[
            "download-raster",
            "c1b1b4ab-0d2c-5c5e-a5ee-e4c1e7fe2b4c",
            "--time",
            "2014-04-01T12:00:00Z",
            "--output",
            "tiles",
            "--tile-size",
            "512",
        ]);
        match args.command {
            Command::DownloadRaster {
                tile_size, query, ..
            } => {
                assert_eq!(tile_size, Some(512));
                assert_eq!(query.bbox, "-180,-90,180,90");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_workflow_id() {
        let result = Args::try_parse_from(["geoengine", "describe", "not-a-uuid"]);
        assert!(result.is_err());
    }
}
