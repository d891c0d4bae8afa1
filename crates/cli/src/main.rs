use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nimbus_core::config;
use nimbus_core::config::AppConfig;
use nimbus_core::models::FileRecord;
use nimbus_core::store::FileStore;
use nimbus_core::sync;
use remote::http::HttpTransport;
use remote::probe::ServerProbe;
use remote::resolver::ServerInfoResolver;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nimbus", about = "Cloud-storage sync core: server discovery and metadata reconciliation")]
struct Cli {
    /// Path to a config file (defaults to config/default.toml)
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover a server's version, TLS posture and authentication method
    Probe {
        /// Base URL; defaults to server.base_url from the config
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Merge a JSON remote listing into the local mirror
    Import {
        /// File holding a JSON array of remote file records
        file: PathBuf,
        /// Account the records belong to; defaults to account.owner
        #[arg(long)]
        owner: Option<String>,
        /// Validate the server before writing anything
        #[arg(long)]
        probe: bool,
    },
    /// List the locally mirrored contents of a folder
    Ls {
        #[arg(long)]
        parent: i64,
        /// Only records whose mime type starts with this prefix
        #[arg(long)]
        mime: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Delete one local record by id (no cascade)
    Rm { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Probe { url, json } => run_probe(cfg, url.as_deref(), json).await,
        Commands::Import { file, owner, probe } => {
            run_import(cfg, &file, owner.as_deref(), probe).await
        }
        Commands::Ls { parent, mime, json } => run_ls(cfg, parent, mime.as_deref(), json).await,
        Commands::Rm { id } => run_rm(cfg, id).await,
    }
}

fn build_resolver() -> Result<ServerInfoResolver> {
    let transport = HttpTransport::new()?;
    Ok(ServerInfoResolver::new(ServerProbe::new(Arc::new(transport))))
}

async fn open_pool(cfg: &AppConfig) -> Result<SqlitePool> {
    let pool = storage::connect(&cfg.database.path).await.context("db connect")?;
    storage::migrate(&pool).await.context("db migrate")?;
    Ok(pool)
}

async fn run_probe(cfg: AppConfig, url: Option<&str>, json: bool) -> Result<()> {
    let url = url.unwrap_or(&cfg.server.base_url);
    let info = build_resolver()?.get_server_info(url).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("server:   {}", info.base_url);
        println!("version:  {}", info.version);
        println!("tls:      {}", if info.is_secure_connection { "yes" } else { "no" });
        println!("auth:     {:?}", info.authentication_method);
    }
    Ok(())
}

async fn run_import(cfg: AppConfig, file: &PathBuf, owner: Option<&str>, probe: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading listing {}", file.display()))?;
    let records: Vec<FileRecord> = serde_json::from_str(&raw).context("parsing listing")?;
    let owner = owner.unwrap_or(&cfg.account.owner);
    let pool = open_pool(&cfg).await?;

    let merged = if probe {
        let resolver = build_resolver()?;
        let summary =
            sync::run_sync_pass(&resolver, &pool, &cfg.server.base_url, owner, records).await?;
        println!(
            "server {} ({}) ok",
            summary.server.base_url, summary.server.version
        );
        summary.merged
    } else {
        sync::import_listing(&pool, owner, records).await?
    };
    println!("merged {merged} records for {owner}");
    Ok(())
}

async fn run_ls(cfg: AppConfig, parent: i64, mime: Option<&str>, json: bool) -> Result<()> {
    let pool = open_pool(&cfg).await?;
    let store = FileStore::new(pool);
    let records = match mime {
        Some(prefix) => store.get_folder_content_by_mime(parent, prefix).await?,
        None => store.get_folder_content(parent).await?,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for r in &records {
        let modified = chrono::DateTime::from_timestamp(r.modified_timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:>6}  {:<24} {:>10}  {}  {}",
            r.id.unwrap_or_default(),
            r.mime_type,
            r.length,
            modified,
            r.remote_path
        );
    }
    println!("{} records", records.len());
    Ok(())
}

async fn run_rm(cfg: AppConfig, id: i64) -> Result<()> {
    let pool = open_pool(&cfg).await?;
    let store = FileStore::new(pool);
    match store.get_file_by_id(id).await? {
        Some(record) => {
            store.delete_file_by_id(id).await?;
            println!("deleted {} ({})", id, record.remote_path);
        }
        None => println!("no record with id {id}"),
    }
    Ok(())
}
