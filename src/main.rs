use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::error;
use serde_json::Value;

use admin_assets::editor::EditSession;
use admin_assets::entity::EntityKind;
use admin_assets::error::{AssetError, Result};
use admin_assets::media::{AssetEncoder, EncodedAsset, MediaKind, RawHandle};
use admin_assets::picker::{FileSelection, PickerEvent};
use admin_assets::store::{Catalog, RecordStore};
use admin_assets::submit::{FormFields, OutboundRecord};
use admin_assets::Config;

#[derive(Parser, Debug)]
#[command(name = "admin-assets")]
#[command(
    about = "Prepare and store association console records with their media",
    long_about = None
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record catalog (overrides the configuration)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode one file the way a save would and print the payload
    Encode {
        path: PathBuf,
        /// Treat the file as a document (never recompressed)
        #[arg(long)]
        document: bool,
        /// Write the encoded bytes here instead of printing the data string
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create a record
    Create {
        entity: EntityKind,
        #[command(flatten)]
        edit: EditArgs,
    },
    /// Update a stored record
    Update {
        entity: EntityKind,
        id: i64,
        #[command(flatten)]
        edit: EditArgs,
        /// Remove the record's asset
        #[arg(long, conflicts_with = "file")]
        remove_asset: bool,
    },
    /// Print a stored record
    Show { entity: EntityKind, id: i64 },
    /// Print all records of one entity
    List { entity: EntityKind },
}

#[derive(Args, Debug)]
struct EditArgs {
    /// JSON object with form values
    #[arg(long)]
    fields: Option<PathBuf>,
    /// Single form value, `key=value` (value parsed as JSON when possible)
    #[arg(long = "set", value_parser = parse_assignment)]
    set: Vec<(String, Value)>,
    /// File to pick; repeated picks keep the last one
    #[arg(long)]
    file: Vec<PathBuf>,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog.clone();
    }

    match cli.command {
        Command::Encode {
            path,
            document,
            out,
        } => encode_file(&config, path, document, out).await,
        Command::Create { entity, edit } => {
            let mut catalog = Catalog::open(&config.catalog_path()?)?;
            let mut session = EditSession::create(entity);
            apply_edits(&mut session, &edit).await?;
            save(&config, &mut catalog, &mut session).await
        }
        Command::Update {
            entity,
            id,
            edit,
            remove_asset,
        } => {
            let mut catalog = Catalog::open(&config.catalog_path()?)?;
            let mut session = EditSession::open(&catalog, entity, id)?;
            apply_edits(&mut session, &edit).await?;
            if remove_asset {
                session.pick(PickerEvent::Clear);
            }
            save(&config, &mut catalog, &mut session).await
        }
        Command::Show { entity, id } => {
            let catalog = Catalog::open(&config.catalog_path()?)?;
            print_record(id, catalog.get(entity, id)?)
        }
        Command::List { entity } => {
            let catalog = Catalog::open(&config.catalog_path()?)?;
            let records = catalog.list(entity)?;
            println!("📁 {} {} record(s)", records.len(), entity);
            for (id, record) in records {
                print_record(id, record)?;
            }
            Ok(())
        }
    }
}

async fn encode_file(
    config: &Config,
    path: PathBuf,
    document: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let handle = RawHandle::from_path(&path).await?;
    let kind = if document {
        MediaKind::Document
    } else {
        handle.kind()
    };

    let asset = config.encoding_policy().encode(&handle, kind).await?;
    println!(
        "📦 {}: {} ({} bytes) -> {} ({} bytes)",
        handle.name(),
        handle.media_type(),
        handle.byte_length(),
        asset.media_type(),
        asset.bytes().len()
    );

    match out {
        Some(out) => {
            tokio::fs::write(&out, asset.bytes()).await?;
            println!("   → {}", out.display());
        }
        None => println!("{}", asset.to_data_uri()),
    }
    Ok(())
}

async fn apply_edits(session: &mut EditSession, edit: &EditArgs) -> Result<()> {
    if let Some(path) = &edit.fields {
        let json = tokio::fs::read_to_string(path).await?;
        let fields: FormFields = serde_json::from_str(&json)?;
        session.set_fields(fields);
    }
    for (key, value) in &edit.set {
        session.set_field(key.clone(), value.clone());
    }
    for path in &edit.file {
        let selection = FileSelection::local_file(path).await?;
        if let Some(warning) = session.pick(PickerEvent::add(selection)) {
            println!("⚠️  {}", warning);
        }
    }
    Ok(())
}

async fn save(config: &Config, catalog: &mut Catalog, session: &mut EditSession) -> Result<()> {
    let encoder = session.encoder_for(&config.encoding_policy());
    let id = session
        .save(catalog, &encoder, config.numeric_defaults())
        .await?;
    println!("✅ {} #{} saved", session.kind(), id);
    Ok(())
}

/// Print a record with inline payloads shortened to type and size
fn print_record(id: i64, mut record: OutboundRecord) -> Result<()> {
    for value in record.values_mut() {
        if let Some(asset) = value.as_str().and_then(EncodedAsset::from_data_uri) {
            *value = Value::String(format!(
                "<{}, {} bytes>",
                asset.media_type(),
                asset.bytes().len()
            ));
        }
    }
    let json = serde_json::to_string_pretty(&record).map_err(AssetError::from)?;
    println!("#{} {}", id, json);
    Ok(())
}
