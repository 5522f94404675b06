use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use moodspace::{AssetId, AssetKind, ProjectSession, RepositoryOpts, SessionOpts, Vec3};

#[derive(Parser, Debug)]
#[command(name = "moodspace", version)]
struct Cli {
    /// Project directory.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Read-only directory of built-in sounds.
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Worker threads for hashing and waveform extraction.
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Log at debug level.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect and edit the asset catalog.
    #[command(subcommand)]
    Assets(AssetsCommand),
    /// Inspect and edit the scene.
    #[command(subcommand)]
    Scene(SceneCommand),
}

#[derive(Subcommand, Debug)]
enum AssetsCommand {
    /// List assets, most recent first.
    List,
    /// Import a file into the project.
    Import {
        /// File to import.
        file: PathBuf,
        /// Stored filename; defaults to the source filename.
        #[arg(long)]
        name: Option<String>,
    },
    /// Rename an asset and update the scene references.
    Rename {
        /// Asset id.
        id: String,
        /// New base name (extension is kept).
        name: String,
    },
    /// Copy an asset under a new name.
    Duplicate {
        /// Asset id.
        id: String,
        /// New base name; defaults to "<name> copy".
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete an asset and every placement using it.
    Delete {
        /// Asset id.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum SceneCommand {
    /// Print the scene document as JSON.
    Show,
    /// Place an asset at a position.
    Place {
        /// Asset id.
        id: String,
        /// X coordinate in meters.
        #[arg(long, default_value_t = 0.0)]
        x: f32,
        /// Y coordinate in meters.
        #[arg(long, default_value_t = 0.0)]
        y: f32,
        /// Z coordinate in meters.
        #[arg(long, default_value_t = 0.0)]
        z: f32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    let opts = SessionOpts {
        repository: RepositoryOpts {
            backfill_threads: cli.threads,
            library_dir: cli.library.clone(),
            ..RepositoryOpts::default()
        },
        ..SessionOpts::default()
    };
    let mut session = ProjectSession::open(&cli.project, opts)
        .with_context(|| format!("open project '{}'", cli.project.display()))?;

    match cli.cmd {
        Command::Assets(cmd) => cmd_assets(&mut session, cmd),
        Command::Scene(cmd) => cmd_scene(&mut session, cmd),
    }
}

fn cmd_assets(session: &mut ProjectSession, cmd: AssetsCommand) -> anyhow::Result<()> {
    match cmd {
        AssetsCommand::List => {
            for asset in session.assets().assets() {
                let detail = match &asset.kind {
                    AssetKind::Image(m) => format!("{}x{}", m.width, m.height),
                    AssetKind::Sound(m) => match m.duration_sec {
                        Some(d) => format!("{d:.2}s {:?}", m.channel),
                        None => format!("{:?}", m.channel),
                    },
                };
                let uses = session.scene().usage().usage_count(&asset.id);
                println!(
                    "{}\t{:?}\t{}\t{} bytes\t{} uses",
                    asset.id,
                    asset.asset_type(),
                    detail,
                    asset.filesize,
                    uses
                );
            }
        }
        AssetsCommand::Import { file, name } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("read '{}'", file.display()))?;
            let name = match name {
                Some(n) => n,
                None => file
                    .file_name()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("no usable filename in '{}'", file.display()))?,
            };
            let asset = session.import_asset(&bytes, &name)?;
            println!("{}", asset.id);
        }
        AssetsCommand::Rename { id, name } => {
            let asset = session.rename_asset(&AssetId::from_raw(id), &name)?;
            println!("{}", asset.id);
        }
        AssetsCommand::Duplicate { id, name } => {
            let asset = session.duplicate_asset(&AssetId::from_raw(id), name.as_deref())?;
            println!("{}", asset.id);
        }
        AssetsCommand::Delete { id } => {
            let removed = session.delete_asset(&AssetId::from_raw(id))?;
            eprintln!("removed {} placement(s)", removed.len());
        }
    }
    Ok(())
}

fn cmd_scene(session: &mut ProjectSession, cmd: SceneCommand) -> anyhow::Result<()> {
    match cmd {
        SceneCommand::Show => {
            let doc = session.scene().to_document();
            let json = serde_json::to_string_pretty(&doc).context("encode scene JSON")?;
            println!("{json}");
        }
        SceneCommand::Place { id, x, y, z } => {
            let object = session.place_asset(&AssetId::from_raw(id), Vec3::new(x, y, z))?;
            println!("{object}");
        }
    }
    Ok(())
}
