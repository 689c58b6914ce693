// crates/axigram-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axigram_core::{Component, DatabaseSession, ForceSource, Receiver, Source, SourceMechanism};

#[derive(Parser, Debug)]
#[command(
    name = "axigram",
    about = "Extract synthetic seismograms from an axisymmetric wavefield database",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print database metadata as JSON.
    Info {
        /// Database root directory (containing PX/PZ or MZZ/… subfolders)
        db_path: PathBuf,
    },

    /// Extract seismograms for one source/receiver pair.
    Seismograms {
        /// Database root directory
        db_path: PathBuf,

        /// Source latitude in degrees
        #[arg(long)]
        source_lat: f64,

        /// Source longitude in degrees
        #[arg(long)]
        source_lon: f64,

        /// Source depth in metres
        #[arg(long, default_value_t = 0.0)]
        source_depth_m: f64,

        /// Moment tensor components in N·m: m_rr,m_tt,m_pp,m_rt,m_rp,m_tp
        #[arg(long, value_delimiter = ',', num_args = 6, allow_hyphen_values = true)]
        moment_tensor: Option<Vec<f64>>,

        /// Force components in N: f_r,f_t,f_p
        #[arg(long, value_delimiter = ',', num_args = 3, allow_hyphen_values = true)]
        force: Option<Vec<f64>>,

        /// Receiver latitude in degrees
        #[arg(long)]
        receiver_lat: f64,

        /// Receiver longitude in degrees
        #[arg(long)]
        receiver_lon: f64,

        /// Components to extract, e.g. ZNE or ZNERT
        #[arg(long, default_value = "ZNE")]
        components: String,

        /// Cut the leading source-shift samples from the traces
        #[arg(long, default_value_t = false)]
        remove_source_shift: bool,

        /// Buffer budget per field kind in megabytes
        #[arg(long, default_value_t = axigram_core::DEFAULT_BUFFER_MB)]
        buffer_mb: u64,

        /// Keep the nodal arrays on disk instead of reading them at open
        #[arg(long, default_value_t = false)]
        read_on_demand: bool,

        /// Output JSON path (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Info { db_path } => print_info(&db_path),

        Cmd::Seismograms {
            db_path,
            source_lat,
            source_lon,
            source_depth_m,
            moment_tensor,
            force,
            receiver_lat,
            receiver_lon,
            components,
            remove_source_shift,
            buffer_mb,
            read_on_demand,
            out,
        } => extract(
            &db_path,
            source_lat,
            source_lon,
            source_depth_m,
            moment_tensor,
            force,
            receiver_lat,
            receiver_lon,
            &components,
            remove_source_shift,
            buffer_mb,
            read_on_demand,
            out,
        ),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn print_info(db_path: &Path) -> Result<()> {
    let session = DatabaseSession::open(db_path)
        .with_context(|| format!("open database under {}", db_path.display()))?;
    let db_info = session.info().context("collect database info")?;
    println!("{}", serde_json::to_string_pretty(&db_info)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn extract(
    db_path: &Path,
    source_lat: f64,
    source_lon: f64,
    source_depth_m: f64,
    moment_tensor: Option<Vec<f64>>,
    force: Option<Vec<f64>>,
    receiver_lat: f64,
    receiver_lon: f64,
    components: &str,
    remove_source_shift: bool,
    buffer_mb: u64,
    read_on_demand: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let source: SourceMechanism = match (moment_tensor, force) {
        (Some(m), None) => Source::new(
            source_lat,
            source_lon,
            source_depth_m,
            m[0],
            m[1],
            m[2],
            m[3],
            m[4],
            m[5],
        )
        .into(),
        (None, Some(f)) => {
            ForceSource::new(source_lat, source_lon, source_depth_m, f[0], f[1], f[2]).into()
        }
        (None, None) => bail!("one of --moment-tensor or --force is required"),
        (Some(_), Some(_)) => bail!("--moment-tensor and --force are mutually exclusive"),
    };
    let receiver = Receiver::new(receiver_lat, receiver_lon);
    let components = Component::parse_list(components).context("parse component list")?;

    let mut session = DatabaseSession::open_with(db_path, buffer_mb, read_on_demand)
        .with_context(|| format!("open database under {}", db_path.display()))?;

    let traces = session
        .get_seismograms_shifted(&source, &receiver, &components, remove_source_shift)
        .context("extract seismograms")?;
    info!(components = traces.len(), "extraction finished");

    let json: BTreeMap<String, Vec<f64>> = traces
        .into_iter()
        .map(|(comp, series)| (comp.to_string(), series.to_vec()))
        .collect();

    match out {
        Some(path) => {
            let f = File::create(&path).with_context(|| format!("create {}", path.display()))?;
            let mut w = BufWriter::new(f);
            serde_json::to_writer(&mut w, &json).context("serialize seismograms")?;
            w.flush()?;
            info!(path = %path.display(), "seismograms written");
        }
        None => println!("{}", serde_json::to_string(&json)?),
    }
    Ok(())
}
