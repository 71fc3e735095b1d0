use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use rusty_lightcurves::{CoordAxis, Session, SessionConfig};

const USAGE: &str = "\
usage: rusty-lightcurves <file> [--config <cfg.json>] <command>

commands:
  summary                 valid/total object counts
  scatter                 log10(median flux), log10(frms) of valid objects as CSV
  lc <rank> [column]      cleaned lightcurve of the rank-th valid object
  coords <x|y> <rank>     centroid series with trend and spread extents
  object <rank>           object id and sky position";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

struct Args {
    file: PathBuf,
    config: Option<PathBuf>,
    command: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut file = None;
    let mut config = None;
    let mut command = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            "-c" | "--config" => {
                config = Some(PathBuf::from(args.next().context("--config needs a path")?));
            }
            _ if file.is_none() => file = Some(PathBuf::from(arg)),
            _ => command.push(arg),
        }
    }

    let file = file.with_context(|| format!("missing input file\n\n{USAGE}"))?;
    if command.is_empty() {
        bail!("missing command\n\n{USAGE}");
    }
    Ok(Args {
        file,
        config,
        command,
    })
}

fn parse_rank(arg: Option<&String>) -> Result<usize> {
    let arg = arg.context("missing <rank>")?;
    arg.parse()
        .with_context(|| format!("'{arg}' is not a valid rank"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ObjectInfo {
    rank: usize,
    index: usize,
    name: String,
    coordinates: rusty_lightcurves::SkyPosition,
}

// ---------------------------------------------------------------------------
// Entry-point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    log::debug!("{config:?}");

    let session = Session::open(&args.file, config)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let (_, summary) = session.summarize_default()?;

    let command: Vec<&str> = args.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["summary"] => print_json(&summary.overview())?,
        ["scatter"] => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["log_med_flux", "log_frms"])?;
            for [m, f] in summary.frms_scatter() {
                writer.write_record([m.to_string(), f.to_string()])?;
            }
            writer.flush()?;
        }
        ["lc", rest @ ..] => {
            let rank = parse_rank(args.command.get(1))?;
            let column = rest.get(1).copied().unwrap_or(session.config().flux_column.as_str());
            let row = session.rank_to_physical(rank)?;
            print_json(&session.lightcurve_report(column, row, session.config().bin_size)?)?;
        }
        ["coords", axis, _] => {
            let axis: CoordAxis = axis.parse()?;
            let rank = parse_rank(args.command.get(2))?;
            let row = session.rank_to_physical(rank)?;
            print_json(&session.coordinate_series(axis, row)?)?;
        }
        ["object", _] => {
            let rank = parse_rank(args.command.get(1))?;
            let index = session.rank_to_physical(rank)?;
            print_json(&ObjectInfo {
                rank,
                index,
                name: session.object_name(index)?,
                coordinates: session.sky_position(index)?,
            })?;
        }
        other => bail!("unknown command {other:?}\n\n{USAGE}"),
    }
    Ok(())
}
