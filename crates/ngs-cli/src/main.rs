use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use ngs_core::{init_tracing, init_tracing_with_filter, BatchOptions, ConvertConfig, ConvertSession, DEFAULT_SCAN_DIR};
use tracing::debug;

mod discover;

fn cli() -> Command {
    Command::new("ngs")
        .version(ngs_core::VERSION)
        .about("Tools for NGS framework projects")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every converted unit")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert legacy NGS.createLoad / NGS.createAction files into ES classes")
                .arg(
                    Arg::new("module")
                        .short('m')
                        .long("module")
                        .value_name("NAME")
                        .help("Module to convert (default module when omitted)")
                        .default_value(""),
                )
                .arg(
                    Arg::new("root")
                        .long("root")
                        .value_name("DIR")
                        .help("Project root")
                        .default_value("."),
                )
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .value_name("SUBDIR")
                        .help("Directory below the module JS root to scan")
                        .default_value(DEFAULT_SCAN_DIR),
                )
                .arg(
                    Arg::new("aliases")
                        .long("aliases")
                        .value_name("FILE")
                        .help("Alias table (default: convert.config.json in the project root)"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Report what would change without writing")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("backup")
                        .long("backup")
                        .help("Keep a .backup copy of every overwritten file")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("paths")
                        .value_name("PATH")
                        .help("Files or directories to convert instead of the scan directory")
                        .num_args(0..),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let tracing = if matches.get_flag("verbose") {
        init_tracing_with_filter("ngs_core=debug")
    } else {
        init_tracing()
    };
    if let Err(err) = tracing {
        eprintln!("warning: logging disabled: {err}");
    }

    match matches.subcommand() {
        Some(("convert", args)) => run_convert(args),
        _ => unreachable!("clap enforces a subcommand"),
    }
}

fn run_convert(args: &ArgMatches) -> Result<()> {
    let module = args.get_one::<String>("module").cloned().unwrap_or_default();
    let config = ConvertConfig {
        project_root: args
            .get_one::<String>("root")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        alias_file: args.get_one::<String>("aliases").map(PathBuf::from),
        scan_dir: args
            .get_one::<String>("dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCAN_DIR)),
        ..Default::default()
    };
    let options = BatchOptions {
        dry_run: args.get_flag("dry-run"),
        backup_originals: args.get_flag("backup"),
    };

    let mut session = ConvertSession::new(config);
    let converter = session
        .converter(&module)
        .with_context(|| format!("Failed to configure module '{module}'"))?;

    let roots: Vec<PathBuf> = match args.get_many::<String>("paths") {
        Some(paths) => paths.map(PathBuf::from).collect(),
        None => {
            let root = session.scan_root(&module);
            if !root.is_dir() {
                bail!("Scan directory {} does not exist", root.display());
            }
            vec![root]
        }
    };

    let mut sources = Vec::new();
    for root in &roots {
        sources.extend(discover::script_sources(root));
    }
    debug!(files = sources.len(), "collected candidate sources");

    let summary = converter.convert_batch(sources, &options);

    for failure in &summary.failures {
        eprintln!("error: {failure}");
    }
    let verb = if options.dry_run { "would convert" } else { "converted" };
    println!(
        "{verb} {}, skipped {}, failed {}",
        summary.converted_count(),
        summary.skipped_count(),
        summary.errored_count()
    );

    if !summary.success() {
        bail!("{} file(s) could not be converted", summary.errored_count());
    }
    Ok(())
}
