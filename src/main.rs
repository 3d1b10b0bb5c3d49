use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};
use lampgen::config::{ConfigFile, Settings};
use std::path::{Path, PathBuf};

fn destination_arg() -> Arg {
    Arg::new("destination")
        .help("Directory the scaffold is written to [default: lamp-ansible]")
        .value_parser(value_parser!(PathBuf))
}

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help("TOML config file [default: ./lampgen.toml when present]")
        .value_parser(value_parser!(PathBuf))
}

fn cli() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("generate")
                .about("Writes the Ansible LAMP scaffold, overwriting files that already exist")
                .arg(destination_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("atomic")
                        .long("atomic")
                        .help("Undo every change if any file cannot be written")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("dry-run")
                        .short('n')
                        .long("dry-run")
                        .help("Print the tree that would be written and exit")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Reports files that are missing or differ from the scaffold")
                .arg(destination_arg())
                .arg(config_arg()),
        )
        .subcommand(Command::new("list").about("Lists the files the scaffold contains"))
}

fn init_logging(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, 2) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn settings(args: &ArgMatches, atomic: bool) -> miette::Result<Settings> {
    let file = ConfigFile::discover(
        args.get_one::<PathBuf>("config").map(PathBuf::as_path),
        Path::new("."),
    )?;

    Ok(Settings::resolve(
        file,
        args.get_one::<PathBuf>("destination").cloned(),
        atomic,
    ))
}

fn handle_generate(args: &ArgMatches) -> miette::Result<()> {
    let settings = settings(args, args.get_flag("atomic"))?;

    if args.get_flag("dry-run") {
        lampgen::api::preview(&settings);
        return Ok(());
    }

    lampgen::api::generate(&settings)?;

    Ok(())
}

fn handle_check(args: &ArgMatches) -> miette::Result<()> {
    let settings = settings(args, false)?;

    lampgen::api::check(&settings)?;

    Ok(())
}

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = cli().get_matches();

    init_logging(matches.get_count("verbose"), matches.get_flag("quiet"));

    match matches.subcommand() {
        Some(("generate", args)) => handle_generate(args),
        Some(("check", args)) => handle_check(args),
        Some(("list", _)) => {
            lampgen::api::list_files();
            Ok(())
        }
        _ => unreachable!(),
    }
}
