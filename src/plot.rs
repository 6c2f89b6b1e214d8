use super::{Interval, TrendConfig, VERSION};
use clap::{App, Arg, ArgMatches};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub db_name: String,
    pub interval: Interval,
    pub svgout: Option<PathBuf>,
    pub verbose: bool,
    pub show: bool,
}

fn build_cli(defaults: &TrendConfig) -> App<'_, '_> {
    let arg_db = Arg::with_name("db")
        .help("SQLite database file name, resolved against the base data directory")
        .short("d")
        .long("db")
        .takes_value(true)
        .default_value(&defaults.db_name);
    let arg_interval = Arg::with_name("interval")
        .help("time interval for grouping the messages")
        .short("i")
        .long("interval")
        .takes_value(true)
        .possible_values(&Interval::VALUES)
        .default_value(defaults.interval.as_str());
    let arg_svgout = Arg::with_name("output_svgfile")
        .help("name of the output svg file")
        .long_help("defaults to category_trends_<interval>.svg in the base data directory")
        .short("o")
        .long("svgfile")
        .takes_value(true);
    let arg_verbose = Arg::with_name("verbose")
        .help("print debug information")
        .short("v")
        .long("verbose")
        .takes_value(false);
    let arg_no_show = Arg::with_name("no_show")
        .help("only write the svg file, do not open it in the system viewer")
        .long("no-show")
        .takes_value(false);
    App::new("category_trends")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot category counts over time from a SQLite database")
        .arg(arg_db)
        .arg(arg_interval)
        .arg(arg_svgout)
        .arg(arg_verbose)
        .arg(arg_no_show)
}

fn cli_args_from(matches: &ArgMatches, defaults: &TrendConfig) -> CliArgs {
    let db_name = matches
        .value_of("db")
        .map(String::from)
        .unwrap_or_else(|| defaults.db_name.clone());
    // clap already restricted the value to the possible ones
    let interval = matches
        .value_of("interval")
        .and_then(|v| v.parse::<Interval>().ok())
        .unwrap_or(defaults.interval);
    CliArgs {
        db_name,
        interval,
        svgout: matches.value_of("output_svgfile").map(PathBuf::from),
        verbose: matches.is_present("verbose"),
        show: !matches.is_present("no_show"),
    }
}

/// Takes the CLI arguments that select the database and the grouping interval.
pub fn parse_cli(defaults: &TrendConfig) -> CliArgs {
    let matches = build_cli(defaults).get_matches();
    cli_args_from(&matches, defaults)
}

/// svg path used when none is given on the command line
pub fn default_svgout(base: &Path, interval: Interval) -> PathBuf {
    base.join(format!("category_trends_{}.svg", interval))
}
