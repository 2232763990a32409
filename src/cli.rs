use clap::{Parser, Subcommand, Args};
use std::path::PathBuf;
use colored::*;

#[derive(Parser, Debug)]
#[command(
    name = "fitssweep",
    about = "Delete or move FITS files whose headers match a condition",
    version,
    long_about = "fitssweep reads the header of every FITS file in a directory,\n\
                  evaluates a condition over its keywords and, for each match,\n\
                  lets you delete the file or move it aside.\n\n\
                  Features:\n\
                  • Conditions: ECC > 0.8, GAIN == 100 and OFFSET == 30, ...\n\
                  • Escalation: answer D or M once to apply to every later match\n\
                  • Safe moves: existing files are never overwritten\n\
                  • Dry runs and trash deletion"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use this config file instead of ~/.fitssweep.json
    #[arg(long, global = true, env = "FITSSWEEP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Examine files and delete or move the ones matching a condition
    Run(RunArgs),

    /// Print selected header keywords for every file under a directory
    List(ListArgs),

    /// Check a condition and show the header keywords it uses
    Fields(FieldsArgs),

    /// Show configuration
    Config,

    /// Show help and examples
    ShowHelp,

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory holding the files to examine
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Existing directory that moved files go into
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Condition over header keywords, e.g. "ECC > 0.8"
    #[arg(short, long = "expr")]
    pub expression: Option<String>,

    /// File extension to examine (default from config, "fits")
    #[arg(long)]
    pub extension: Option<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Show what would happen without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Send deleted files to the trash instead of removing them
    #[arg(long)]
    pub trash: bool,

    /// Take missing options from the config instead of prompting
    #[arg(long)]
    pub defaults: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory to list
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Keyword to show; repeat for more (default from config)
    #[arg(short = 'k', long = "keyword")]
    pub keywords: Vec<String>,

    /// File extension to list (default from config, "fits")
    #[arg(long)]
    pub extension: Option<String>,

    /// Only list the top level, not subdirectories
    #[arg(long)]
    pub flat: bool,
}

#[derive(Args, Debug)]
pub struct FieldsArgs {
    /// Condition to check
    pub expression: String,
}

impl Cli {
    /// Print help with examples
    pub fn print_help() {
        println!("{}", "🔭 FITSSWEEP - HEADER-DRIVEN FILE SWEEPER".bold().green());
        println!();
        println!("{}", "USAGE:".bold());
        println!("  fitssweep [OPTIONS] <COMMAND>");
        println!();
        println!("{}", "OPTIONS:".bold());
        println!("  -v, --verbose    Verbose logging");
        println!("  --no-color       Disable colored output");
        println!("  --config PATH    Config file (env FITSSWEEP_CONFIG)");
        println!("  -h, --help       Print help");
        println!("  -V, --version    Print version");
        println!();
        println!("{}", "COMMANDS:".bold());
        println!();
        println!("  {}  Examine files and act on matches", "run".cyan().bold());
        println!("      fitssweep run");
        println!("      fitssweep run -s ~/lights -d ~/rejects -e \"ECC > 0.8\"");
        println!("      fitssweep run --defaults --dry-run");
        println!();
        println!("  {}  Print header keywords per file", "list".cyan().bold());
        println!("      fitssweep list ~/lights");
        println!("      fitssweep list ~/lights -k FILTER -k EXPTIME");
        println!();
        println!("  {}  Check a condition", "fields".cyan().bold());
        println!("      fitssweep fields \"GAIN == 100 and OFFSET == 30\"");
        println!();
        println!("  {}  Show configuration", "config".cyan().bold());
        println!("      fitssweep config");
        println!();
        println!("{}", "CONDITIONS:".bold().cyan());
        println!("  • Compare keywords with ==, !=, <, <=, >, >=");
        println!("  • Combine with and, or, not and parentheses");
        println!("  • Strings in quotes: FILTER == 'Ha'");
        println!("  • Odd keyword names in backticks: `DATE-OBS` >= '2021-01-01'");
        println!("  • Files missing a keyword are always skipped");
        println!();
        println!("{}", "AT EACH MATCH:".bold().cyan());
        println!("  d  delete this file        D  delete every match from now on");
        println!("  m  move this file          M  move every match from now on");
        println!("  enter  skip                q  quit");
    }

    /// Print version information
    pub fn print_version() {
        println!("🔭 fitssweep v{}", env!("CARGO_PKG_VERSION"));
        println!("Delete or move FITS files by header condition");
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
    }
}

impl Commands {
    /// Get the command name
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run(_) => "run",
            Commands::List(_) => "list",
            Commands::Fields(_) => "fields",
            Commands::Config => "config",
            Commands::ShowHelp => "help",
            Commands::Version => "version",
        }
    }
}
