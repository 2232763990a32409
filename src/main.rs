use anyhow::{Result, Context};
use clap::Parser;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use fits_sweep::action::{self, ConsolePrompter};
use fits_sweep::cli::{self, Cli, Commands};
use fits_sweep::colors;
use fits_sweep::config::{Config, DeleteMode};
use fits_sweep::expr::analyze;
use fits_sweep::header::FitsReader;
use fits_sweep::listing;
use fits_sweep::ops::{DiskOps, DryRunOps, FileOps};
use fits_sweep::sweep::{self, ConfigError, RunRequest, SweepSummary};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Disable colors if requested
    if cli.no_color {
        colored::control::set_override(false);
    }

    init_logging(cli.verbose);

    // Handle help and version commands first
    match cli.command {
        Commands::ShowHelp => {
            Cli::print_help();
            return Ok(());
        }
        Commands::Version => {
            Cli::print_version();
            return Ok(());
        }
        _ => {}
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let mut config = Config::load_from(&config_path).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run(args) => handle_run(&mut config, &config_path, &args)?,
        Commands::List(args) => handle_list(&config, &args)?,
        Commands::Fields(args) => handle_fields(&args)?,
        Commands::Config => config.display(&config_path),
        Commands::ShowHelp | Commands::Version => unreachable!(),
    }

    Ok(())
}

/// Diagnostics go to stderr so they never mix with the per-file report.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_run(config: &mut Config, config_path: &Path, args: &cli::RunArgs) -> Result<()> {
    let theme = ColorfulTheme::default();
    let interactive = !args.defaults;

    let source_dir = match &args.source {
        Some(path) => path.clone(),
        None if interactive => prompt_path(&theme, "Source directory", &config.source_dir)?,
        None => config.source_dir.clone(),
    };
    let destination_dir = match &args.destination {
        Some(path) => path.clone(),
        None if interactive => prompt_path(&theme, "Destination directory", &config.destination_dir)?,
        None => config.destination_dir.clone(),
    };
    let expression = match &args.expression {
        Some(expr) => expr.clone(),
        None if interactive => prompt_expression(&theme, &config.expression)?,
        None => config.expression.clone(),
    };

    let request = RunRequest {
        source_dir,
        destination_dir,
        expression,
        extension: args.extension.clone().unwrap_or_else(|| config.extension.clone()),
        recursive: args.recursive,
        dry_run: args.dry_run,
    };

    let summary = if args.dry_run {
        sweep_files(&request, DryRunOps)?
    } else {
        let delete_mode = if args.trash { DeleteMode::Trash } else { config.delete_mode };
        sweep_files(&request, DiskOps::new(delete_mode))?
    };
    let Some(summary) = summary else {
        return Ok(());
    };

    // Remember this run's answers as the next run's defaults
    config.source_dir = request.source_dir;
    config.destination_dir = request.destination_dir;
    config.expression = request.expression;
    config.extension = request.extension;
    config.record_run();
    config.save_to(config_path).context("Failed to save configuration")?;

    summary.print(args.dry_run);
    Ok(())
}

/// `None` when the source holds no candidate files.
fn sweep_files<O: FileOps>(request: &RunRequest, ops: O) -> Result<Option<SweepSummary>> {
    let mut prepared = sweep::prepare_run(request, FitsReader, ops, ConsolePrompter::new())?;

    let source = request.source_dir.display().to_string();
    if prepared.files.is_empty() {
        println!(
            "{} No .{} files in {}",
            "⚠️".yellow(),
            request.extension.trim_start_matches('.'),
            source.color(colors::PATH)
        );
        return Ok(None);
    }
    println!(
        "{} {} files found in {}",
        "🔭".cyan(),
        prepared.files.len().to_string().bold(),
        source.color(colors::PATH)
    );
    println!(
        "{} Destination directory set to {}",
        "✅".green(),
        request.destination_dir.display().to_string().color(colors::PATH)
    );
    println!(
        "{} Fields referenced: {}",
        "🔑".cyan(),
        prepared.sweeper.condition().fields().to_string().bold()
    );
    println!();
    action::print_legend();

    if request.dry_run {
        println!("{}", "🔒 DRY RUN - no files will be modified".bold().color(colors::WARNING));
        println!();
    }
    prepared.run().map(Some)
}

fn prompt_path(theme: &ColorfulTheme, prompt: &str, default: &Path) -> Result<PathBuf> {
    let answer: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default.display().to_string())
        .interact_text()
        .context("Failed to read directory")?;
    Ok(PathBuf::from(answer.trim()))
}

fn prompt_expression(theme: &ColorfulTheme, default: &str) -> Result<String> {
    let mut input = Input::<String>::with_theme(theme).with_prompt("Condition (e.g. ECC > 0.8)");
    if !default.is_empty() {
        input = input.default(default.to_string());
    }
    input.interact_text().context("Failed to read condition")
}

fn handle_list(config: &Config, args: &cli::ListArgs) -> Result<()> {
    let extension = args.extension.clone().unwrap_or_else(|| config.extension.clone());
    let keywords = if args.keywords.is_empty() {
        config.list_keywords.clone()
    } else {
        args.keywords.clone()
    };

    let files = sweep::collect_candidates(&args.path, &extension, !args.flat)?;
    if files.is_empty() {
        println!("{} No .{} files found", "ℹ️".cyan(), extension.trim_start_matches('.'));
        return Ok(());
    }

    let listing = listing::read_listing(&FitsReader, &files, &keywords);
    listing.print(&args.path);
    Ok(())
}

fn handle_fields(args: &cli::FieldsArgs) -> Result<()> {
    let condition = analyze(&args.expression).map_err(ConfigError::from)?;

    println!("{} Condition is valid: {}", "✅".green(), condition.expr().to_string().bold());
    if condition.fields().is_empty() {
        println!("{} It references no header keywords", "ℹ️".cyan());
    } else {
        println!("{} Header keywords used:", "🔑".cyan());
        for name in condition.fields().iter() {
            println!("  • {}", name.color(colors::PATH));
        }
    }
    Ok(())
}
