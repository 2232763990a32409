//! Walks the candidate files and drives each one through read, bind,
//! evaluate and act.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::action::{Action, ActionController, Outcome, Prompter};
use crate::binding::{resolve, BindingEnvironment, MissingFields};
use crate::colors;
use crate::expr::{analyze, Condition, EvaluationError, SyntaxError};
use crate::header::{HeaderError, HeaderRecord, MetadataProvider};
use crate::ops::FileOps;

/// Problems that stop a run before any file is examined.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("expression contains errors: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("cannot read source directory {}: {source}", path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },

    #[error("source {} is not a directory", .0.display())]
    SourceNotDir(PathBuf),

    #[error("destination directory {} does not exist; create it and run again", .0.display())]
    DestinationMissing(PathBuf),

    #[error("destination {} is not a directory", .0.display())]
    DestinationNotDir(PathBuf),
}

/// The destination must already exist; it is never created.
pub fn validate_destination(dest: &Path) -> Result<(), ConfigError> {
    if !dest.exists() {
        return Err(ConfigError::DestinationMissing(dest.to_path_buf()));
    }
    if !dest.is_dir() {
        return Err(ConfigError::DestinationNotDir(dest.to_path_buf()));
    }
    Ok(())
}

/// Files under `source` whose extension matches, in a stable order.
///
/// Only the top level is listed unless `recursive` is set.
pub fn collect_candidates(source: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>, ConfigError> {
    if source.exists() && !source.is_dir() {
        return Err(ConfigError::SourceNotDir(source.to_path_buf()));
    }
    fs::read_dir(source).map_err(|e| ConfigError::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    })?;

    let extension = extension.trim_start_matches('.');
    let max_depth = if recursive { usize::MAX } else { 1 };

    let files = WalkDir::new(source)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extension))
        .collect();

    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Settings for one run, with every prompt already answered.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub expression: String,
    pub extension: String,
    pub recursive: bool,
    pub dry_run: bool,
}

/// A run that passed validation and has not yet read any header.
pub struct PreparedRun<M, O, P> {
    pub files: Vec<PathBuf>,
    pub sweeper: Sweeper<M, O, P>,
}

impl<M, O, P> PreparedRun<M, O, P>
where
    M: MetadataProvider,
    O: FileOps,
    P: Prompter,
{
    pub fn run(&mut self) -> Result<SweepSummary> {
        self.sweeper.run(&self.files)
    }
}

/// List the candidates, check the destination and analyze the condition.
///
/// Any [`ConfigError`] is returned before `provider` is handed a single file.
pub fn prepare_run<M, O, P>(
    request: &RunRequest,
    provider: M,
    ops: O,
    prompter: P,
) -> Result<PreparedRun<M, O, P>, ConfigError>
where
    M: MetadataProvider,
    O: FileOps,
    P: Prompter,
{
    let files = collect_candidates(&request.source_dir, &request.extension, request.recursive)?;
    validate_destination(&request.destination_dir)?;
    let condition = analyze(&request.expression)?;
    tracing::debug!(files = files.len(), condition = %condition, "run prepared");

    let controller = ActionController::new(ops, prompter, request.destination_dir.clone());
    let sweeper = Sweeper::new(provider, condition, controller).dry_run(request.dry_run);
    Ok(PreparedRun { files, sweeper })
}

/// How one file fared against the condition, before any action.
#[derive(Debug)]
pub enum Verdict {
    Unreadable(HeaderError),
    Missing {
        record: HeaderRecord,
        missing: MissingFields,
    },
    Invalid {
        env: BindingEnvironment,
        error: EvaluationError,
    },
    NoMatch(BindingEnvironment),
    Match(BindingEnvironment),
}

/// Read, bind and evaluate one file. Never modifies the file.
pub fn classify<M: MetadataProvider>(provider: &M, condition: &Condition, path: &Path) -> Verdict {
    let record = match provider.open_record(path) {
        Ok(record) => record,
        Err(e) => return Verdict::Unreadable(e),
    };

    let env = match resolve(condition.fields(), &record) {
        Ok(env) => env,
        Err(missing) => return Verdict::Missing { record, missing },
    };

    match condition.matches(&env) {
        Ok(true) => Verdict::Match(env),
        Ok(false) => Verdict::NoMatch(env),
        Err(error) => Verdict::Invalid { env, error },
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub examined: usize,
    pub matched: usize,
    pub not_matched: usize,
    pub deleted: usize,
    pub moved: usize,
    /// Matches the operator chose to leave in place.
    pub skipped: usize,
    pub missing_fields: usize,
    pub unreadable: usize,
    pub eval_errors: usize,
    pub failed: usize,
    pub quit: bool,
}

impl SweepSummary {
    pub fn print(&self, dry_run: bool) {
        let title = if dry_run { "📊 DRY RUN SUMMARY" } else { "📊 SWEEP SUMMARY" };
        println!("{}", title.bold().color(colors::HEADER));
        println!("{} Files examined: {}", "•".cyan(), self.examined);
        println!("{} Condition met: {}", "•".cyan(), self.matched);
        println!("{} Condition not met: {}", "•".cyan(), self.not_matched);
        println!("{} Deleted: {}", "•".cyan(), self.deleted.to_string().color(colors::SUCCESS));
        println!("{} Moved: {}", "•".cyan(), self.moved.to_string().color(colors::SUCCESS));
        println!("{} Skipped: {}", "•".cyan(), self.skipped);

        if self.missing_fields > 0 {
            println!("{} Missing keywords: {}", "•".cyan(), self.missing_fields.to_string().color(colors::WARNING));
        }
        if self.unreadable > 0 {
            println!("{} Unreadable: {}", "•".cyan(), self.unreadable.to_string().color(colors::WARNING));
        }
        if self.eval_errors > 0 {
            println!("{} Evaluation errors: {}", "•".cyan(), self.eval_errors.to_string().color(colors::WARNING));
        }
        if self.failed > 0 {
            println!("{} Failed actions: {}", "•".cyan(), self.failed.to_string().red());
        }
        if self.quit {
            println!("{} Stopped early at operator request", "ℹ️".cyan());
        }
    }
}

/// Runs one condition over a list of files.
pub struct Sweeper<M, O, P> {
    provider: M,
    condition: Condition,
    controller: ActionController<O, P>,
    dry_run: bool,
}

impl<M, O, P> Sweeper<M, O, P>
where
    M: MetadataProvider,
    O: FileOps,
    P: Prompter,
{
    pub fn new(provider: M, condition: Condition, controller: ActionController<O, P>) -> Self {
        Self {
            provider,
            condition,
            controller,
            dry_run: false,
        }
    }

    /// Only changes the wording of the report; pair it with
    /// [`DryRunOps`](crate::ops::DryRunOps).
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn controller(&self) -> &ActionController<O, P> {
        &self.controller
    }

    /// Process `files` in order until the list ends or the operator quits.
    ///
    /// Problems with individual files are reported and counted; only a
    /// failure to prompt the operator aborts the run.
    pub fn run(&mut self, files: &[PathBuf]) -> Result<SweepSummary> {
        let total = files.len();
        let mut summary = SweepSummary::default();

        for (index, path) in files.iter().enumerate() {
            println!(
                "{} {}",
                format!("File ({}/{}):", index + 1, total).bold(),
                display_name(path).color(colors::PATH)
            );
            summary.examined += 1;

            let verdict = classify(&self.provider, &self.condition, path);
            self.report_bindings(&verdict);

            match verdict {
                Verdict::Unreadable(e) => {
                    summary.unreadable += 1;
                    println!("{} Cannot read header: {}", "❌".red(), e);
                    tracing::warn!(path = %path.display(), error = %e, "unreadable header");
                }
                Verdict::Missing { .. } => {
                    summary.missing_fields += 1;
                    println!("{} Moving to next file", "→".dimmed());
                }
                Verdict::Invalid { error, .. } => {
                    summary.eval_errors += 1;
                    println!("{} Cannot evaluate condition: {}", "❌".red(), error);
                }
                Verdict::NoMatch(_) => {
                    summary.not_matched += 1;
                    println!("Condition \"{}\" is {}", self.condition, "not met".dimmed());
                }
                Verdict::Match(_) => {
                    summary.matched += 1;
                    println!("Condition \"{}\" is {}", self.condition, "met".bold().color(colors::WARNING));

                    let outcome = self.controller.handle_match(path)?;
                    if self.record_outcome(path, outcome, &mut summary) {
                        break;
                    }
                }
            }
            println!();
        }

        tracing::info!(?summary, "sweep finished");
        Ok(summary)
    }

    fn report_bindings(&self, verdict: &Verdict) {
        match verdict {
            Verdict::Unreadable(_) => {}
            Verdict::Missing { record, .. } => {
                for name in self.condition.fields().iter() {
                    match record.get(name) {
                        Some(value) => println!("  {} = {}", name.bold(), value),
                        None => println!(
                            "  {} Keyword '{}' does not exist in header",
                            "⚠️".yellow(),
                            name.color(colors::WARNING)
                        ),
                    }
                }
            }
            Verdict::Invalid { env, .. } | Verdict::NoMatch(env) | Verdict::Match(env) => {
                for (name, value) in env.iter() {
                    println!("  {} = {}", name.bold(), value);
                }
            }
        }
    }

    /// Count and report an outcome; `true` when the run should stop.
    fn record_outcome(&self, path: &Path, outcome: Outcome, summary: &mut SweepSummary) -> bool {
        let name = display_name(path);
        match outcome {
            Outcome::Deleted => {
                summary.deleted += 1;
                let verb = if self.dry_run { "Would delete" } else { "Deleted" };
                println!("{} {} {}", "🗑️".red(), verb, name.color(colors::PATH));
            }
            Outcome::Moved(target) => {
                summary.moved += 1;
                let verb = if self.dry_run { "Would move" } else { "Moved" };
                println!(
                    "{} {} {} to {}",
                    "📦".cyan(),
                    verb,
                    name.color(colors::PATH),
                    target.display().to_string().color(colors::PATH)
                );
            }
            Outcome::Skipped => {
                summary.skipped += 1;
                println!("{} Skipped", "→".dimmed());
            }
            Outcome::Failed(action, e) => {
                summary.failed += 1;
                let what = match action {
                    Action::Delete => "delete",
                    Action::Move => "move",
                };
                println!("{} Could not {} {}: {}", "❌".red(), what, name, e);
                tracing::warn!(path = %path.display(), error = %e, "{what} failed");
            }
            Outcome::Quit => {
                summary.quit = true;
                println!("{} Quitting", "👋".cyan());
                return true;
            }
        }
        false
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct InMemory(HashMap<PathBuf, HeaderRecord>);

    impl MetadataProvider for InMemory {
        fn open_record(&self, path: &Path) -> Result<HeaderRecord, HeaderError> {
            self.0
                .get(path)
                .cloned()
                .ok_or(HeaderError::NotFits)
        }
    }

    fn provider() -> InMemory {
        let mut records = HashMap::new();
        records.insert(PathBuf::from("hit"), HeaderRecord::new().with("ecc", 0.9));
        records.insert(PathBuf::from("miss"), HeaderRecord::new().with("ecc", 0.1));
        records.insert(PathBuf::from("bare"), HeaderRecord::new().with("gain", 100_i64));
        records.insert(PathBuf::from("text"), HeaderRecord::new().with("ecc", "high"));
        InMemory(records)
    }

    #[test]
    fn classify_each_case() {
        let provider = provider();
        let condition = analyze("ecc > 0.8").unwrap();

        assert!(matches!(classify(&provider, &condition, Path::new("hit")), Verdict::Match(_)));
        assert!(matches!(classify(&provider, &condition, Path::new("miss")), Verdict::NoMatch(_)));
        assert!(matches!(
            classify(&provider, &condition, Path::new("bare")),
            Verdict::Missing { .. }
        ));
        assert!(matches!(
            classify(&provider, &condition, Path::new("text")),
            Verdict::Invalid { .. }
        ));
        assert!(matches!(
            classify(&provider, &condition, Path::new("gone")),
            Verdict::Unreadable(_)
        ));
    }

    #[test]
    fn classify_is_repeatable() {
        let provider = provider();
        let condition = analyze("ecc > 0.8").unwrap();
        for _ in 0..3 {
            match classify(&provider, &condition, Path::new("hit")) {
                Verdict::Match(env) => assert_eq!(env.get("ecc"), Some(&Value::Float(0.9))),
                other => panic!("expected Match, got {other:?}"),
            }
        }
    }

    #[test]
    fn collects_matching_extension_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.fits"), b"").unwrap();
        fs::write(tmp.path().join("a.FITS"), b"").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join("c.fits"), b"").unwrap();

        let flat = collect_candidates(tmp.path(), "fits", false).unwrap();
        let names: Vec<_> = flat.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, ["a.FITS", "b.fits"]);

        let deep = collect_candidates(tmp.path(), ".fits", true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn missing_source_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = collect_candidates(&tmp.path().join("nope"), "fits", false).unwrap_err();
        assert!(matches!(err, ConfigError::SourceUnreadable { .. }));
    }

    #[test]
    fn destination_checks() {
        let tmp = TempDir::new().unwrap();
        assert!(validate_destination(tmp.path()).is_ok());

        let missing = tmp.path().join("missing");
        assert!(matches!(
            validate_destination(&missing),
            Err(ConfigError::DestinationMissing(_))
        ));

        let file = tmp.path().join("file");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            validate_destination(&file),
            Err(ConfigError::DestinationNotDir(_))
        ));
    }

    #[test]
    fn syntax_error_converts() {
        let err: ConfigError = analyze("").unwrap_err().into();
        assert!(err.to_string().starts_with("expression contains errors"));
    }
}
