//! fitssweep - delete or move FITS files whose headers match a condition

pub mod action;
pub mod binding;
pub mod cli;
pub mod config;
pub mod expr;
pub mod header;
pub mod listing;
pub mod ops;
pub mod sweep;
pub mod value;

// Re-exports for easy access
pub use action::{ActionController, Choice, ConsolePrompter, Escalation, Outcome, Prompter};
pub use binding::{resolve, BindingEnvironment, MissingFields};
pub use cli::{Cli, Commands};
pub use config::{Config, DeleteMode};
pub use expr::{analyze, Condition, EvaluationError, FieldSet, SyntaxError};
pub use header::{FitsReader, HeaderError, HeaderRecord, MetadataProvider};
pub use ops::{DiskOps, DryRunOps, FileOps, OpError};
pub use sweep::{prepare_run, ConfigError, PreparedRun, RunRequest, SweepSummary, Sweeper};
pub use value::Value;

pub mod colors {
    use colored::Color;

    pub const SUCCESS: Color = Color::TrueColor { r: 77, g: 255, b: 157 };
    pub const HEADER: Color = Color::TrueColor { r: 157, g: 77, b: 255 };
    pub const PATH: Color = Color::TrueColor { r: 77, g: 195, b: 255 };
    pub const WARNING: Color = Color::TrueColor { r: 255, g: 217, b: 61 };
}

/// Current version of fitssweep
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension examined when none is configured
pub const DEFAULT_EXTENSION: &str = "fits";
