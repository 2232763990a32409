//! Header survey: selected keywords for every file under a directory.

use std::path::{Path, PathBuf};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::colors;
use crate::header::MetadataProvider;
use crate::value::Value;

/// Selected keyword values for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub path: PathBuf,
    /// Requested keywords present in the header, in request order.
    pub values: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub entries: Vec<ListEntry>,
    pub unreadable: Vec<PathBuf>,
}

/// Read `keywords` from each file. Keywords a header lacks are left out of
/// its entry; files whose header cannot be read are collected separately.
pub fn read_listing<M: MetadataProvider>(provider: &M, files: &[PathBuf], keywords: &[String]) -> Listing {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut listing = Listing::default();
    for path in files {
        pb.set_message(short_name(path));
        match provider.open_record(path) {
            Ok(record) => {
                let values = keywords
                    .iter()
                    .filter_map(|k| record.get(k).map(|v| (k.clone(), v.clone())))
                    .collect();
                listing.entries.push(ListEntry {
                    path: path.clone(),
                    values,
                });
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
                listing.unreadable.push(path.clone());
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    listing
}

impl Listing {
    pub fn print(&self, root: &Path) {
        println!(
            "{} {} files under {}",
            "🔭".cyan(),
            self.entries.len().to_string().bold(),
            root.display().to_string().color(colors::PATH)
        );
        println!();

        for (index, entry) in self.entries.iter().enumerate() {
            let shown = entry.path.strip_prefix(root).unwrap_or(&entry.path);
            let values: Vec<String> = entry
                .values
                .iter()
                .map(|(k, v)| format!("{}={}", k.bold(), v))
                .collect();
            println!(
                "{:>4}. {}  {}",
                index + 1,
                shown.display().to_string().color(colors::PATH),
                values.join("  ")
            );
        }

        if !self.unreadable.is_empty() {
            println!();
            println!(
                "{} {} files could not be read:",
                "⚠️".yellow(),
                self.unreadable.len()
            );
            for path in &self.unreadable {
                println!("  - {}", path.display().to_string().dimmed());
            }
        }
    }
}

fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HeaderError, HeaderRecord};

    struct Fixed;

    impl MetadataProvider for Fixed {
        fn open_record(&self, path: &Path) -> Result<HeaderRecord, HeaderError> {
            if path.ends_with("broken.fits") {
                return Err(HeaderError::NotFits);
            }
            Ok(HeaderRecord::new()
                .with("OBJECT", "M 31")
                .with("EXPTIME", 300.0))
        }
    }

    #[test]
    fn lists_requested_keywords_in_order() {
        let files = vec![PathBuf::from("a.fits"), PathBuf::from("broken.fits")];
        let keywords = vec!["EXPTIME".to_string(), "FILTER".to_string(), "OBJECT".to_string()];

        let listing = read_listing(&Fixed, &files, &keywords);

        assert_eq!(listing.entries.len(), 1);
        let names: Vec<&str> = listing.entries[0].values.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["EXPTIME", "OBJECT"]);
        assert_eq!(listing.unreadable, [PathBuf::from("broken.fits")]);
    }
}
