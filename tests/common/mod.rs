#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use fits_sweep::{Choice, Prompter};

const BLOCK: usize = 2880;

/// Minimal FITS primary header followed by one block of fake data.
pub fn fits_bytes(cards: &[(&str, &str)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    push_card(&mut bytes, "SIMPLE  =                    T");
    push_card(&mut bytes, "BITPIX  =                   16");
    push_card(&mut bytes, "NAXIS   =                    0");
    for (key, value) in cards {
        push_card(&mut bytes, &format!("{key:<8}= {value:>20}"));
    }
    push_card(&mut bytes, "END");
    bytes.resize(bytes.len().div_ceil(BLOCK) * BLOCK, b' ');
    bytes.extend(std::iter::repeat(0u8).take(BLOCK));
    bytes
}

fn push_card(bytes: &mut Vec<u8>, text: &str) {
    bytes.extend(format!("{text:<80}").into_bytes());
}

pub fn write_fits(dir: &Path, name: &str, cards: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, fits_bytes(cards)).unwrap();
    path
}

/// Source and destination directories inside one temp dir.
pub struct Workspace {
    _tmp: tempfile::TempDir,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("lights");
        let destination = tmp.path().join("rejects");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();
        Self {
            _tmp: tmp,
            source,
            destination,
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        names_in(&self.source)
    }

    pub fn destination_names(&self) -> Vec<String> {
        names_in(&self.destination)
    }
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Answers prompts from a fixed script and records which files were asked about.
pub struct Scripted {
    answers: VecDeque<Choice>,
    pub asked: Vec<PathBuf>,
}

impl Scripted {
    pub fn new(answers: &[Choice]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for Scripted {
    fn choose(&mut self, file: &Path) -> anyhow::Result<Choice> {
        self.asked.push(file.to_path_buf());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected prompt for {}", file.display()))
    }
}
