//! Header records and the FITS primary-header reader.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::value::Value;

/// FITS files are organised in blocks of this many bytes.
pub const BLOCK_SIZE: usize = 2880;
/// Each header card is one fixed-width line.
pub const CARD_SIZE: usize = 80;
/// Upper bound on header blocks scanned before giving up on finding `END`.
const MAX_HEADER_BLOCKS: usize = 256;
/// Keywords whose cards never carry a value.
const COMMENTARY: &[&str] = &["COMMENT", "HISTORY"];

/// Keyword/value pairs read from one file's header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRecord {
    entries: BTreeMap<String, Value>,
}

impl HeaderRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Case-sensitive lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why a file's header could not be read.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("cannot read file: {0}")]
    Io(#[from] io::Error),

    #[error("not a FITS file (no SIMPLE card)")]
    NotFits,

    #[error("header is truncated (no END card)")]
    Truncated,
}

/// Source of header records, one per file.
pub trait MetadataProvider {
    /// Read the header record of the file at `path`.
    fn open_record(&self, path: &Path) -> Result<HeaderRecord, HeaderError>;
}

/// Reads the primary header of FITS files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitsReader;

impl MetadataProvider for FitsReader {
    fn open_record(&self, path: &Path) -> Result<HeaderRecord, HeaderError> {
        let file = File::open(path)?;
        read_header(BufReader::new(file))
    }
}

/// Parse a FITS primary header from `reader`, stopping at the `END` card.
///
/// Only the header blocks are read; the data unit is never touched.
/// Commentary cards are skipped and the first occurrence of a repeated
/// keyword wins.
pub fn read_header<R: Read>(mut reader: R) -> Result<HeaderRecord, HeaderError> {
    let mut entries = BTreeMap::new();
    let mut block = vec![0u8; BLOCK_SIZE];

    for index in 0..MAX_HEADER_BLOCKS {
        let filled = fill_block(&mut reader, &mut block)?;
        if index == 0 && !block[..filled].starts_with(b"SIMPLE") {
            return Err(HeaderError::NotFits);
        }

        for card in block[..filled].chunks_exact(CARD_SIZE) {
            match parse_card(card) {
                Card::End => return Ok(HeaderRecord { entries }),
                Card::Value(key, value) => {
                    entries.entry(key).or_insert(value);
                }
                Card::Other => {}
            }
        }

        if filled < BLOCK_SIZE {
            break;
        }
    }

    Err(HeaderError::Truncated)
}

/// Read until `buf` is full or the input ends; returns the bytes read.
fn fill_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[derive(Debug, PartialEq)]
enum Card {
    End,
    Value(String, Value),
    Other,
}

fn parse_card(card: &[u8]) -> Card {
    let text = String::from_utf8_lossy(card);
    let keyword = text.get(..8).unwrap_or(&*text).trim_end();

    if keyword == "END" {
        return Card::End;
    }
    if keyword.is_empty()
        || COMMENTARY.contains(&keyword)
        || text.get(8..10) != Some("= ")
    {
        return Card::Other;
    }

    match parse_value(&text[10..]) {
        Some(value) => Card::Value(keyword.to_owned(), value),
        None => Card::Other,
    }
}

/// Parse the value field of a card; `None` for an undefined value.
fn parse_value(field: &str) -> Option<Value> {
    let field = field.trim_start();

    if let Some(rest) = field.strip_prefix('\'') {
        return Some(Value::String(parse_quoted(rest)));
    }

    let raw = field.split('/').next().unwrap_or("").trim();
    match raw {
        "" => None,
        "T" => Some(Value::Bool(true)),
        "F" => Some(Value::Bool(false)),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                return Some(Value::Int(i));
            }
            match raw.replace(|c: char| c == 'D' || c == 'd', "E").parse::<f64>() {
                Ok(f) => Some(Value::Float(f)),
                Err(_) => Some(Value::String(raw.to_owned())),
            }
        }
    }
}

/// String values end at a lone quote; `''` is an escaped quote. Trailing
/// blanks are not significant.
fn parse_quoted(rest: &str) -> String {
    let mut out = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
            } else {
                break;
            }
        } else {
            out.push(c);
        }
    }
    out.truncate(out.trim_end().len());
    out
}
