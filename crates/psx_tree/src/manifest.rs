//! Per-game file listings that drive tree construction.
//!
//! ```text
//! FileList,v,1,0
//! FILES
//! CD,Folder,Container,
//! CD/FDAT.T,T,Container,Field data
//! CD/FDAT.T/28,MIX,Container,Item models
//! ```
//!
//! Records are `path,fileFormat,payloadKind,displayName`. The display name is
//! the rest of the line and may be empty. Blank lines and lines starting with
//! `#` are ignored.

use std::path::Path;

use tracing::{debug, info, instrument, warn};
use winnow::ascii::dec_uint;
use winnow::combinator::{opt, preceded, rest, separated_pair, seq};
use winnow::token::take_till;
use winnow::PResult;
use winnow::Parser;

use crate::error::{Error, Result};
use crate::tree::FileTree;
use crate::types::{DataType, FileFormat};

/// Only this major version is understood
pub const SUPPORTED_MAJOR: u32 = 1;

const SECTION_FILES: &str = "FILES";

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRecord {
    /// 1-based line in the manifest
    pub line: usize,
    pub path: String,
    pub format: FileFormat,
    pub payload: DataType,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub major: u32,
    pub minor: u32,
    pub records: Vec<ManifestRecord>,
}

/// What [`Manifest::apply`] did
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: usize,
    pub patched: usize,
    pub skipped: usize,
}

struct RawRecord<'s> {
    path: &'s str,
    format: &'s str,
    payload: &'s str,
    display_name: Option<&'s str>,
}

fn version_line(input: &mut &str) -> PResult<(u32, u32)> {
    preceded(("FileList", ',', 'v', ','), separated_pair(dec_uint, ',', dec_uint))
        .parse_next(input)
}

fn record<'s>(input: &mut &'s str) -> PResult<RawRecord<'s>> {
    seq!(RawRecord {
        path: take_till(1.., ','),
        _: ',',
        format: take_till(1.., ','),
        _: ',',
        payload: take_till(1.., ','),
        display_name: opt(preceded(',', rest)),
    })
    .parse_next(input)
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Manifest> {
        let mut lines = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .enumerate()
            .map(|(index, line)| (index + 1, line));

        let (major, minor) = match lines.next() {
            Some((line, text)) => version_line.parse(text).map_err(|e| {
                Error::InvalidManifestLine {
                    line,
                    message: e.to_string(),
                }
            })?,
            None => {
                return Err(Error::InvalidManifestLine {
                    line: 1,
                    message: "empty manifest".into(),
                })
            }
        };
        if major != SUPPORTED_MAJOR {
            return Err(Error::UnsupportedManifestVersion { major, minor });
        }

        match lines.next() {
            Some((_, text)) if text.trim() == SECTION_FILES => {}
            Some((line, text)) => {
                return Err(Error::InvalidManifestLine {
                    line,
                    message: format!("expected {SECTION_FILES}, found {text:?}"),
                })
            }
            None => {
                return Err(Error::InvalidManifestLine {
                    line: 2,
                    message: format!("missing {SECTION_FILES} section"),
                })
            }
        }

        let records = lines
            .filter(|(_, text)| !text.trim().is_empty() && !text.starts_with('#'))
            .map(|(line, text)| parse_record(line, text))
            .collect::<Result<Vec<_>>>()?;

        Ok(Manifest {
            major,
            minor,
            records,
        })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Manifest> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| Error::MissingManifest(path.to_path_buf()))?;
        Self::parse(&text)
    }

    /// Apply every record to `tree`, reading new files from `source`.
    ///
    /// A record whose path is already in the tree only updates that node. A
    /// listed file that is missing from `source` is skipped with a warning.
    #[instrument(skip(self, tree), err, fields(records = self.records.len()))]
    pub fn apply(&self, tree: &mut FileTree, source: &Path) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        for record in &self.records {
            if let Some(id) = tree.resolve(&record.path) {
                debug!(path = %record.path, "patching");
                tree.set_format(id, record.format)?;
                tree.set_payload(id, record.payload)?;
                tree.set_display_name(id, Some(record.display_name.clone()))?;
                report.patched += 1;
                continue;
            }

            let (parent_path, name) = record
                .path
                .rsplit_once('/')
                .unwrap_or(("", record.path.as_str()));
            let parent = tree
                .resolve(parent_path)
                .ok_or_else(|| Error::MissingParent(record.path.clone()))?;

            let data = match record.format {
                FileFormat::Folder => Vec::new(),
                _ => match std::fs::read(source.join(&record.path)) {
                    Ok(data) => data,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        warn!(path = %record.path, "listed file is missing, skipping");
                        report.skipped += 1;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                },
            };

            let id = tree.add_node(parent, name, record.format, record.payload, data)?;
            tree.set_display_name(id, Some(record.display_name.clone()))?;
            report.created += 1;
        }

        info!(
            created = report.created,
            patched = report.patched,
            skipped = report.skipped,
            "applied manifest"
        );
        Ok(report)
    }
}

fn parse_record(line: usize, text: &str) -> Result<ManifestRecord> {
    let invalid = |message: String| Error::InvalidManifestLine { line, message };

    let raw = record.parse(text).map_err(|e| invalid(e.to_string()))?;
    let format = raw
        .format
        .trim()
        .parse::<FileFormat>()
        .map_err(|e| invalid(e.to_string()))?;
    let payload = raw
        .payload
        .trim()
        .parse::<DataType>()
        .map_err(|e| invalid(e.to_string()))?;

    Ok(ManifestRecord {
        line,
        path: raw.path.trim().trim_matches('/').to_string(),
        format,
        payload,
        display_name: raw.display_name.unwrap_or_default().trim().to_string(),
    })
}
