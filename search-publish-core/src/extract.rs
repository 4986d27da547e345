//! Turns a page's raw contents into a [`DocumentRecord`].
//!
//! Contents use the Lektor field format:
//!
//! ```text
//! title: Hello
//! ---
//! body:
//!
//! Multi-line text, may contain: colons.
//! ```
//!
//! A line of exactly three dashes separates sections. `key: value`
//! starts a field; a key with no inline value opens a block that runs to the
//! next separator; inside a block, a line of four or more dashes is an
//! escaped separator and loses one dash. Parsing never fails: unreadable lines become
//! [`MalformedContentWarning`]s and are skipped.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::content::ContentNode;
use crate::contract::Pad;
use crate::error::MalformedContentWarning;

pub const GID_FIELD: &str = "_gid";
pub const PATH_FIELD: &str = "_path";
pub const MODEL_FIELD: &str = "_model";

/// Prefix marking system fields.
pub const RESERVED_PREFIX: char = '_';

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^---\s*$").expect("static regex"))
}

fn escaped_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-{4,}\s*$").expect("static regex"))
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9_-]*)\s*:(.*)$").expect("static regex"))
}

/// Field name to value mapping for one page, serialised as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DocumentRecord(BTreeMap<String, String>);

impl DocumentRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Document id on the cluster.
    pub fn gid(&self) -> &str {
        self.get(GID_FIELD).unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.get(PATH_FIELD).unwrap_or_default()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Fields read from a contents text, in order of appearance, underscore keys included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    pub fields: Vec<(String, String)>,
    pub warnings: Vec<MalformedContentWarning>,
}

struct OpenField {
    key: String,
    line: usize,
    block: Option<Vec<String>>,
    value: String,
}

impl OpenField {
    fn finish(self, parsed: &mut ParsedFields) {
        if self.key.is_empty() {
            parsed.warnings.push(MalformedContentWarning {
                line: self.line,
                text: "field without a name".to_string(),
            });
            return;
        }
        let value = match self.block {
            Some(lines) => lines.join("\n").trim().to_string(),
            None => self.value,
        };
        parsed.fields.push((self.key, value));
    }
}

/// Splits `contents` into fields. Never fails.
pub fn parse_fields(contents: &str) -> ParsedFields {
    let mut parsed = ParsedFields::default();
    let mut open: Option<OpenField> = None;

    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');

        if separator_re().is_match(line) {
            if let Some(field) = open.take() {
                field.finish(&mut parsed);
            }
            continue;
        }

        if let Some(OpenField {
            block: Some(lines), ..
        }) = open.as_mut()
        {
            if escaped_separator_re().is_match(line) {
                lines.push(line[1..].to_string());
            } else {
                lines.push(line.to_string());
            }
            continue;
        }

        match field_re().captures(line) {
            Some(caps) => {
                if let Some(field) = open.take() {
                    field.finish(&mut parsed);
                }
                let key = caps[1].to_string();
                let value = caps[2].trim().to_string();
                open = Some(OpenField {
                    key,
                    line: idx + 1,
                    block: value.is_empty().then(Vec::new),
                    value,
                });
            }
            None if line.trim().is_empty() => {}
            None => parsed.warnings.push(MalformedContentWarning {
                line: idx + 1,
                text: line.to_string(),
            }),
        }
    }

    if let Some(field) = open.take() {
        field.finish(&mut parsed);
    }
    parsed
}

/// A record plus the lines that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub record: DocumentRecord,
    pub warnings: Vec<MalformedContentWarning>,
}

/// Builds the document for `node` from its contents.
///
/// System fields (leading `_`) are dropped; `_gid` and `_path` are then
/// copied from the node.
pub fn extract_with_warnings<P>(pad: &P, node: &ContentNode) -> Extraction
where
    P: Pad + ?Sized,
{
    let parsed = parse_fields(&pad.contents_of(node));

    let mut fields: BTreeMap<String, String> = parsed
        .fields
        .into_iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .collect();
    fields.insert(GID_FIELD.to_string(), node.gid.clone());
    fields.insert(PATH_FIELD.to_string(), node.path.clone());

    for warning in &parsed.warnings {
        warn!(gid = %node.gid, path = %node.path, %warning, "Skipped malformed content");
    }
    debug!(gid = %node.gid, fields = fields.len(), "Extracted document");

    Extraction {
        record: DocumentRecord(fields),
        warnings: parsed.warnings,
    }
}

/// Builds the document for `node`, discarding parse warnings.
pub fn extract<P>(pad: &P, node: &ContentNode) -> DocumentRecord
where
    P: Pad + ?Sized,
{
    extract_with_warnings(pad, node).record
}
