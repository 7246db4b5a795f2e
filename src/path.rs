// Dotted path templates resolved against nested snapshot data.
//
// A template is a sequence of dot-separated segments; at most one segment may
// be the `{install_index}` placeholder. Walking a mapping looks up the key,
// walking a sequence requires a numeric segment (0-based index). Anything
// missing or of the wrong shape resolves to `None`, never to an error.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::InstallIndex;

pub const INSTALL_INDEX_PLACEHOLDER: &str = "{install_index}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("path template is empty")]
    Empty,
    #[error("path template {template:?} has an empty segment at position {position}")]
    EmptySegment { template: String, position: usize },
    #[error("path template {template:?} has more than one {{install_index}} placeholder")]
    MultiplePlaceholders { template: String },
    #[error("path template {template:?} is not indexed but contains {{install_index}}")]
    UnexpectedPlaceholder { template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    InstallIndex,
}

/// Parsed, validated path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if template.is_empty() {
            return Err(TemplateError::Empty);
        }
        let mut segments = Vec::new();
        let mut placeholders = 0;
        for (position, part) in template.split('.').enumerate() {
            if part.is_empty() {
                return Err(TemplateError::EmptySegment {
                    template: template.to_string(),
                    position,
                });
            }
            if part == INSTALL_INDEX_PLACEHOLDER {
                placeholders += 1;
                if placeholders > 1 {
                    return Err(TemplateError::MultiplePlaceholders {
                        template: template.to_string(),
                    });
                }
                segments.push(Segment::InstallIndex);
            } else {
                segments.push(Segment::Key(part.to_string()));
            }
        }
        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// Parse a template that must not depend on an install index (totals, summary).
    pub fn parse_fixed(template: &str) -> Result<Self, TemplateError> {
        let parsed = Self::parse(template)?;
        if parsed.has_placeholder() {
            return Err(TemplateError::UnexpectedPlaceholder {
                template: template.to_string(),
            });
        }
        Ok(parsed)
    }

    pub fn has_placeholder(&self) -> bool {
        self.segments.contains(&Segment::InstallIndex)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Concrete dotted path for `index`. `None` when the template needs an
    /// installation but `index` is `Aggregate`.
    pub fn render(&self, index: InstallIndex) -> Option<String> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match (segment, index) {
                (Segment::Key(key), _) => parts.push(key.clone()),
                (Segment::InstallIndex, InstallIndex::At(n)) => parts.push(n.to_string()),
                (Segment::InstallIndex, InstallIndex::Aggregate) => return None,
            }
        }
        Some(parts.join("."))
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Resolve `template` against `snapshot` for `index`.
pub fn resolve<'a>(
    snapshot: &'a Value,
    template: &PathTemplate,
    index: InstallIndex,
) -> Option<&'a Value> {
    let mut node = snapshot;
    for segment in &template.segments {
        node = match segment {
            Segment::Key(key) => step(node, key)?,
            Segment::InstallIndex => match index {
                InstallIndex::At(n) => step_index(node, n)?,
                InstallIndex::Aggregate => return None,
            },
        };
    }
    Some(node)
}

/// Resolve a concrete dotted path (no placeholder substitution).
pub fn lookup<'a>(snapshot: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = snapshot;
    for part in path.split('.') {
        if part.is_empty() {
            return None;
        }
        node = step(node, part)?;
    }
    Some(node)
}

fn step<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_index(node: &Value, index: usize) -> Option<&Value> {
    match node {
        Value::Array(items) => items.get(index),
        Value::Object(map) => map.get(&index.to_string()),
        _ => None,
    }
}
