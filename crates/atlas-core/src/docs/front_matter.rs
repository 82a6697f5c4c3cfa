//! Metadata block at the top of a module document.
//!
//! Two forms are accepted:
//!
//! ```text
//! ---                       title: Users
//! title: Users              include: [PageInfo]
//! include: [PageInfo]       ---
//! ---                       # Users
//! # Users
//! ```
//!
//! The bare form on the right is only recognized when every line before the
//! dash line looks like YAML (`key: value`, list items or indented
//! continuations). Without a closing dash line there is no front matter.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Front matter must be a mapping of keys to values")]
    NotAMapping,

    #[error("Key '{key}': {message}")]
    InvalidKey { key: String, message: String },
}

/// Recognized keys plus everything else as JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Display name declared by the document.
    pub title: Option<String>,
    /// Items added to the module regardless of matchers.
    pub include: Vec<String>,
    /// Module ordering; lower comes first.
    pub rank: Option<i64>,
    /// All keys, including the recognized ones.
    pub metadata: BTreeMap<String, Value>,
}

impl FrontMatter {
    fn from_yaml(text: &str) -> Result<Self, FrontMatterError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
        let mapping = match yaml {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => return Err(FrontMatterError::NotAMapping),
        };

        let mut metadata = BTreeMap::new();
        for (key, value) in mapping {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                other => serde_yaml::to_string(&other)?.trim().to_string(),
            };
            let value = serde_json::to_value(&value).map_err(|e| FrontMatterError::InvalidKey {
                key: key.clone(),
                message: e.to_string(),
            })?;
            metadata.insert(key, value);
        }

        let title = match metadata.get("title") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(other) => Some(other.to_string()),
        };

        let include = match metadata.get("include") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.trim().to_string()),
                    other => Err(FrontMatterError::InvalidKey {
                        key: "include".to_string(),
                        message: format!("expected an item name, found {}", other),
                    }),
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(FrontMatterError::InvalidKey {
                    key: "include".to_string(),
                    message: format!("expected a list of item names, found {}", other),
                })
            }
        };

        let rank = match metadata.get("rank") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(other) => {
                return Err(FrontMatterError::InvalidKey {
                    key: "rank".to_string(),
                    message: format!("expected a number, found {}", other),
                })
            }
        };

        Ok(Self {
            title,
            include,
            rank,
            metadata,
        })
    }
}

fn is_dash_line(line: &str) -> bool {
    let line = line.trim_end();
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

fn is_yaml_line(line: &str) -> bool {
    if line.starts_with(' ') || line.starts_with('\t') || line.starts_with("- ") {
        return true;
    }
    match line.split_once(':') {
        Some((key, rest)) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
                && (rest.is_empty() || rest.starts_with(' '))
        }
        None => false,
    }
}

/// Split a document into front matter and body.
pub fn split_front_matter(source: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    // Byte offsets of each line start.
    let mut lines = Vec::new();
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        lines.push((offset, line.trim_end_matches(['\n', '\r'])));
        offset += line.len();
    }

    let Some(&(_, first)) = lines.first() else {
        return Ok((FrontMatter::default(), source));
    };

    let (yaml_lines, closing) = if is_dash_line(first) {
        match lines.iter().skip(1).position(|(_, l)| is_dash_line(l)) {
            Some(pos) => (&lines[1..pos + 1], pos + 1),
            None => return Ok((FrontMatter::default(), source)),
        }
    } else {
        match lines.iter().position(|(_, l)| is_dash_line(l)) {
            Some(pos)
                if is_yaml_line(first)
                    && !first.starts_with(' ')
                    && lines[..pos]
                        .iter()
                        .all(|(_, l)| l.trim().is_empty() || is_yaml_line(l)) =>
            {
                (&lines[..pos], pos)
            }
            _ => return Ok((FrontMatter::default(), source)),
        }
    };

    let yaml = yaml_lines
        .iter()
        .map(|(_, l)| *l)
        .collect::<Vec<_>>()
        .join("\n");
    let front_matter = FrontMatter::from_yaml(&yaml)?;

    let body = match lines.get(closing + 1) {
        Some((start, _)) => &source[*start..],
        None => "",
    };

    Ok((front_matter, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_front_matter() {
        let doc = "---\ntitle: Users\ninclude:\n  - PageInfo\n  - Node\nrank: 2\ncolor: blue\n---\n# Users\n\nBody.\n";
        let (fm, body) = split_front_matter(doc).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Users"));
        assert_eq!(fm.include, vec!["PageInfo", "Node"]);
        assert_eq!(fm.rank, Some(2));
        assert_eq!(fm.metadata["color"], Value::String("blue".to_string()));
        assert_eq!(body, "# Users\n\nBody.\n");
    }

    #[test]
    fn test_bare_front_matter() {
        let doc = "title: Billing\ninclude: [Money]\n---\n# Billing\n";
        let (fm, body) = split_front_matter(doc).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Billing"));
        assert_eq!(fm.include, vec!["Money"]);
        assert_eq!(body, "# Billing\n");
    }

    #[test]
    fn test_no_delimiter_means_no_metadata() {
        let doc = "# Users\n\nAll about users.\n";
        let (fm, body) = split_front_matter(doc).unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, doc);

        let unclosed = "---\ntitle: Users\n# Users\n";
        let (fm, body) = split_front_matter(unclosed).unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(body, unclosed);
    }

    #[test]
    fn test_setext_heading_is_not_front_matter() {
        let doc = "Users overview\n---\n\nText.\n";
        let (fm, body) = split_front_matter(doc).unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(body, doc);
    }

    #[test]
    fn test_invalid_include_is_an_error() {
        let doc = "---\ninclude: 3\n---\nBody\n";
        let err = split_front_matter(doc).unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidKey { ref key, .. } if key == "include"));
    }
}
