//! Placeholder templates used by module rules.
//!
//! A template is parsed once into literal, token and environment segments.
//! Tokens are written `%module%`, `%name%`, `%path%`; `%$VAR%` reads the
//! environment at render time. Custom tokens from `[placeholders]` are folded
//! into literals at parse time, so every template that parses also renders.

use std::collections::BTreeMap;
use thiserror::Error;

/// Built-in placeholder tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Module,
    Name,
    Path,
}

impl Placeholder {
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Module => "module",
            Placeholder::Name => "name",
            Placeholder::Path => "path",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "module" => Some(Placeholder::Module),
            "name" => Some(Placeholder::Name),
            "path" => Some(Placeholder::Path),
            _ => None,
        }
    }
}

/// Errors raised while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unknown placeholder %{token}% in \"{template}\"")]
    UnknownPlaceholder { token: String, template: String },

    #[error("Placeholder %{token}% cannot be used in \"{template}\"")]
    NotAllowed { token: String, template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Placeholder),
    Env(String),
}

/// Values substituted for built-in tokens. Unset values render as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    pub module: Option<&'a str>,
    pub name: Option<&'a str>,
    pub path: Option<&'a str>,
}

impl<'a> TemplateContext<'a> {
    pub fn module(module: &'a str) -> Self {
        Self {
            module: Some(module),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_path(mut self, path: Option<&'a str>) -> Self {
        self.path = path;
        self
    }

    fn get(&self, placeholder: Placeholder) -> &'a str {
        match placeholder {
            Placeholder::Module => self.module,
            Placeholder::Name => self.name,
            Placeholder::Path => self.path,
        }
        .unwrap_or("")
    }
}

/// A parsed placeholder template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`, accepting only the `allowed` built-in tokens plus any
    /// custom placeholder.
    pub fn parse(
        source: &str,
        allowed: &[Placeholder],
        custom: &BTreeMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(start) = rest.find('%') {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            let token = after
                .find('%')
                .map(|end| &after[..end])
                .filter(|candidate| is_token(candidate));

            let Some(token) = token else {
                literal.push('%');
                rest = after;
                continue;
            };

            let segment = if let Some(var) = token.strip_prefix('$') {
                Segment::Env(var.to_string())
            } else if let Some(placeholder) = Placeholder::from_token(token) {
                if !allowed.contains(&placeholder) {
                    return Err(TemplateError::NotAllowed {
                        token: token.to_string(),
                        template: source.to_string(),
                    });
                }
                Segment::Token(placeholder)
            } else if let Some(value) = custom.get(token) {
                Segment::Literal(value.clone())
            } else {
                return Err(TemplateError::UnknownPlaceholder {
                    token: token.to_string(),
                    template: source.to_string(),
                });
            };

            match segment {
                Segment::Literal(value) => literal.push_str(&value),
                other => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(other);
                }
            }

            rest = &after[token.len() + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The unparsed template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template refers to the given token.
    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Token(p) if *p == placeholder))
    }

    /// Substitute all tokens.
    pub fn render(&self, context: &TemplateContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(placeholder) => out.push_str(context.get(*placeholder)),
                Segment::Env(var) => {
                    if let Ok(value) = std::env::var(var) {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }
}

fn is_token(candidate: &str) -> bool {
    let ident = candidate.strip_prefix('$').unwrap_or(candidate);
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
