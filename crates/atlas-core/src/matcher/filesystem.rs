use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::files::render_rule_text;
use super::{
    Capture, CaptureIndex, CompiledGlob, MatchResult, Matcher, MatcherError, MatcherKind,
    Provenance, SourceFiles,
};
use crate::config::{Config, KIND_CAPTURE, NAME_CAPTURE};
use crate::diagnostics::Diagnostics;
use crate::item::Item;

#[derive(Debug)]
struct CompiledRule {
    index: usize,
    glob: CompiledGlob,
    regex: Regex,
}

impl CompiledRule {
    fn describe(&self) -> String {
        format!("filesystem[{}] {}", self.index, self.glob.pattern())
    }
}

/// Regex over each line of the files a glob selects.
///
/// The regex must declare a `name` group; a line only counts for an item when
/// the captured text equals the item name exactly. Rules are tried in
/// declaration order and the first one that names the item wins.
pub struct FilesystemMatcher {
    rules: HashMap<String, Vec<CompiledRule>>,
    files: Arc<SourceFiles>,
    indexes: DashMap<(String, usize), Arc<OnceCell<Arc<CaptureIndex>>>>,
    diagnostics: Arc<Diagnostics>,
}

impl FilesystemMatcher {
    /// Compile every filesystem rule. Fails on the first malformed glob or
    /// regex, or a regex without a `name` group.
    pub fn from_config(
        config: &Config,
        files: Arc<SourceFiles>,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<Self, MatcherError> {
        let mut rules = HashMap::new();

        for module in &config.modules {
            let mut compiled = Vec::with_capacity(module.filesystem.len());

            for (index, rule) in module.filesystem.iter().enumerate() {
                let glob_text = render_rule_text(
                    config,
                    module,
                    MatcherKind::Filesystem,
                    index,
                    "files",
                    &rule.files,
                    false,
                )?;
                let pattern = render_rule_text(
                    config,
                    module,
                    MatcherKind::Filesystem,
                    index,
                    "pattern",
                    &rule.pattern,
                    true,
                )?;

                let glob = CompiledGlob::new(&glob_text).map_err(|source| {
                    MatcherError::InvalidGlob {
                        module: module.name.clone(),
                        matcher: MatcherKind::Filesystem,
                        rule: index,
                        glob: glob_text.clone(),
                        source,
                    }
                })?;

                let regex = Regex::new(&pattern).map_err(|source| MatcherError::InvalidPattern {
                    module: module.name.clone(),
                    rule: index,
                    pattern: pattern.clone(),
                    source,
                })?;

                if !regex.capture_names().flatten().any(|n| n == NAME_CAPTURE) {
                    return Err(MatcherError::MissingNameGroup {
                        module: module.name.clone(),
                        rule: index,
                        pattern,
                    });
                }

                compiled.push(CompiledRule { index, glob, regex });
            }

            if !compiled.is_empty() {
                rules.insert(module.name.clone(), compiled);
            }
        }

        Ok(Self {
            rules,
            files,
            indexes: DashMap::new(),
            diagnostics,
        })
    }

    /// The capture index of one rule, built once even when many items ask
    /// for it at the same time.
    async fn index_for(&self, module: &str, rule: &CompiledRule) -> Arc<CaptureIndex> {
        let cell = Arc::clone(
            self.indexes
                .entry((module.to_string(), rule.index))
                .or_default()
                .value(),
        );
        let index = cell.get_or_init(|| self.build_index(module, rule)).await;
        Arc::clone(index)
    }

    async fn build_index(&self, module: &str, rule: &CompiledRule) -> Arc<CaptureIndex> {

        let listing = self.files.expand(&rule.glob).await;
        if listing.is_empty() {
            self.diagnostics.warn(
                Some(module),
                None,
                format!("{} matched no files", rule.describe()),
            );
        }

        let mut index = CaptureIndex::default();
        for path in listing.iter() {
            let Some(content) = self.files.read(path).await else {
                continue;
            };
            for (line_no, line) in content.lines().enumerate() {
                for caps in rule.regex.captures_iter(line) {
                    let Some(name) = caps.name(NAME_CAPTURE) else {
                        continue;
                    };
                    index.push(Capture {
                        name: name.as_str().to_string(),
                        kind: caps.name(KIND_CAPTURE).map(|k| k.as_str().to_string()),
                        file: path.clone(),
                        line: line_no as u32 + 1,
                    });
                }
            }
        }

        tracing::debug!(module = module, rule = rule.index, files = listing.len(), "Indexed filesystem rule");

        Arc::new(index)
    }
}

#[async_trait]
impl Matcher for FilesystemMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Filesystem
    }

    async fn matches(&self, module: &str, item: &Item) -> MatchResult {
        let Some(rules) = self.rules.get(module) else {
            return MatchResult::no_match();
        };

        for rule in rules {
            let index = self.index_for(module, rule).await;
            if let Some(capture) = index.find(item) {
                return MatchResult::matched(Provenance {
                    matcher: MatcherKind::Filesystem,
                    rule: rule.describe(),
                    file: Some(capture.file.clone()),
                    line: Some(capture.line),
                });
            }
        }

        MatchResult::no_match()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilesystemRule, ModuleRule};
    use crate::item::ItemKind;
    use std::fs;
    use tempfile::TempDir;

    fn config_with(root: &std::path::Path, rules: Vec<FilesystemRule>) -> Config {
        let mut config = Config {
            base_dir: root.to_path_buf(),
            ..Default::default()
        };
        let mut users = ModuleRule::new("users");
        users.filesystem = rules;
        config.modules.push(users);
        config
    }

    fn matcher(config: &Config) -> Result<FilesystemMatcher, MatcherError> {
        let diagnostics = Arc::new(Diagnostics::new());
        let files = Arc::new(SourceFiles::new(&config.base_dir, Arc::clone(&diagnostics)));
        FilesystemMatcher::from_config(config, files, diagnostics)
    }

    #[test]
    fn test_missing_name_group_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = config_with(
            temp.path(),
            vec![FilesystemRule {
                files: "src/**/*.ts".to_string(),
                pattern: r"query\.(\w+)".to_string(),
            }],
        );

        let err = matcher(&config).err().unwrap();
        assert!(matches!(err, MatcherError::MissingNameGroup { ref module, rule: 0, .. } if module == "users"));
    }

    #[test]
    fn test_invalid_regex_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = config_with(
            temp.path(),
            vec![FilesystemRule {
                files: "src/**/*.ts".to_string(),
                pattern: r"query\.(?P<name>\w+".to_string(),
            }],
        );
        assert!(matches!(matcher(&config), Err(MatcherError::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn test_captured_name_must_equal_item() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/users")).unwrap();
        fs::write(
            temp.path().join("src/users/resolvers.ts"),
            "// resolvers\nexport const q = query.users;\nexport const r = query.user;\n",
        )
        .unwrap();

        let config = config_with(
            temp.path(),
            vec![FilesystemRule {
                files: "src/%module%/*.ts".to_string(),
                pattern: r"query\.(?P<name>\w+)".to_string(),
            }],
        );
        let matcher = matcher(&config).unwrap();

        let result = matcher.matches("users", &Item::new(ItemKind::Query, "user")).await;
        assert!(result.matched);
        let provenance = result.provenance.unwrap();
        assert_eq!(provenance.file.as_deref(), Some("src/users/resolvers.ts"));
        assert_eq!(provenance.line, Some(3));
        assert_eq!(provenance.rule, "filesystem[0] src/users/*.ts");

        let miss = matcher.matches("users", &Item::new(ItemKind::Query, "use")).await;
        assert!(!miss.matched);
    }

    #[tokio::test]
    async fn test_kind_group_restricts_item_kind() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/ops.ts"), "mutation:login\n").unwrap();

        let config = config_with(
            temp.path(),
            vec![FilesystemRule {
                files: "src/*.ts".to_string(),
                pattern: r"(?P<kind>query|mutation):(?P<name>\w+)".to_string(),
            }],
        );
        let matcher = matcher(&config).unwrap();

        assert!(matcher.matches("users", &Item::new(ItemKind::Mutation, "login")).await.matched);
        assert!(!matcher.matches("users", &Item::new(ItemKind::Query, "login")).await.matched);
    }

    #[tokio::test]
    async fn test_first_rule_wins() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::create_dir_all(temp.path().join("b")).unwrap();
        fs::write(temp.path().join("a/x.ts"), "type:User\n").unwrap();
        fs::write(temp.path().join("b/y.ts"), "type:User\n").unwrap();

        let rule = |dir: &str| FilesystemRule {
            files: format!("{}/*.ts", dir),
            pattern: r"type:(?P<name>\w+)".to_string(),
        };
        let config = config_with(temp.path(), vec![rule("missing"), rule("b"), rule("a")]);
        let matcher = matcher(&config).unwrap();

        let result = matcher.matches("users", &Item::new(ItemKind::Type, "User")).await;
        let provenance = result.provenance.unwrap();
        assert_eq!(provenance.file.as_deref(), Some("b/y.ts"));
        assert!(provenance.rule.starts_with("filesystem[1]"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookups_build_one_index() {
        let temp = TempDir::new().unwrap();
        let config = config_with(
            temp.path(),
            vec![FilesystemRule {
                files: "missing/*.ts".to_string(),
                pattern: r"type:(?P<name>\w+)".to_string(),
            }],
        );
        let matcher = matcher(&config).unwrap();

        let items: Vec<Item> = (0..8)
            .map(|i| Item::new(ItemKind::Type, format!("Type{}", i)))
            .collect();
        let results =
            futures::future::join_all(items.iter().map(|item| matcher.matches("users", item))).await;

        assert!(results.iter().all(|r| !r.matched));
        // The empty-glob warning is pushed once per index build.
        assert_eq!(matcher.diagnostics.len(), 1);
    }
}
