use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use super::{MatchResult, Matcher, MatcherKind, Provenance};
use crate::config::Config;
use crate::item::Item;

/// Exact membership in a module's `items` allow-list.
#[derive(Debug, Default)]
pub struct StaticListMatcher {
    lists: HashMap<String, HashSet<String>>,
}

impl StaticListMatcher {
    pub fn from_config(config: &Config) -> Self {
        let lists = config
            .modules
            .iter()
            .filter(|m| !m.items.is_empty())
            .map(|m| (m.name.clone(), m.items.iter().cloned().collect()))
            .collect();
        Self { lists }
    }
}

#[async_trait]
impl Matcher for StaticListMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Static
    }

    async fn matches(&self, module: &str, item: &Item) -> MatchResult {
        let listed = self
            .lists
            .get(module)
            .is_some_and(|names| names.contains(&item.name));

        if listed {
            MatchResult::matched(Provenance {
                matcher: MatcherKind::Static,
                rule: "items".to_string(),
                file: None,
                line: None,
            })
        } else {
            MatchResult::no_match()
        }
    }
}
