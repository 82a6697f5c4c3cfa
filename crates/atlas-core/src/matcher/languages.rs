//! Tree-sitter grammars available to structural rules.

use std::collections::HashMap;
use tree_sitter::{Language, Parser, Tree};

/// Registry of tree-sitter grammars by name.
///
/// Registers all built-in grammars on creation. Names are matched
/// case-insensitively and a few common aliases are accepted.
pub struct GrammarRegistry {
    grammars: HashMap<&'static str, Language>,
}

impl GrammarRegistry {
    /// Create a registry with all built-in grammars.
    pub fn new() -> Self {
        let mut grammars = HashMap::new();
        grammars.insert("typescript", tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into());
        grammars.insert("tsx", tree_sitter_typescript::LANGUAGE_TSX.into());
        grammars.insert("javascript", tree_sitter_javascript::LANGUAGE.into());
        grammars.insert("python", tree_sitter_python::LANGUAGE.into());
        grammars.insert("go", tree_sitter_go::LANGUAGE.into());
        grammars.insert("java", tree_sitter_java::LANGUAGE.into());
        grammars.insert("c_sharp", tree_sitter_c_sharp::LANGUAGE.into());
        Self { grammars }
    }

    fn canonical(name: &str) -> String {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "ts" => "typescript".to_string(),
            "js" | "jsx" => "javascript".to_string(),
            "py" => "python".to_string(),
            "golang" => "go".to_string(),
            "csharp" | "c#" | "cs" => "c_sharp".to_string(),
            _ => name,
        }
    }

    /// Grammar for a language name.
    pub fn language(&self, name: &str) -> Option<Language> {
        self.grammars.get(Self::canonical(name).as_str()).cloned()
    }

    /// Names of all registered grammars, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.grammars.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse source code into a tree-sitter tree.
pub(crate) fn parse_tree(language: &Language, content: &str) -> Result<Tree, String> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| format!("Failed to set language: {}", e))?;

    parser
        .parse(content, None)
        .ok_or_else(|| "Failed to parse content".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_all_grammars() {
        let registry = GrammarRegistry::new();
        for name in ["typescript", "tsx", "javascript", "python", "go", "java", "c_sharp"] {
            assert!(registry.language(name).is_some(), "missing {}", name);
        }
        assert_eq!(registry.names().len(), 7);
    }

    #[test]
    fn test_aliases_and_case() {
        let registry = GrammarRegistry::new();
        assert!(registry.language("TypeScript").is_some());
        assert!(registry.language("py").is_some());
        assert!(registry.language("csharp").is_some());
        assert!(registry.language("cobol").is_none());
    }

    #[test]
    fn test_parse_tree() {
        let registry = GrammarRegistry::new();
        let language = registry.language("typescript").unwrap();
        let tree = parse_tree(&language, "const x = query.user;").unwrap();
        assert!(!tree.root_node().has_error());
    }
}
