use crate::fs::node::{NodeArena, NodeId, NodeKind};
use crate::fs::path;

/// What the pattern is tested against during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub match_names: bool,
    pub match_content: bool,
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            match_names: true,
            match_content: false,
            case_sensitive: true,
        }
    }
}

/// Lazy depth-first traversal yielding the absolute paths of matching
/// nodes. Children are visited lexicographically by name, so repeated
/// searches over an unchanged tree produce identical sequences. Dropping
/// the iterator aborts the search; it never mutates the tree.
pub struct Search<'a> {
    arena: &'a NodeArena,
    pattern: String,
    options: SearchOptions,
    stack: Vec<NodeId>,
}

impl<'a> Search<'a> {
    pub(crate) fn new(
        arena: &'a NodeArena,
        start: NodeId,
        pattern: &str,
        options: SearchOptions,
    ) -> Self {
        let pattern = if options.case_sensitive {
            pattern.to_string()
        } else {
            pattern.to_lowercase()
        };
        Search {
            arena,
            pattern,
            options,
            stack: vec![start],
        }
    }

    fn matches(&self, id: NodeId) -> bool {
        let node = &self.arena[id];
        if self.options.match_names && self.contains(&node.name) {
            return true;
        }
        if self.options.match_content {
            if let NodeKind::File { content } = &node.kind {
                return self.contains(content);
            }
        }
        false
    }

    fn contains(&self, haystack: &str) -> bool {
        if self.options.case_sensitive {
            haystack.contains(&self.pattern)
        } else {
            haystack.to_lowercase().contains(&self.pattern)
        }
    }
}

impl Iterator for Search<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(id) = self.stack.pop() {
            if let NodeKind::Directory { children } = &self.arena[id].kind {
                // Pushed in reverse so the stack pops names in
                // lexicographic order.
                let mut ordered: Vec<_> = children
                    .iter()
                    .map(|(name, child)| (name.as_str(), *child))
                    .collect();
                ordered.sort_by(|a, b| b.0.cmp(a.0));
                self.stack.extend(ordered.into_iter().map(|(_, child)| child));
            }
            if self.matches(id) {
                return Some(path::absolute_path_of(self.arena, id));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::engine::{MakeDirOptions, TreeEngine};

    fn docs_tree() -> TreeEngine {
        let mut engine = TreeEngine::new();
        engine
            .make_directory("/docs", MakeDirOptions::default())
            .unwrap();
        engine.write_file("/docs/readme.txt", "hello world").unwrap();
        engine.write_file("/docs/notes.txt", "bye").unwrap();
        engine
    }

    #[test]
    fn content_search_finds_exactly_the_matching_file() {
        let engine = docs_tree();
        let options = SearchOptions {
            match_names: false,
            match_content: true,
            case_sensitive: true,
        };
        let hits: Vec<_> = engine.search("/docs", "hello", options).unwrap().collect();
        assert_eq!(hits, ["/docs/readme.txt"]);
    }

    #[test]
    fn name_search_includes_the_search_root() {
        let engine = docs_tree();
        let hits: Vec<_> = engine
            .search("/", "docs", SearchOptions::default())
            .unwrap()
            .collect();
        assert_eq!(hits, ["/docs"]);
    }

    #[test]
    fn name_matches_are_lexicographic_and_repeatable() {
        let mut engine = TreeEngine::new();
        for name in ["zebra.txt", "alpha.txt", "mid.txt"] {
            engine.write_file(&format!("/{name}"), "").unwrap();
        }
        let first: Vec<_> = engine
            .search("/", ".txt", SearchOptions::default())
            .unwrap()
            .collect();
        let second: Vec<_> = engine
            .search("/", ".txt", SearchOptions::default())
            .unwrap()
            .collect();
        assert_eq!(first, ["/alpha.txt", "/mid.txt", "/zebra.txt"]);
        assert_eq!(first, second);
    }

    #[test]
    fn case_insensitive_matching_covers_names_and_content() {
        let mut engine = TreeEngine::new();
        engine.write_file("/README", "Hello World").unwrap();
        let options = SearchOptions {
            match_names: true,
            match_content: true,
            case_sensitive: false,
        };
        let by_name: Vec<_> = engine.search("/", "readme", options).unwrap().collect();
        assert_eq!(by_name, ["/README"]);
        let by_content: Vec<_> = engine.search("/", "hello w", options).unwrap().collect();
        assert_eq!(by_content, ["/README"]);

        let strict = SearchOptions {
            case_sensitive: true,
            ..options
        };
        assert!(engine.search("/", "readme", strict).unwrap().next().is_none());
    }

    #[test]
    fn search_is_lazy_and_abortable() {
        let mut engine = TreeEngine::new();
        for index in 0..100 {
            engine.write_file(&format!("/file{index:03}"), "").unwrap();
        }
        let first = engine
            .search("/", "file", SearchOptions::default())
            .unwrap()
            .next();
        assert_eq!(first.as_deref(), Some("/file000"));
    }

    #[test]
    fn unresolvable_root_is_path_not_found() {
        let engine = TreeEngine::new();
        let result = engine.search("/missing", "x", SearchOptions::default());
        assert!(matches!(
            result,
            Err(crate::fs::FsError::PathNotFound { .. })
        ));
    }

    #[test]
    fn directories_never_match_on_content() {
        let mut engine = TreeEngine::new();
        engine
            .make_directory("/hello", MakeDirOptions::default())
            .unwrap();
        let options = SearchOptions {
            match_names: false,
            match_content: true,
            case_sensitive: true,
        };
        assert!(engine.search("/", "hello", options).unwrap().next().is_none());
    }
}
