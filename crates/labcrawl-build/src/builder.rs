//! Recursive, rule-driven tree construction.

use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobMatcher;
use indexmap::IndexMap;
use serde::Serialize;

use labcrawl_core::glob::{compile_pattern, list_matching};
use labcrawl_core::{BuildError, HierTree, NodeFactory, NodeId, Payload, ProjectParams};

use crate::rule::LevelRule;
use crate::standard::Layout;

/// What happened during one build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    /// Nodes created per level, outermost level first.
    pub nodes_per_level: IndexMap<String, usize>,
    /// Directories renamed by normalization, as (before, after).
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Matching directories rejected by a level filter.
    pub filtered: usize,
    /// Nodes whose payload loader failed and got an empty payload.
    pub degraded_payloads: usize,
}

impl BuildStats {
    /// Total number of nodes created.
    pub fn total_nodes(&self) -> usize {
        self.nodes_per_level.values().sum()
    }
}

/// Builds a [`HierTree`] by applying one [`LevelRule`] per depth.
///
/// Discovery is depth-first pre-order. Siblings are sorted by name, which is
/// the only source of ordering. A directory is fully normalized before its
/// children are listed, so deeper levels always see the renamed path.
#[derive(Debug)]
pub struct TreeBuilder {
    rules: Vec<LevelRule>,
}

struct BuildState<'a, F: ?Sized> {
    matchers: Vec<GlobMatcher>,
    params: &'a dyn ProjectParams,
    factory: &'a F,
    tree: HierTree,
    stats: BuildStats,
}

impl TreeBuilder {
    /// Create a builder; `rules[0]` matches the top-level directories.
    pub fn new(rules: Vec<LevelRule>) -> Self {
        Self { rules }
    }

    /// Create a builder for a standard layout.
    pub fn for_layout(layout: Layout) -> Self {
        Self::new(layout.rules())
    }

    pub fn rules(&self) -> &[LevelRule] {
        &self.rules
    }

    /// Discover the hierarchy under `root`.
    pub fn build<F>(
        &self,
        root: &Path,
        params: &dyn ProjectParams,
        factory: &F,
    ) -> Result<HierTree, BuildError>
    where
        F: NodeFactory + ?Sized,
    {
        self.build_with_stats(root, params, factory)
            .map(|(tree, _)| tree)
    }

    /// Discover the hierarchy under `root` and report what was done.
    ///
    /// Filter and preprocess failures abort the build. Payload loader
    /// failures are logged through `params` and leave the node with an
    /// empty payload.
    pub fn build_with_stats<F>(
        &self,
        root: &Path,
        params: &dyn ProjectParams,
        factory: &F,
    ) -> Result<(HierTree, BuildStats), BuildError>
    where
        F: NodeFactory + ?Sized,
    {
        let metadata = fs::metadata(root).map_err(|e| BuildError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(BuildError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let matchers = self
            .rules
            .iter()
            .map(|rule| {
                compile_pattern(rule.pattern()).map_err(|source| BuildError::InvalidPattern {
                    level: rule.level().to_string(),
                    pattern: rule.pattern().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = BuildState {
            matchers,
            params,
            factory,
            tree: HierTree::new(),
            stats: BuildStats::default(),
        };
        for rule in &self.rules {
            state.stats.nodes_per_level.insert(rule.level().to_string(), 0);
        }

        tracing::debug!(root = %root.display(), depth = self.rules.len(), "building hierarchy");
        self.build_level(&mut state, None, root, 0)?;
        tracing::debug!(nodes = state.tree.len(), "hierarchy built");

        Ok((state.tree, state.stats))
    }

    fn build_level<F>(
        &self,
        state: &mut BuildState<'_, F>,
        parent: Option<NodeId>,
        base: &Path,
        depth: usize,
    ) -> Result<(), BuildError>
    where
        F: NodeFactory + ?Sized,
    {
        let Some(rule) = self.rules.get(depth) else {
            return Ok(());
        };

        let candidates =
            list_matching(base, &state.matchers[depth]).map_err(|e| BuildError::io(base, e))?;

        for candidate in candidates {
            if !candidate.is_dir() {
                continue;
            }
            if !rule.filter_dir(&candidate)? {
                state.stats.filtered += 1;
                continue;
            }

            let dir = rule.preprocess_dir(&candidate, state.params)?;
            if dir != candidate {
                state.stats.renamed.push((candidate, dir.clone()));
            }

            let payload = match rule.load_payload(&dir, state.params) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::debug!(path = %dir.display(), "payload loader failed");
                    state.params.log_exception(&err);
                    state.stats.degraded_payloads += 1;
                    Payload::new()
                }
            };

            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.to_string_lossy().into_owned());
            let mut node = state
                .factory
                .create(&name, &dir, rule.level(), parent, payload);
            // Structure belongs to the builder, not the factory.
            node.name = name.as_str().into();
            node.path.clone_from(&dir);
            node.level = rule.level().into();
            node.parent = parent;
            let id = state.tree.insert(node);
            *state
                .stats
                .nodes_per_level
                .entry(rule.level().to_string())
                .or_default() += 1;
            tracing::trace!(level = rule.level(), path = %dir.display(), "node created");

            self.build_level(state, Some(id), &dir, depth + 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcrawl_core::{HierNode, HierarchyKind, NoParams, ParamError};
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingParams {
        exceptions: Cell<usize>,
    }

    impl ProjectParams for CountingParams {
        fn log_exception(&self, _error: &dyn std::error::Error) {
            self.exceptions.set(self.exceptions.get() + 1);
        }
    }

    #[test]
    fn test_empty_rules() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("condA")).unwrap();

        let tree = TreeBuilder::new(Vec::new())
            .build(temp.path(), &NoParams, &HierarchyKind::Generic)
            .unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();

        let builder = TreeBuilder::for_layout(Layout::Behavior);
        let err = builder
            .build(&file, &NoParams, &HierarchyKind::Behavior)
            .unwrap_err();
        assert!(matches!(err, BuildError::NotADirectory { .. }));

        let err = builder
            .build(&temp.path().join("missing"), &NoParams, &HierarchyKind::Behavior)
            .unwrap_err();
        assert!(matches!(err, BuildError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_structural() {
        let temp = TempDir::new().unwrap();
        let builder = TreeBuilder::new(vec![LevelRule::new("cond", "cond[")]);
        let err = builder
            .build(temp.path(), &NoParams, &HierarchyKind::Generic)
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidPattern { .. }));
    }

    #[test]
    fn test_payload_failure_degrades() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("condA")).unwrap();

        let rule = LevelRule::new("cond", "cond*").with_payload(|_, _| {
            Err(ParamError::Invalid {
                message: "broken".into(),
            })
        });
        let params = CountingParams::default();
        let (tree, stats) = TreeBuilder::new(vec![rule])
            .build_with_stats(temp.path(), &params, &HierarchyKind::Generic)
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree.roots().next().unwrap().payload().is_empty());
        assert_eq!(stats.degraded_payloads, 1);
        assert_eq!(params.exceptions.get(), 1);
    }

    #[test]
    fn test_factory_cannot_move_nodes() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("condA/mouse1")).unwrap();

        let factory = |_: &str,
                       _: &Path,
                       _: &str,
                       _: Option<NodeId>,
                       payload: Payload| {
            HierNode::new("x", "/elsewhere", "bogus", HierarchyKind::Generic, None, payload)
        };
        let rules = vec![LevelRule::new("cond", "cond*"), LevelRule::new("mouse", "*")];
        let tree = TreeBuilder::new(rules)
            .build(temp.path(), &NoParams, &factory)
            .unwrap();

        let names: Vec<_> = tree.iter().map(|n| (n.level(), n.name())).collect();
        assert_eq!(names, [("cond", "condA"), ("mouse", "mouse1")]);
        let mouse = tree.iter().nth(1).unwrap();
        assert_eq!(mouse.path(), temp.path().join("condA/mouse1"));
        assert_eq!(mouse.parent().unwrap().name(), "condA");
    }

    #[test]
    fn test_filter_failure_aborts() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("condA")).unwrap();

        let rule = LevelRule::new("cond", "cond*").with_filter(|dir| {
            Err(BuildError::Filter {
                path: dir.to_path_buf(),
                message: "unreadable".into(),
            })
        });
        let err = TreeBuilder::new(vec![rule])
            .build(temp.path(), &NoParams, &HierarchyKind::Generic)
            .unwrap_err();
        assert!(matches!(err, BuildError::Filter { .. }));
    }
}
