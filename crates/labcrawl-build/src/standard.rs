//! Standard rule sets for behavior and slice experiments.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use labcrawl_core::{BuildError, HierarchyKind, ParamError, Payload, ProjectParams, levels};

use crate::rule::LevelRule;

/// Separator that marks a session directory name as normalized.
pub const DAY_SUFFIX_SEPARATOR: char = '_';

/// Payload key holding a session's experiment parameters.
pub const EXP_PARAM_KEY: &str = "exp_param";

/// Condition directories: `cond*`.
pub fn cond_rule() -> LevelRule {
    LevelRule::new(levels::COND, "cond*")
}

/// Subject directories: every non-ignored child.
pub fn mouse_rule() -> LevelRule {
    LevelRule::new(levels::MOUSE, "*")
}

/// Session directories: `day*`, normalized to carry a `_` suffix.
pub fn day_rule() -> LevelRule {
    LevelRule::new(levels::DAY, "day*")
        .with_preprocess(normalize_day_dir)
        .with_payload(load_day_payload)
}

/// Imaged cell directories: `*XY*`.
pub fn cell_rule() -> LevelRule {
    LevelRule::new(levels::CELL, "*XY*")
}

/// Append `_` to a session directory name that has no `_` yet.
///
/// The directory is renamed on disk. Names that already contain the
/// separator are returned unchanged, so running this twice is a no-op.
pub fn normalize_day_dir(dir: &Path, params: &dyn ProjectParams) -> Result<PathBuf, BuildError> {
    let Some(name) = dir.file_name() else {
        return Ok(dir.to_path_buf());
    };
    if name.to_string_lossy().contains(DAY_SUFFIX_SEPARATOR) {
        return Ok(dir.to_path_buf());
    }

    let mut new_name = OsString::from(name);
    new_name.push(DAY_SUFFIX_SEPARATOR.to_string());
    let renamed = dir.with_file_name(new_name);

    params.log_warn(&format!("Inappropriate day name: {}", dir.display()));
    if fs::symlink_metadata(&renamed).is_ok() {
        return Err(BuildError::RenameCollision {
            from: dir.to_path_buf(),
            to: renamed,
        });
    }
    fs::rename(dir, &renamed).map_err(|source| BuildError::Rename {
        from: dir.to_path_buf(),
        to: renamed.clone(),
        source,
    })?;
    params.log_warn(&format!("Renamed: {}", renamed.display()));

    Ok(renamed)
}

/// Payload for a session: `{"exp_param": <params or null>}`.
///
/// A failing lookup is logged and leaves `exp_param` null.
pub fn load_day_payload(dir: &Path, params: &dyn ProjectParams) -> Result<Payload, ParamError> {
    let exp_param = match params.get_exp_param(dir) {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(err) => {
            params.log_exception(&err);
            Value::Null
        }
    };
    Ok(Payload::from([(EXP_PARAM_KEY.to_string(), exp_param)]))
}

/// Known experiment layouts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Layout {
    /// cond / mouse / day
    #[default]
    Behavior,
    /// cond / cell
    Slice,
}

impl Layout {
    /// Level rules for this layout, outermost first.
    pub fn rules(self) -> Vec<LevelRule> {
        match self {
            Layout::Behavior => vec![cond_rule(), mouse_rule(), day_rule()],
            Layout::Slice => vec![cond_rule(), cell_rule()],
        }
    }

    /// Node variant built for this layout.
    pub fn kind(self) -> HierarchyKind {
        match self {
            Layout::Behavior => HierarchyKind::Behavior,
            Layout::Slice => HierarchyKind::Slice,
        }
    }

    /// Level names, outermost first.
    pub fn levels(self) -> &'static [&'static str] {
        match self {
            Layout::Behavior => &[levels::COND, levels::MOUSE, levels::DAY],
            Layout::Slice => &[levels::COND, levels::CELL],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcrawl_core::NoParams;
    use serde_json::json;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingParams {
        warnings: RefCell<Vec<String>>,
        errors: RefCell<Vec<String>>,
        fail_lookup: bool,
    }

    impl ProjectParams for RecordingParams {
        fn log_warn(&self, message: &str) {
            self.warnings.borrow_mut().push(message.to_string());
        }

        fn log_exception(&self, error: &dyn std::error::Error) {
            self.errors.borrow_mut().push(error.to_string());
        }

        fn get_exp_param(&self, _dir: &Path) -> Result<Option<Value>, ParamError> {
            if self.fail_lookup {
                Err(ParamError::Invalid {
                    message: "no such session".into(),
                })
            } else {
                Ok(Some(json!({"fps": 30})))
            }
        }
    }

    #[test]
    fn test_normalize_renames_and_warns() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("day001");
        fs::create_dir(&dir).unwrap();
        let params = RecordingParams::default();

        let renamed = normalize_day_dir(&dir, &params).unwrap();

        assert_eq!(renamed, temp.path().join("day001_"));
        assert!(renamed.is_dir());
        assert!(!dir.exists());
        let warnings = params.warnings.borrow();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("Inappropriate day name"));
        assert!(warnings[1].starts_with("Renamed"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("day002");
        fs::create_dir(&dir).unwrap();

        let once = normalize_day_dir(&dir, &NoParams).unwrap();
        let twice = normalize_day_dir(&once, &NoParams).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.file_name().unwrap(), "day002_");
    }

    #[test]
    fn test_normalize_keeps_suffixed_name() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("day003_pre");
        fs::create_dir(&dir).unwrap();
        let params = RecordingParams::default();

        assert_eq!(normalize_day_dir(&dir, &params).unwrap(), dir);
        assert!(params.warnings.borrow().is_empty());
    }

    #[test]
    fn test_normalize_collision() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("day004")).unwrap();
        fs::create_dir(temp.path().join("day004_")).unwrap();

        let err = normalize_day_dir(&temp.path().join("day004"), &NoParams).unwrap_err();
        assert!(matches!(err, BuildError::RenameCollision { .. }));
        assert!(temp.path().join("day004").is_dir());
    }

    #[test]
    fn test_day_payload() {
        let params = RecordingParams::default();
        let payload = load_day_payload(Path::new("/p/day001_"), &params).unwrap();
        assert_eq!(payload[EXP_PARAM_KEY], json!({"fps": 30}));

        let payload = load_day_payload(Path::new("/p/day001_"), &NoParams).unwrap();
        assert_eq!(payload[EXP_PARAM_KEY], Value::Null);
    }

    #[test]
    fn test_day_payload_lookup_failure_degrades() {
        let params = RecordingParams {
            fail_lookup: true,
            ..Default::default()
        };
        let payload = load_day_payload(Path::new("/p/day001_"), &params).unwrap();

        assert_eq!(payload.len(), 1);
        assert_eq!(payload[EXP_PARAM_KEY], Value::Null);
        assert_eq!(params.errors.borrow().len(), 1);
    }

    #[test]
    fn test_layouts() {
        let rules = Layout::Behavior.rules();
        let patterns: Vec<_> = rules.iter().map(|r| r.pattern()).collect();
        assert_eq!(patterns, ["cond*", "*", "day*"]);
        assert_eq!(Layout::Slice.levels(), &["cond", "cell"]);
        assert_eq!("slice".parse::<Layout>().unwrap(), Layout::Slice);
        assert_eq!(Layout::Behavior.kind(), HierarchyKind::Behavior);
    }
}
