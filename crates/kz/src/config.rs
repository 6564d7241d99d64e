use crate::error::{CliError, Result};
use kz_core::templates::{load_templates, load_workspace_templates};
use kz_core::TemplateCatalog;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_BOARD: &str = ".kazi/board.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace_root: PathBuf,
    pub board_path: PathBuf,
    pub templates_path: Option<PathBuf>,
    pub json: bool,
}

impl Config {
    pub fn resolve(
        root: &Path,
        board: Option<PathBuf>,
        templates: Option<PathBuf>,
        json: bool,
    ) -> Self {
        let board_path = match board {
            Some(path) if path.is_absolute() => path,
            Some(path) => root.join(path),
            None => root.join(DEFAULT_BOARD),
        };
        let templates_path = templates.map(|path| {
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        });
        Self {
            workspace_root: root.to_path_buf(),
            board_path,
            templates_path,
            json,
        }
    }

    /// Built-ins, then `.kazi/templates.toml`, then the explicit file.
    pub fn catalog(&self) -> Result<TemplateCatalog> {
        let mut extra = load_workspace_templates(&self.workspace_root)?;
        if let Some(path) = &self.templates_path {
            if !path.is_file() {
                return Err(CliError::Config {
                    message: format!("templates file not found: {}", path.display()),
                });
            }
            extra.extend(load_templates(path)?);
        }
        debug!(extra = extra.len(), "loaded custom templates");
        Ok(TemplateCatalog::builtin().with_templates(extra)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_paths_resolve_against_root() {
        let root = Path::new("/work/project");
        let config = Config::resolve(root, None, Some(PathBuf::from("t.toml")), false);
        assert_eq!(config.board_path, root.join(".kazi/board.json"));
        assert_eq!(config.templates_path, Some(root.join("t.toml")));

        let config = Config::resolve(root, Some(PathBuf::from("/tmp/b.json")), None, true);
        assert_eq!(config.board_path, PathBuf::from("/tmp/b.json"));
        assert!(config.json);
    }

    #[test]
    fn test_explicit_templates_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(dir.path(), None, Some(PathBuf::from("missing.toml")), false);
        assert_matches!(config.catalog(), Err(CliError::Config { .. }));
    }

    #[test]
    fn test_explicit_templates_join_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("extra.toml"),
            "[[template]]\nname = \"Podcast\"\n\n[[template.stage]]\nname = \"Host\"\n",
        )
        .unwrap();
        let config = Config::resolve(dir.path(), None, Some(PathBuf::from("extra.toml")), false);
        let catalog = config.catalog().unwrap();
        assert!(catalog.get("podcast").is_ok());
        assert!(catalog.get("Quick Approval").is_ok());
    }
}
