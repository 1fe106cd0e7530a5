//! Project scaffolding for `recordcheck init`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use super::config::{CONFIG_FILE, Config, write_config};
use super::schema_file::DOCUMENT_SCHEMA;

const EXAMPLE_SCHEMA: &str = r#"{
  "root": "User",
  "schemas": [
    {
      "name": "User",
      "extra": "ignore",
      "fields": [
        {"name": "name", "type": {"kind": "string"},
         "constraints": [{"kind": "length", "min": 2, "max": 50}]},
        {"name": "age", "type": {"kind": "integer"},
         "constraints": [{"kind": "range", "min": 0, "max": 120}]},
        {"name": "email", "type": {"kind": "string"},
         "constraints": [{"kind": "pattern", "regex": "^[^@]+@[^@]+\\.[^@]+$"}]},
        {"name": "nickname", "type": {"kind": "string"}, "nullable": true, "default": null},
        {"name": "is_active", "type": {"kind": "boolean"}, "default": true}
      ]
    }
  ]
}
"#;

/// Files `init` creates under a project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub document_schema_path: PathBuf,
    pub example_schema_path: PathBuf,
}

impl ProjectPaths {
    /// Paths under `root`; a relative `config_file` is resolved against it.
    pub fn new(root: impl Into<PathBuf>, config_file: &Path) -> Self {
        let root = root.into();
        let schemas_dir = root.join("schemas");
        Self {
            config_path: root.join(config_file),
            document_schema_path: schemas_dir
                .join("record_schema")
                .join("v1.schema.json"),
            example_schema_path: schemas_dir.join("user.json"),
            root,
        }
    }
}

/// Options for [`init_project`].
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Overwrite files `init` owns.
    pub force: bool,
    /// Config file to write, relative to the project root unless absolute.
    pub config_file: PathBuf,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            force: false,
            config_file: PathBuf::from(CONFIG_FILE),
        }
    }
}

/// Write the default config, the document schema and an example schema.
///
/// Fails if the config file already exists unless `options.force` is set.
pub fn init_project(root: &Path, options: &InitOptions) -> Result<ProjectPaths> {
    let paths = ProjectPaths::new(root, &options.config_file);
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "recordcheck init: {} already exists (use --force to overwrite)",
            paths.config_path.display()
        ));
    }

    write_config(&paths.config_path, &Config::default())?;
    write_file(&paths.document_schema_path, DOCUMENT_SCHEMA)?;
    if options.force || !paths.example_schema_path.exists() {
        write_file(&paths.example_schema_path, EXAMPLE_SCHEMA)?;
    }
    debug!(root = %paths.root.display(), "initialized project");
    Ok(paths)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}
