use std::{fs, path::Path};

use anyhow::{Context, Result};
use scdb_params::prelude::ScdbParams;
use tracing::debug;

use crate::cli::ParamsFile;

/// Loads the params from the given file, or the built-in defaults if there is none.
pub(crate) fn load(file: &ParamsFile) -> Result<ScdbParams> {
    match &file.params {
        Some(path) => from_path(path),
        None => {
            debug!("using built-in params");
            Ok(ScdbParams::default())
        }
    }
}

fn from_path(path: &Path) -> Result<ScdbParams> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read params file {}", path.display()))?;

    ScdbParams::from_toml_str(&contents)
        .with_context(|| format!("failed to parse params file {}", path.display()))
}
