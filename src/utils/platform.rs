//! Platform helpers: path expansion, home directory and executable lookup.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Returns the user's home directory.
///
/// # Errors
///
/// Fails when no home directory can be determined (e.g., `HOME` unset in a
/// minimal container).
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine home directory.\n\n\
            Set the HOME environment variable or pass explicit paths with --settings"
        )
    })
}

/// Expands `~` and `$VAR` / `${VAR}` references in a path string.
///
/// ```rust,no_run
/// use autodoc_cli::utils::platform::expand_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let settings = expand_path("~/.autodoc/config.toml")?;
/// let params = expand_path("$WORKDIR/fulfill_params.json")?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Fails on an undefined environment variable or an undeterminable home
/// directory.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| {
        format!(
            "Failed to expand path: {path}\n\n\
            Common issues:\n\
            - Undefined environment variable (e.g., $UNDEFINED_VAR)\n\
            - Invalid variable syntax (use $VAR or ${{VAR}})"
        )
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Locates an executable, preferring an explicit path when one is configured.
///
/// # Errors
///
/// Returns [`crate::core::AutodocError::CommandNotFound`] when the command is
/// neither at the configured path nor in `PATH`.
pub fn locate_command(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(crate::core::AutodocError::CommandNotFound {
            command: path.display().to_string(),
        }
        .into());
    }

    which::which(name).map_err(|_| {
        crate::core::AutodocError::CommandNotFound {
            command: name.to_string(),
        }
        .into()
    })
}
