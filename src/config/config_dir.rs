use std::{fs::File, io::Read, path::PathBuf};

use tracing::debug;

use super::error::{ConfigError, ConfigResult};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolves where `config.toml` lives.
///
/// Debug builds read it from the working directory. Release builds look in the
/// per-user config directory first (`~/.config/coursehub/` or `%APPDATA%\coursehub\`)
/// and fall back to the working directory.
pub fn find_config_file(use_local: bool) -> PathBuf {
    let local = PathBuf::from("./").join(CONFIG_FILE_NAME);
    if use_local {
        return local;
    }

    #[cfg(unix)]
    let base = std::env::var_os("HOME");
    #[cfg(windows)]
    let base = std::env::var_os("APPDATA");

    #[cfg(any(unix, windows))]
    if let Some(base) = base {
        let mut path = PathBuf::from(base);

        if cfg!(unix) {
            path = path.join(".config");
        }

        path = path.join(crate::APPLICATION_NAME).join(CONFIG_FILE_NAME);

        if path.exists() {
            return path;
        }
    }

    local
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    let filename = find_config_file(use_local);

    tracing::trace!("looking for config at: {}", filename.display());
    if !filename.exists() {
        return Err(ConfigError::ConfigNotFound);
    }

    let filename = filename.canonicalize()?;
    debug!("using {} as configuration file", filename.display());

    let mut fd = File::open(filename)?;
    let mut buf = Vec::new();
    fd.read_to_end(&mut buf)?;

    Ok(buf)
}
