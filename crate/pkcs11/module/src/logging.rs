//! File logging of the module.
//!
//! The module runs inside the caller's process, which owns stdout and stderr,
//! so traces go to `<log_home>/<log_name>.log` instead.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{Mutex, Once},
};

use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Registry, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{MError, MResult, config::ModuleConfig};

static TRACING_INIT: Once = Once::new();

/// Install the file subscriber described by `config`, once per process.
///
/// Failures are reported on stderr: a module that cannot log still answers
/// queries.
pub fn initialize_logging(config: &ModuleConfig) {
    TRACING_INIT.call_once(|| {
        if let Err(e) = install(config) {
            eprintln!("cosmian pkcs11: failed to initialize logging: {e}");
        }
    });
}

/// `<log_home>/<log_name>.log`, with `log_home` defaulting to `~/.cosmian`.
pub fn log_file_path(log_name: &str, log_home: Option<&Path>) -> MResult<PathBuf> {
    if log_name.is_empty() || log_name.contains(['/', '\\']) {
        return Err(MError::Configuration(format!(
            "invalid log file name {log_name:?}"
        )));
    }
    let log_home = match log_home {
        Some(log_home) => log_home.to_path_buf(),
        None => etcetera::home_dir()
            .map_err(|e| MError::Configuration(format!("no home directory: {e:?}")))?
            .join(".cosmian"),
    };
    Ok(log_home.join(format!("{log_name}.log")))
}

fn install(config: &ModuleConfig) -> MResult<()> {
    let log_path = log_file_path(&config.log_name, config.log_home.as_deref())?;
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            MError::Configuration(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .map_err(|e| MError::Configuration(format!("cannot open {}: {e}", log_path.display())))?;
    // RUST_LOG, when set, refines the configured level
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();
    // a subscriber installed by the host application takes precedence
    _ = Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_span_events(FmtSpan::ENTER),
        )
        .with(env_filter)
        .with(ErrorLayer::default())
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::log_file_path;
    use crate::{MError, MResult};

    #[test]
    fn test_log_file_path() -> MResult<()> {
        assert_eq!(
            log_file_path("pkcs11", Some(Path::new("/var/log/cosmian")))?,
            PathBuf::from("/var/log/cosmian/pkcs11.log")
        );
        // falls back to the home directory when one exists
        if let Ok(path) = log_file_path("pkcs11", None) {
            assert!(path.ends_with(".cosmian/pkcs11.log"));
        }
        Ok(())
    }

    #[test]
    fn test_log_file_path_rejects_bad_names() {
        for name in ["", "../pkcs11", "logs\\pkcs11"] {
            assert!(matches!(
                log_file_path(name, Some(Path::new("/tmp"))),
                Err(MError::Configuration(_))
            ));
        }
    }
}
