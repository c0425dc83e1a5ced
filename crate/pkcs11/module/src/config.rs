use std::{path::PathBuf, str::FromStr};

use pkcs11_sys::CK_SLOT_ID;
use tracing::Level;

use crate::{MError, MResult, core::slot::SlotId};

pub const LOGGING_LEVEL_ENV: &str = "COSMIAN_PKCS11_LOGGING_LEVEL";
pub const LOG_HOME_ENV: &str = "COSMIAN_PKCS11_LOG_HOME";
pub const SLOTS_ENV: &str = "COSMIAN_PKCS11_SLOTS";

const DEFAULT_LOG_NAME: &str = "cosmian-pkcs11-mechanisms";
const DEFAULT_SLOT_ID: CK_SLOT_ID = 1;

/// Settings of the module, read from the environment of the host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    pub log_name: String,
    /// `None` logs under `~/.cosmian`
    pub log_home: Option<PathBuf>,
    pub log_level: Level,
    /// Slots exposed by the default token layer.
    pub slots: Vec<SlotId>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            log_name: DEFAULT_LOG_NAME.to_owned(),
            log_home: None,
            log_level: Level::INFO,
            slots: vec![SlotId::new(DEFAULT_SLOT_ID)],
        }
    }
}

impl ModuleConfig {
    pub fn from_env() -> MResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from a variable lookup; unset variables keep
    /// their default value.
    pub fn from_lookup<F>(lookup: F) -> MResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(level) = lookup(LOGGING_LEVEL_ENV) {
            config.log_level = Level::from_str(level.trim()).map_err(|e| {
                MError::Configuration(format!("{LOGGING_LEVEL_ENV}: invalid level {level:?}: {e}"))
            })?;
        }
        if let Some(log_home) = lookup(LOG_HOME_ENV).filter(|home| !home.trim().is_empty()) {
            config.log_home = Some(PathBuf::from(log_home));
        }
        if let Some(slots) = lookup(SLOTS_ENV) {
            config.slots = parse_slots(&slots)?;
        }
        Ok(config)
    }
}

fn parse_slots(slots: &str) -> MResult<Vec<SlotId>> {
    let slots = slots
        .split(',')
        .map(str::trim)
        .filter(|slot| !slot.is_empty())
        .map(|slot| {
            slot.parse::<CK_SLOT_ID>().map(SlotId::new).map_err(|e| {
                MError::Configuration(format!("{SLOTS_ENV}: invalid slot id {slot:?}: {e}"))
            })
        })
        .collect::<MResult<Vec<_>>>()?;
    if slots.is_empty() {
        return Err(MError::Configuration(format!(
            "{SLOTS_ENV}: at least one slot id is required"
        )));
    }
    Ok(slots)
}
