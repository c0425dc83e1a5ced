use once_cell::sync::OnceCell;
use tracing::info;

use crate::{MError, MResult, traits::MechanismProvider};

static PROVIDER: OnceCell<Box<dyn MechanismProvider>> = OnceCell::new();

/// Install the process wide provider used by the C entry points.
///
/// The provider is fully built before it is published, and can be installed
/// only once per process.
pub fn register_provider(provider: Box<dyn MechanismProvider>) -> MResult<()> {
    PROVIDER
        .set(provider)
        .map_err(|_| MError::CryptokiAlreadyInitialized)?;
    info!("mechanism provider registered");
    Ok(())
}

/// The process wide provider, if one was registered.
pub fn provider() -> MResult<&'static dyn MechanismProvider> {
    PROVIDER
        .get()
        .map(|provider| provider.as_ref())
        .ok_or(MError::CryptokiNotInitialized)
}
