// Copyright 2024 Cosmian Tech SAS
// Changes made to the original code are
// licensed under the Business Source License version 1.1.
//
// Original code:
// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]
#![deny(unsafe_op_in_unsafe_fn)]

use std::slice;

pub use pkcs11_sys::{CK_RV, CKR_OK};
use pkcs11_sys::{
    CK_MECHANISM_INFO_PTR, CK_MECHANISM_TYPE, CK_MECHANISM_TYPE_PTR, CK_SLOT_ID, CK_ULONG,
    CK_ULONG_PTR,
};
use tracing::info;

use crate::{
    config::ModuleConfig,
    core::{
        mechanism::{MechanismCapability, MechanismType},
        slot::SlotId,
    },
    query::{MechanismListRequest, MechanismQuery},
    registry::MechanismRegistry,
    traits::{provider, register_provider},
};

pub mod config;
pub mod core;
mod error;
pub mod logging;
pub mod query;
pub mod registry;
#[cfg(test)]
mod tests;
pub mod traits;

pub use error::{MError, MResult};

fn result_to_rv<F>(name: &str, f: F) -> CK_RV
where
    F: FnOnce() -> MResult<()>,
{
    match f() {
        Ok(()) => CKR_OK,
        Err(e) => {
            tracing::error!("{}: {}", name, e);
            e.into()
        }
    }
}

#[macro_export]
macro_rules! cryptoki_fn {
    (fn $name:ident ( $($arg:ident : $type:ty),* $(,)?) $body:block) => {
        #[tracing::instrument(level = tracing::Level::TRACE, ret)]
        #[unsafe(no_mangle)]
        pub extern "C" fn $name($($arg: $type),*) -> CK_RV {
            result_to_rv(stringify!($name), || $body)
        }
    };
    (unsafe fn $name:ident ( $($arg:ident : $type:ty),* $(,)?) $body:block) => {
        #[tracing::instrument(level = tracing::Level::TRACE, ret)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name($($arg: $type),*) -> CK_RV {
            result_to_rv(stringify!($name), || $body)
        }
    };
}

/// Set up logging, then build and register the default token registry for
/// the configured slots.
///
/// # Errors
/// `CryptokiAlreadyInitialized` when a provider is already registered.
pub fn initialize(config: &ModuleConfig) -> MResult<()> {
    logging::initialize_logging(config);
    let registry = MechanismRegistry::with_default_table(config.slots.iter().copied())?;
    info!(
        "PKCS#11 mechanism registry initialized for slots {:?}",
        registry.slot_ids()
    );
    register_provider(Box::new(registry))
}

/// [`initialize`] with the settings of the `COSMIAN_PKCS11_*` environment
/// variables, for hosts that load the module without configuring it.
///
/// # Errors
/// `Configuration` when a variable is malformed, otherwise as [`initialize`].
pub fn initialize_from_env() -> MResult<()> {
    initialize(&ModuleConfig::from_env()?)
}

cryptoki_fn!(
    unsafe fn C_GetMechanismList(
        slotID: CK_SLOT_ID,
        pMechanismList: CK_MECHANISM_TYPE_PTR,
        pulCount: CK_ULONG_PTR,
    ) {
        let query = MechanismQuery::new(provider()?);
        let slot = SlotId::new(slotID);
        if pMechanismList.is_null() {
            // *pulCount has no meaning on entry in this mode
            let count = query.list_mechanisms(slot, MechanismListRequest::Count)?;
            if !pulCount.is_null() {
                unsafe { *pulCount = count as CK_ULONG };
            }
            return Ok(());
        }
        if pulCount.is_null() {
            return query
                .list_mechanisms(slot, MechanismListRequest::Unbounded)
                .map(|_| ());
        }
        let count = query.list_mechanisms(slot, MechanismListRequest::Count)?;
        // the declared capacity is only compared, never used to address memory
        let capacity = usize::try_from(unsafe { *pulCount }).unwrap_or(usize::MAX);
        unsafe { *pulCount = count as CK_ULONG };
        if capacity < count {
            return Err(MError::BufferTooSmall { required: count });
        }
        // `MechanismType` is a transparent wrapper of `CK_MECHANISM_TYPE`
        let buffer =
            unsafe { slice::from_raw_parts_mut(pMechanismList.cast::<MechanismType>(), count) };
        query
            .list_mechanisms(slot, MechanismListRequest::Fill(buffer))
            .map(|_| ())
    }
);

cryptoki_fn!(
    unsafe fn C_GetMechanismInfo(
        slotID: CK_SLOT_ID,
        mechType: CK_MECHANISM_TYPE,
        pInfo: CK_MECHANISM_INFO_PTR,
    ) {
        let query = MechanismQuery::new(provider()?);
        let mut capability = MechanismCapability::default();
        let output = (!pInfo.is_null()).then_some(&mut capability);
        query.mechanism_info(SlotId::new(slotID), MechanismType::new(mechType), output)?;
        unsafe { *pInfo = capability.into() };
        Ok(())
    }
);
