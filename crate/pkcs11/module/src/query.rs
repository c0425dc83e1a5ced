//! `C_GetMechanismList` and `C_GetMechanismInfo`, on safe types.

use tracing::{debug, trace};

use crate::{
    MError, MResult,
    core::{
        mechanism::{MechanismCapability, MechanismType},
        slot::SlotId,
    },
    traits::{MechanismLookup, MechanismProvider, SlotValidity},
};

/// How the caller wants the mechanism list.
#[derive(Debug)]
pub enum MechanismListRequest<'a> {
    /// No buffer: only the required capacity is reported.
    Count,
    /// Copy the list into the buffer; its length is the declared capacity.
    Fill(&'a mut [MechanismType]),
    /// A buffer was supplied without any capacity.
    Unbounded,
}

/// Query surface over a [`MechanismProvider`].
///
/// Holds a shared reference only: any number of queries may run in parallel
/// over the same provider.
pub struct MechanismQuery<'a, P: ?Sized> {
    provider: &'a P,
}

impl<P: ?Sized> Clone for MechanismQuery<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for MechanismQuery<'_, P> {}

impl<'a, P: MechanismProvider + ?Sized> MechanismQuery<'a, P> {
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// List the mechanisms of `slot`.
    ///
    /// Returns the number of mechanisms of the slot. With
    /// [`MechanismListRequest::Fill`] the first `n` elements of the buffer hold
    /// them, in the provider order.
    ///
    /// # Errors
    /// - `SlotIdInvalid` when the slot is unknown, whatever the request
    /// - `ArgumentsBad` for [`MechanismListRequest::Unbounded`]
    /// - `BufferTooSmall` carrying the required capacity; the buffer is left untouched
    pub fn list_mechanisms(&self, slot: SlotId, request: MechanismListRequest<'_>) -> MResult<usize> {
        let token_slot = match SlotValidity::resolve(self.provider, slot) {
            SlotValidity::Valid(token_slot) => token_slot,
            SlotValidity::Invalid(slot) => return Err(MError::SlotIdInvalid(slot.value())),
        };
        let mechanisms = token_slot.mechanisms();
        let count = mechanisms.len();
        match request {
            MechanismListRequest::Count => {
                trace!("slot {slot}: {count} mechanisms");
            }
            MechanismListRequest::Unbounded => return Err(MError::ArgumentsBad),
            MechanismListRequest::Fill(buffer) => {
                if buffer.len() < count {
                    debug!(
                        "slot {slot}: buffer of {} elements cannot hold {count} mechanisms",
                        buffer.len()
                    );
                    return Err(MError::BufferTooSmall { required: count });
                }
                buffer[..count].copy_from_slice(mechanisms);
                trace!("slot {slot}: returned {count} mechanisms");
            }
        }
        Ok(count)
    }

    /// Copy the capability of `mechanism` on `slot` into `output`.
    ///
    /// # Errors
    /// Checked in this order:
    /// - `ArgumentsBad` when `output` is `None`
    /// - `SlotIdInvalid` when the slot is unknown
    /// - `MechanismInvalid` when the slot does not know the mechanism
    pub fn mechanism_info(
        &self,
        slot: SlotId,
        mechanism: MechanismType,
        output: Option<&mut MechanismCapability>,
    ) -> MResult<()> {
        let Some(output) = output else {
            return Err(MError::ArgumentsBad);
        };
        let token_slot = match SlotValidity::resolve(self.provider, slot) {
            SlotValidity::Valid(token_slot) => token_slot,
            SlotValidity::Invalid(slot) => return Err(MError::SlotIdInvalid(slot.value())),
        };
        match token_slot.resolve_mechanism(mechanism) {
            MechanismLookup::Known(capability) => {
                trace!("slot {slot}: {mechanism} -> {capability:?}");
                *output = capability;
                Ok(())
            }
            MechanismLookup::Unknown(mechanism) => {
                Err(MError::MechanismInvalid(mechanism.value()))
            }
        }
    }
}
