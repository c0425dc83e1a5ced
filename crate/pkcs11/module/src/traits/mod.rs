// Copyright 2024 Cosmian Tech SAS
// Changes made to the original code are
// licensed under the Business Source License version 1.1.
//
//Original code:
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

pub use provider::{provider, register_provider};

use crate::core::{
    mechanism::{MechanismCapability, MechanismType},
    slot::SlotId,
};

mod provider;

/// What the token layer tells the query interface about its slots.
///
/// Implementations are built once and never mutated afterwards: the same
/// instance is queried concurrently from every caller thread.
pub trait MechanismProvider: Send + Sync {
    /// Slot validity oracle.
    fn is_valid_slot(&self, slot: SlotId) -> bool;

    /// Ordered mechanism set of a valid slot.
    ///
    /// Only called for slots accepted by [`MechanismProvider::is_valid_slot`];
    /// implementations may return an empty set for any other slot.
    fn slot_mechanism_set(&self, slot: SlotId) -> &[MechanismType];

    /// Capability record of `mechanism` on `slot`, `None` when the mechanism is unknown.
    fn lookup_capability(
        &self,
        slot: SlotId,
        mechanism: MechanismType,
    ) -> Option<MechanismCapability>;
}

/// Outcome of validating a caller supplied slot id.
pub enum SlotValidity<'a, P: ?Sized> {
    Valid(TokenSlot<'a, P>),
    Invalid(SlotId),
}

impl<'a, P: MechanismProvider + ?Sized> SlotValidity<'a, P> {
    #[must_use]
    pub fn resolve(provider: &'a P, slot: SlotId) -> Self {
        if provider.is_valid_slot(slot) {
            Self::Valid(TokenSlot { provider, slot })
        } else {
            Self::Invalid(slot)
        }
    }
}

/// A slot that passed validation; the only way to reach its mechanism set.
pub struct TokenSlot<'a, P: ?Sized> {
    provider: &'a P,
    slot: SlotId,
}

impl<'a, P: MechanismProvider + ?Sized> TokenSlot<'a, P> {
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.slot
    }

    #[must_use]
    pub fn mechanisms(&self) -> &'a [MechanismType] {
        self.provider.slot_mechanism_set(self.slot)
    }

    #[must_use]
    pub fn resolve_mechanism(&self, mechanism: MechanismType) -> MechanismLookup {
        match self.provider.lookup_capability(self.slot, mechanism) {
            Some(capability) => MechanismLookup::Known(capability),
            None => MechanismLookup::Unknown(mechanism),
        }
    }
}

/// Outcome of looking a mechanism up on a valid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechanismLookup {
    Known(MechanismCapability),
    Unknown(MechanismType),
}
