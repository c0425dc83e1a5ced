//! Read-only mechanism tables, keyed by slot.
//!
//! A [`MechanismRegistry`] is assembled once through a [`MechanismRegistryBuilder`]
//! and exposes no mutating method afterwards. Slots that share a table share
//! the same `Arc<MechanismTable>`.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
    MError, MResult,
    core::{
        mechanism::{KnownMechanism, MechanismCapability, MechanismType},
        slot::SlotId,
    },
    traits::MechanismProvider,
};

/// The mechanisms of a token, in the order they are reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanismTable {
    mechanisms: Vec<MechanismType>,
    capabilities: HashMap<MechanismType, MechanismCapability>,
}

impl MechanismTable {
    /// Build a table from `(mechanism, capability)` entries, keeping their order.
    ///
    /// # Errors
    /// Fails when there is no entry, when a mechanism appears twice or when a
    /// capability has a minimum key size above its maximum key size.
    pub fn new<I>(entries: I) -> MResult<Self>
    where
        I: IntoIterator<Item = (MechanismType, MechanismCapability)>,
    {
        let mut mechanisms = Vec::new();
        let mut capabilities = HashMap::new();
        for (mechanism, capability) in entries {
            if capability.min_key_size > capability.max_key_size {
                return Err(MError::InvalidMechanismTable(format!(
                    "{mechanism}: min key size {} is above max key size {}",
                    capability.min_key_size, capability.max_key_size
                )));
            }
            if capabilities.insert(mechanism, capability).is_some() {
                return Err(MError::InvalidMechanismTable(format!(
                    "{mechanism} is listed twice"
                )));
            }
            mechanisms.push(mechanism);
        }
        let table = Self {
            mechanisms,
            capabilities,
        };
        if table.is_empty() {
            return Err(MError::InvalidMechanismTable(
                "a token supports at least one mechanism".to_owned(),
            ));
        }
        Ok(table)
    }

    /// The table of the default token: every [`KnownMechanism`], in declaration order.
    pub fn default_token() -> MResult<Self> {
        Self::new(
            KnownMechanism::iter().map(|known| (known.mechanism_type(), known.default_capability())),
        )
    }

    #[must_use]
    pub fn mechanisms(&self) -> &[MechanismType] {
        &self.mechanisms
    }

    #[must_use]
    pub fn capability_of(&self, mechanism: MechanismType) -> Option<MechanismCapability> {
        self.capabilities.get(&mechanism).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mechanisms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mechanisms.is_empty()
    }
}

/// Slot to mechanism table mapping, immutable once built.
#[derive(Debug, Clone)]
pub struct MechanismRegistry {
    slots: HashMap<SlotId, Arc<MechanismTable>>,
}

impl MechanismRegistry {
    #[must_use]
    pub fn builder() -> MechanismRegistryBuilder {
        MechanismRegistryBuilder::default()
    }

    /// All `slots` expose the default token table.
    pub fn with_default_table<I>(slots: I) -> MResult<Self>
    where
        I: IntoIterator<Item = SlotId>,
    {
        Self::builder()
            .shared_slots(slots, MechanismTable::default_token()?)
            .build()
    }

    #[must_use]
    pub fn table(&self, slot: SlotId) -> Option<&Arc<MechanismTable>> {
        self.slots.get(&slot)
    }

    /// The registered slots, sorted.
    #[must_use]
    pub fn slot_ids(&self) -> Vec<SlotId> {
        let mut slots = self.slots.keys().copied().collect::<Vec<_>>();
        slots.sort_unstable();
        slots
    }
}

impl MechanismProvider for MechanismRegistry {
    fn is_valid_slot(&self, slot: SlotId) -> bool {
        self.slots.contains_key(&slot)
    }

    fn slot_mechanism_set(&self, slot: SlotId) -> &[MechanismType] {
        self.slots
            .get(&slot)
            .map(|table| table.mechanisms())
            .unwrap_or_default()
    }

    fn lookup_capability(
        &self,
        slot: SlotId,
        mechanism: MechanismType,
    ) -> Option<MechanismCapability> {
        self.slots
            .get(&slot)
            .and_then(|table| table.capability_of(mechanism))
    }
}

#[derive(Debug, Default)]
pub struct MechanismRegistryBuilder {
    slots: Vec<(SlotId, Arc<MechanismTable>)>,
}

impl MechanismRegistryBuilder {
    /// Give `slot` its own table.
    #[must_use]
    pub fn slot(mut self, slot: SlotId, table: MechanismTable) -> Self {
        self.slots.push((slot, Arc::new(table)));
        self
    }

    /// Give every slot of `slots` the same table.
    #[must_use]
    pub fn shared_slots<I>(mut self, slots: I, table: MechanismTable) -> Self
    where
        I: IntoIterator<Item = SlotId>,
    {
        let table = Arc::new(table);
        self.slots
            .extend(slots.into_iter().map(|slot| (slot, Arc::clone(&table))));
        self
    }

    /// # Errors
    /// Fails when no slot was added or when a slot was added twice.
    pub fn build(self) -> MResult<MechanismRegistry> {
        if self.slots.is_empty() {
            return Err(MError::InvalidMechanismTable(
                "the registry has no slot".to_owned(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.slots.len());
        for (slot, _) in &self.slots {
            if !seen.insert(*slot) {
                return Err(MError::InvalidMechanismTable(format!(
                    "slot {slot} is registered twice"
                )));
            }
        }
        let slots = self.slots.into_iter().collect::<HashMap<_, _>>();
        debug!(
            "mechanism registry built for {} slot(s): {:?}",
            slots.len(),
            slots.keys().collect::<Vec<_>>()
        );
        Ok(MechanismRegistry { slots })
    }
}
