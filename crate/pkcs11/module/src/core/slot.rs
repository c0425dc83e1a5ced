use std::fmt;

use pkcs11_sys::CK_SLOT_ID;

/// A provider assigned slot identifier, as received from the caller.
///
/// Holding a `SlotId` says nothing about its validity; see
/// [`crate::traits::SlotValidity::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(CK_SLOT_ID);

impl SlotId {
    #[must_use]
    pub const fn new(slot_id: CK_SLOT_ID) -> Self {
        Self(slot_id)
    }

    #[must_use]
    pub const fn value(self) -> CK_SLOT_ID {
        self.0
    }
}

impl From<CK_SLOT_ID> for SlotId {
    fn from(slot_id: CK_SLOT_ID) -> Self {
        Self(slot_id)
    }
}

impl From<SlotId> for CK_SLOT_ID {
    fn from(slot_id: SlotId) -> Self {
        slot_id.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
