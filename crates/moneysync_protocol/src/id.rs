//! Record identities.

use std::fmt;

/// Identity of a synchronizable record.
///
/// Records created offline carry a `Pending` placeholder until the server
/// acknowledges them and issues a `Confirmed` id. A pending id is never sent
/// to the server as a key; its presence means "create".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    /// Client-assigned placeholder, unique within the local store.
    Pending(u64),
    /// Server-issued identity.
    Confirmed(u64),
}

impl RecordId {
    /// Returns the server identity, if the record has one.
    pub fn server_id(&self) -> Option<u64> {
        match self {
            RecordId::Confirmed(id) => Some(*id),
            RecordId::Pending(_) => None,
        }
    }

    /// Returns true for placeholder identities.
    pub fn is_pending(&self) -> bool {
        matches!(self, RecordId::Pending(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Pending(n) => write!(f, "pending:{}", n),
            RecordId::Confirmed(n) => write!(f, "{}", n),
        }
    }
}
