//! ID type wrappers for type safety.

mod id_macro;

use serde::{Deserialize, Serialize};

use id_macro::{impl_core_id, impl_id};

/// Contact identifier assigned by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactId(u32);

/// Chat identifier assigned by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(u32);

impl_core_id!(ContactId, ChatId);

/// Identifier of one background operation run through the progress bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

/// Identifier of one secure-join handshake session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl_id!(OperationId, SessionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_id_rejects_reserved_zero() {
        assert!(ContactId::new(0).is_none());
        assert_eq!(ContactId::new(42).map(|id| id.get()), Some(42));
    }

    #[test]
    fn minted_ids_are_unique() {
        assert_ne!(OperationId::new(), OperationId::new());
        let id: SessionId = "session-1".into();
        assert_eq!(id.as_str(), "session-1");
    }
}
