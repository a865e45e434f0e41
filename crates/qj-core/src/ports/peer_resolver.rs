//! Peer resolver port
//!
//! Looks up contacts referenced by a scanned code. Implementations may create
//! a local contact for an unknown address; they never contact a server.

use crate::ids::ContactId;
use crate::qr::Fingerprint;

use super::errors::ResolveError;

/// A peer whose key is already known locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPeer {
    pub contact_id: ContactId,
    pub addr: String,
    pub fingerprint: Fingerprint,
}

pub trait PeerResolverPort: Send + Sync {
    /// Returns the contact for `addr`, creating it if needed.
    fn lookup_or_add_contact(
        &self,
        name: Option<&str>,
        addr: &str,
    ) -> Result<ContactId, ResolveError>;

    /// Returns the peer whose key has `fingerprint`, if any.
    fn lookup_peer_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<KnownPeer>, ResolveError>;
}
