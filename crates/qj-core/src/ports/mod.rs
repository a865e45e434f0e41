//! Port interfaces for the application layer
//!
//! Ports define the contract between the use cases and the adapters that
//! talk to the messaging core and local stores.

pub mod messaging_core;
pub mod errors;
pub mod invite;
mod peer_resolver;

pub use messaging_core::{
    AccountCorePort, CoreEvent, CoreEventHandler, ImexMode, OngoingProcessPort,
    SecureJoinCorePort,
};
pub use errors::{CoreError, CoreErrorKind, ResolveError, TokenStoreError};
pub use invite::{InviteScope, InviteTokenStorePort, InviteTokens, SelfIdentity, SelfIdentityPort};
pub use peer_resolver::{KnownPeer, PeerResolverPort};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_ports_are_object_safe() {
        fn assert_object_safe(
            _: Option<&dyn PeerResolverPort>,
            _: Option<&dyn SecureJoinCorePort>,
            _: Option<&dyn AccountCorePort>,
            _: Option<&dyn OngoingProcessPort>,
            _: Option<&dyn CoreEventHandler>,
            _: Option<&dyn InviteTokenStorePort>,
            _: Option<&dyn SelfIdentityPort>,
        ) {
        }
        assert_object_safe(None, None, None, None, None, None, None);
    }

    #[test]
    fn invite_scope_display() {
        assert_eq!(InviteScope::Contact.to_string(), "contact");
        assert_eq!(InviteScope::Group("g1".into()).to_string(), "group:g1");
    }
}
