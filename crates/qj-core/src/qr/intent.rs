//! Typed result of classifying one scanned code.

use serde::{Deserialize, Serialize};

use super::SecureJoinInvite;
use crate::ids::ContactId;

/// Discriminant of [`QrIntent`], handy for logging and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QrKind {
    VerifyContact,
    VerifyGroup,
    FingerprintWithoutAddress,
    FingerprintMismatch,
    Address,
    FingerprintOk,
    PlainText,
    Url,
    AccountCreation,
    Error,
}

/// What the driver can do with a scanned code.
///
/// Created fresh per scan, never persisted. Variants that reference a peer
/// carry the resolved contact id; the others carry display text only.
///
/// 每次扫码生成一次，只读，不持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QrIntent {
    /// Ask the user whether to run the contact handshake.
    VerifyContact {
        contact_id: ContactId,
        invite: SecureJoinInvite,
    },
    /// Ask the user whether to join the group.
    VerifyGroup {
        contact_id: ContactId,
        invite: SecureJoinInvite,
    },
    /// Bare fingerprint nobody local is known under.
    FingerprintWithoutAddress { fingerprint: String },
    /// The fingerprint does not belong to the address in the code.
    FingerprintMismatch { contact_id: ContactId },
    /// Plain address, offer to start a chat.
    Address { contact_id: ContactId },
    /// Fingerprint matches a known peer.
    FingerprintOk { contact_id: ContactId },
    PlainText { text: String },
    Url { url: String },
    /// Account provisioning link; `domain` is what the user sees.
    AccountCreation { domain: String, url: String },
    Error { message: String },
}

impl QrIntent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> QrKind {
        match self {
            Self::VerifyContact { .. } => QrKind::VerifyContact,
            Self::VerifyGroup { .. } => QrKind::VerifyGroup,
            Self::FingerprintWithoutAddress { .. } => QrKind::FingerprintWithoutAddress,
            Self::FingerprintMismatch { .. } => QrKind::FingerprintMismatch,
            Self::Address { .. } => QrKind::Address,
            Self::FingerprintOk { .. } => QrKind::FingerprintOk,
            Self::PlainText { .. } => QrKind::PlainText,
            Self::Url { .. } => QrKind::Url,
            Self::AccountCreation { .. } => QrKind::AccountCreation,
            Self::Error { .. } => QrKind::Error,
        }
    }

    /// Contact referenced by the code, present iff the kind needs a peer.
    pub fn subject_id(&self) -> Option<ContactId> {
        match self {
            Self::VerifyContact { contact_id, .. }
            | Self::VerifyGroup { contact_id, .. }
            | Self::FingerprintMismatch { contact_id }
            | Self::Address { contact_id }
            | Self::FingerprintOk { contact_id } => Some(*contact_id),
            _ => None,
        }
    }

    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::VerifyGroup { invite, .. } => invite.group.as_ref().map(|g| g.name.as_str()),
            Self::FingerprintWithoutAddress { fingerprint } => Some(fingerprint),
            Self::PlainText { text } => Some(text),
            Self::Url { url } => Some(url),
            Self::AccountCreation { domain, .. } => Some(domain),
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// True for the two kinds that can start a handshake.
    pub fn is_verify(&self) -> bool {
        matches!(self, Self::VerifyContact { .. } | Self::VerifyGroup { .. })
    }
}
