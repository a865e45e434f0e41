//! Maps a scanned code onto a [`QrIntent`].

use tracing::{debug, warn};

use super::addr::addr_equals;
use super::grammar::{self, FingerprintCode, ScannedCode};
use super::{QrIntent, SecureJoinInvite};
use crate::ports::{PeerResolverPort, ResolveError};

/// Classifies `raw` into exactly one intent.
///
/// Never fails: malformed input and resolver errors both come back as
/// [`QrIntent::Error`] carrying a user-facing message. The only side effect
/// is whatever `resolver` does to look up or create local contacts.
///
/// 解析失败和联系人解析失败都会返回 `QrIntent::Error`，不会 panic。
pub fn classify(raw: &str, resolver: &dyn PeerResolverPort) -> QrIntent {
    let scanned = match grammar::parse(raw) {
        Ok(scanned) => scanned,
        Err(err) => {
            debug!(error = %err, "rejected scanned code");
            return QrIntent::error(err.to_string());
        }
    };

    let intent = match resolve(scanned, resolver) {
        Ok(intent) => intent,
        Err(err) => {
            warn!(error = %err, "failed to resolve peer referenced by scanned code");
            QrIntent::error(err.to_string())
        }
    };
    debug!(kind = ?intent.kind(), subject = ?intent.subject_id(), "classified scanned code");
    intent
}

fn resolve(scanned: ScannedCode, resolver: &dyn PeerResolverPort) -> Result<QrIntent, ResolveError> {
    let intent = match scanned {
        ScannedCode::Text(text) => QrIntent::PlainText { text },
        ScannedCode::Url(url) => QrIntent::Url { url },
        ScannedCode::Account { url, domain } => QrIntent::AccountCreation { domain, url },
        ScannedCode::Address { addr, name } => QrIntent::Address {
            contact_id: resolver.lookup_or_add_contact(name.as_deref(), &addr)?,
        },
        ScannedCode::Fingerprint(code) => resolve_fingerprint(code, resolver)?,
    };
    Ok(intent)
}

fn resolve_fingerprint(
    code: FingerprintCode,
    resolver: &dyn PeerResolverPort,
) -> Result<QrIntent, ResolveError> {
    let known = if code.has_invite_tokens() {
        // An invitation is always offered, whatever we know about the key.
        None
    } else {
        resolver.lookup_peer_by_fingerprint(&code.fingerprint)?
    };

    let Some(addr) = code.addr.clone() else {
        return Ok(match known {
            Some(peer) => QrIntent::FingerprintOk {
                contact_id: peer.contact_id,
            },
            None => QrIntent::FingerprintWithoutAddress {
                fingerprint: code.fingerprint.formatted(),
            },
        });
    };

    match known {
        Some(peer) if addr_equals(&peer.addr, &addr) => Ok(QrIntent::FingerprintOk {
            contact_id: peer.contact_id,
        }),
        Some(_) => Ok(QrIntent::FingerprintMismatch {
            contact_id: resolver.lookup_or_add_contact(code.name.as_deref(), &addr)?,
        }),
        None => {
            let contact_id = resolver.lookup_or_add_contact(code.name.as_deref(), &addr)?;
            let invite = SecureJoinInvite {
                fingerprint: code.fingerprint,
                addr,
                name: code.name,
                invitenumber: code.invitenumber,
                auth: code.auth,
                group: code.group,
            };
            Ok(if invite.is_group() {
                QrIntent::VerifyGroup { contact_id, invite }
            } else {
                QrIntent::VerifyContact { contact_id, invite }
            })
        }
    }
}
