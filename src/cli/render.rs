//! Human-readable text for classifier results and outcomes.

use qj_core::ids::ContactId;
use qj_core::progress::UNKNOWN_ERROR;
use qj_core::QrIntent;
use qj_infra::InMemoryContactStore;

/// "Name (addr)", or just the address for unnamed contacts.
pub fn name_n_addr(contacts: &InMemoryContactStore, id: ContactId) -> String {
    match contacts.get(id) {
        Some(record) => match record.name {
            Some(name) if !name.is_empty() => format!("{} ({})", name, record.addr),
            _ => record.addr,
        },
        None => format!("contact #{}", id),
    }
}

/// One line describing what the scanned code is.
pub fn describe_intent(intent: &QrIntent, contacts: &InMemoryContactStore) -> String {
    match intent {
        QrIntent::VerifyContact { contact_id, .. } => format!(
            "Start a verified chat with {}?",
            name_n_addr(contacts, *contact_id)
        ),
        QrIntent::VerifyGroup { invite, .. } => {
            let group = invite
                .group
                .as_ref()
                .map(|g| g.name.as_str())
                .unwrap_or_default();
            format!("Join the group \"{}\"?", group)
        }
        QrIntent::FingerprintWithoutAddress { fingerprint } => format!(
            "No address found in this code.\nFingerprint:\n{}",
            fingerprint
        ),
        QrIntent::FingerprintMismatch { contact_id } => format!(
            "The scanned fingerprint does not match the last one seen for {}.",
            name_n_addr(contacts, *contact_id)
        ),
        QrIntent::Address { contact_id } => {
            format!("Start a chat with {}?", name_n_addr(contacts, *contact_id))
        }
        QrIntent::FingerprintOk { contact_id } => {
            format!("{} verified.", name_n_addr(contacts, *contact_id))
        }
        QrIntent::PlainText { text } => format!("Scanned code contains text:\n{}", text),
        QrIntent::Url { url } => format!("Scanned code contains a URL:\n{}", url),
        QrIntent::AccountCreation { domain, .. } => {
            format!("Create a new account on {}?", domain)
        }
        QrIntent::Error { message } => format!("Error: {}", non_empty_error(message)),
    }
}

/// Failure text shown to the user; never empty.
pub fn non_empty_error(message: &str) -> &str {
    if message.trim().is_empty() {
        UNKNOWN_ERROR
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qj_core::qr::Fingerprint;

    const ALICE_FPR: &str = "0123456789ABCDEF0123456789ABCDEF01234567";

    fn store_with_alice() -> (InMemoryContactStore, ContactId) {
        let store = InMemoryContactStore::new();
        let id = store
            .insert(
                Some("Alice"),
                "alice@example.com",
                Some(Fingerprint::parse(ALICE_FPR).unwrap()),
            )
            .unwrap();
        (store, id)
    }

    #[test]
    fn names_include_the_address() {
        let (store, alice) = store_with_alice();
        assert_eq!(name_n_addr(&store, alice), "Alice (alice@example.com)");
    }

    #[test]
    fn ok_fingerprint_names_the_contact() {
        let (store, alice) = store_with_alice();
        let text = describe_intent(&QrIntent::FingerprintOk { contact_id: alice }, &store);
        assert_eq!(text, "Alice (alice@example.com) verified.");
    }

    #[test]
    fn empty_error_falls_back_to_generic_text() {
        let store = InMemoryContactStore::new();
        assert_eq!(
            describe_intent(&QrIntent::error(""), &store),
            format!("Error: {}", UNKNOWN_ERROR)
        );
        assert_eq!(non_empty_error("timeout"), "timeout");
    }
}
