use std::collections::HashMap;
use std::sync::Mutex;

use qj_core::ports::{KnownPeer, PeerResolverPort, ResolveError};
use qj_core::qr::{Fingerprint, GroupInvite, SecureJoinInvite};
use qj_core::{classify, ContactId, QrIntent, QrKind};

const FPR: &str = "1234567890ABCDEF1234567890ABCDEF12345678";

/// Address book that assigns ids in insertion order, like the core does.
struct AddressBook {
    contacts: Mutex<HashMap<String, u32>>,
    keys: Vec<KnownPeer>,
}

impl AddressBook {
    fn new() -> Self {
        Self {
            contacts: Mutex::new(HashMap::new()),
            keys: Vec::new(),
        }
    }
}

impl PeerResolverPort for AddressBook {
    fn lookup_or_add_contact(
        &self,
        _name: Option<&str>,
        addr: &str,
    ) -> Result<ContactId, ResolveError> {
        let mut contacts = self.contacts.lock().unwrap();
        let next = contacts.len() as u32 + 10;
        let raw = *contacts.entry(addr.to_lowercase()).or_insert(next);
        ContactId::new(raw).ok_or_else(|| ResolveError::NotFound(addr.to_string()))
    }

    fn lookup_peer_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<KnownPeer>, ResolveError> {
        Ok(self
            .keys
            .iter()
            .find(|peer| &peer.fingerprint == fingerprint)
            .cloned())
    }
}

#[test]
fn contact_invitation_resolves_to_verify_contact() {
    let book = AddressBook::new();
    let alice = book.lookup_or_add_contact(Some("Alice"), "alice@example.com").unwrap();

    let intent = classify(
        &format!("OPENPGP4FPR:{FPR}#a=alice@example.com&n=Alice"),
        &book,
    );

    assert_eq!(intent.kind(), QrKind::VerifyContact);
    assert_eq!(intent.subject_id(), Some(alice));
    match intent {
        QrIntent::VerifyContact { invite, .. } => {
            assert_eq!(invite.addr, "alice@example.com");
            assert_eq!(invite.name.as_deref(), Some("Alice"));
            assert!(!invite.has_tokens());
        }
        other => panic!("unexpected intent {other:?}"),
    }
}

#[test]
fn empty_string_is_error() {
    let intent = classify("", &AddressBook::new());

    assert_eq!(intent.kind(), QrKind::Error);
    assert_eq!(intent.subject_id(), None);
    assert!(intent.display_text().is_some_and(|text| !text.is_empty()));
}

#[test]
fn classification_is_deterministic() {
    let book = AddressBook::new();
    let inputs = [
        format!("OPENPGP4FPR:{FPR}#a=alice@example.com&n=Alice&i=I1&s=S1"),
        format!("OPENPGP4FPR:{FPR}"),
        "mailto:bob@example.org".to_string(),
        "https://example.com/x".to_string(),
        "DCACCOUNT:https://chat.example.org/new".to_string(),
        "hello".to_string(),
        "OPENPGP4FPR:12".to_string(),
        String::from_utf8_lossy(&[0xff, 0x00, 0xfe, 0x41]).into_owned(),
    ];

    for input in &inputs {
        let first = classify(input, &book);
        let second = classify(input, &book);
        assert_eq!(first.kind(), second.kind(), "input {input:?}");
        assert_eq!(first.subject_id(), second.subject_id(), "input {input:?}");
        assert_eq!(first.display_text(), second.display_text(), "input {input:?}");
    }
}

#[test]
fn generated_invitations_classify_as_verify() {
    let book = AddressBook::new();
    let contact = SecureJoinInvite {
        fingerprint: Fingerprint::parse(FPR).unwrap(),
        addr: "me+chat@example.org".to_string(),
        name: Some("Me & You".to_string()),
        invitenumber: Some("inv-token".to_string()),
        auth: Some("auth-token".to_string()),
        group: None,
    };
    let group = SecureJoinInvite {
        group: Some(GroupInvite {
            id: "Grp.1".to_string(),
            name: "Friends & Family".to_string(),
        }),
        ..contact.clone()
    };

    match classify(&contact.to_qr_text(), &book) {
        QrIntent::VerifyContact { invite, .. } => assert_eq!(invite, contact),
        other => panic!("unexpected intent {other:?}"),
    }
    match classify(&group.to_qr_text(), &book) {
        QrIntent::VerifyGroup { invite, .. } => {
            assert_eq!(invite.group, group.group);
            assert_eq!(invite.auth.as_deref(), Some("auth-token"));
        }
        other => panic!("unexpected intent {other:?}"),
    }
}

#[test]
fn binary_garbage_never_panics() {
    let book = AddressBook::new();
    for bytes in [
        vec![0u8; 16],
        vec![0xf0, 0x9f, 0x92, 0x96, 0x23, 0x61, 0x3d],
        b"OPENPGP4FPR:\xff\xfe#a=%".to_vec(),
    ] {
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let _ = classify(&text, &book);
    }
}
