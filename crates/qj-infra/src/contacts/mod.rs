//! In-memory contact book.
//!
//! Stands in for the core's contact database: addresses map to contact ids,
//! some contacts have a verified key fingerprint.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use qj_core::config::ContactEntry;
use qj_core::ids::ContactId;
use qj_core::ports::{KnownPeer, PeerResolverPort, ResolveError};
use qj_core::qr::addr::{addr_equals, may_be_valid_addr, normalize_addr};
use qj_core::qr::Fingerprint;
use tracing::{debug, info};

/// Ids up to this value are reserved for special contacts (self, device).
const LAST_SPECIAL_CONTACT_ID: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: ContactId,
    pub addr: String,
    pub name: Option<String>,
    pub fingerprint: Option<Fingerprint>,
}

#[derive(Default)]
struct ContactTable {
    records: Vec<ContactRecord>,
}

#[derive(Default)]
pub struct InMemoryContactStore {
    table: RwLock<ContactTable>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from `[[contacts]]` entries.
    pub fn from_config(entries: &[ContactEntry]) -> Result<Self> {
        let store = Self::new();
        for entry in entries {
            let fingerprint = entry
                .fingerprint
                .as_deref()
                .map(Fingerprint::parse)
                .transpose()
                .with_context(|| format!("invalid fingerprint for contact {}", entry.addr))?;
            let name = (!entry.name.is_empty()).then(|| entry.name.clone());
            store
                .insert(name.as_deref(), &entry.addr, fingerprint)
                .with_context(|| format!("failed to add contact {}", entry.addr))?;
        }
        Ok(store)
    }

    /// Adds or updates a contact, returning its id.
    pub fn insert(
        &self,
        name: Option<&str>,
        addr: &str,
        fingerprint: Option<Fingerprint>,
    ) -> Result<ContactId, ResolveError> {
        let addr = normalize_addr(addr);
        if !may_be_valid_addr(&addr) {
            return Err(ResolveError::NotFound(addr));
        }

        let mut table = self.write();
        if let Some(record) = table.records.iter_mut().find(|r| addr_equals(&r.addr, &addr)) {
            if record.name.is_none() {
                record.name = name.map(str::to_string);
            }
            if fingerprint.is_some() {
                record.fingerprint = fingerprint;
            }
            return Ok(record.id);
        }

        let raw = LAST_SPECIAL_CONTACT_ID + 1 + table.records.len() as u32;
        let id = ContactId::new(raw)
            .ok_or_else(|| ResolveError::Storage(format!("invalid contact id {raw}")))?;
        info!(contact_id = %id, %addr, "contact added");
        table.records.push(ContactRecord {
            id,
            addr,
            name: name.map(str::to_string),
            fingerprint,
        });
        Ok(id)
    }

    pub fn get(&self, id: ContactId) -> Option<ContactRecord> {
        self.read().records.iter().find(|r| r.id == id).cloned()
    }

    /// Name if known, address otherwise.
    pub fn display_name(&self, id: ContactId) -> Option<String> {
        self.get(id).map(|record| record.name.unwrap_or(record.addr))
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, ContactTable> {
        self.table.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContactTable> {
        self.table.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PeerResolverPort for InMemoryContactStore {
    fn lookup_or_add_contact(
        &self,
        name: Option<&str>,
        addr: &str,
    ) -> Result<ContactId, ResolveError> {
        self.insert(name, addr, None)
    }

    fn lookup_peer_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<KnownPeer>, ResolveError> {
        let peer = self
            .read()
            .records
            .iter()
            .find(|r| r.fingerprint.as_ref() == Some(fingerprint))
            .map(|r| KnownPeer {
                contact_id: r.id,
                addr: r.addr.clone(),
                fingerprint: fingerprint.clone(),
            });
        debug!(found = peer.is_some(), "fingerprint lookup");
        Ok(peer)
    }
}
