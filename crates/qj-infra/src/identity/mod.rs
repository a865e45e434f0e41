//! Self identity read from the `[self]` config section.

use async_trait::async_trait;
use qj_core::config::SelfConfig;
use qj_core::ports::{SelfIdentity, SelfIdentityPort};
use qj_core::qr::addr::{may_be_valid_addr, normalize_addr};
use qj_core::qr::Fingerprint;
use tracing::warn;

pub struct ConfigSelfIdentity {
    identity: Option<SelfIdentity>,
}

impl ConfigSelfIdentity {
    /// An empty or unusable section means "not configured".
    pub fn new(config: &SelfConfig) -> Self {
        Self {
            identity: Self::resolve(config),
        }
    }

    fn resolve(config: &SelfConfig) -> Option<SelfIdentity> {
        let addr = normalize_addr(&config.addr);
        if addr.is_empty() {
            return None;
        }
        if !may_be_valid_addr(&addr) {
            warn!(%addr, "configured self address looks invalid");
            return None;
        }
        let fingerprint = match Fingerprint::parse(&config.fingerprint) {
            Ok(fingerprint) => fingerprint,
            Err(err) => {
                warn!(error = %err, "configured self fingerprint is unusable");
                return None;
            }
        };
        Some(SelfIdentity {
            addr,
            display_name: (!config.display_name.is_empty()).then(|| config.display_name.clone()),
            fingerprint,
        })
    }
}

#[async_trait]
impl SelfIdentityPort for ConfigSelfIdentity {
    async fn current(&self) -> Option<SelfIdentity> {
        self.identity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_address_means_not_configured() {
        let identity = ConfigSelfIdentity::new(&SelfConfig::default());
        assert!(identity.current().await.is_none());
    }

    #[tokio::test]
    async fn complete_section_yields_identity() {
        let identity = ConfigSelfIdentity::new(&SelfConfig {
            addr: " me@example.org ".to_string(),
            display_name: String::new(),
            fingerprint: "1234567890abcdef1234567890abcdef12345678".to_string(),
        });

        let current = identity.current().await.unwrap();
        assert_eq!(current.addr, "me@example.org");
        assert_eq!(current.display_name, None);
        assert_eq!(
            current.fingerprint.as_str(),
            "1234567890ABCDEF1234567890ABCDEF12345678"
        );
    }
}
