//! Secure-join invitation payload carried by `OPENPGP4FPR:` codes.

use serde::{Deserialize, Serialize};

use super::Fingerprint;

/// URI scheme shared by invitations and plain fingerprint codes.
pub const OPENPGP4FPR_SCHEME: &str = "OPENPGP4FPR:";

/// Group part of a group invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInvite {
    pub id: String,
    pub name: String,
}

/// Everything a joiner needs to run the handshake against the inviter.
///
/// `invitenumber` lets the joiner start the handshake, `auth` proves the
/// joiner actually saw the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureJoinInvite {
    pub fingerprint: Fingerprint,
    pub addr: String,
    pub name: Option<String>,
    pub invitenumber: Option<String>,
    pub auth: Option<String>,
    pub group: Option<GroupInvite>,
}

impl SecureJoinInvite {
    pub fn is_group(&self) -> bool {
        self.group.is_some()
    }

    /// Both tokens are present, so the inviter can be asked to verify us.
    pub fn has_tokens(&self) -> bool {
        self.invitenumber.is_some() && self.auth.is_some()
    }

    /// Renders the code text that goes into the QR image.
    ///
    /// Contact invitations use `a=n=i=s=`, group invitations `a=g=x=i=s=`.
    pub fn to_qr_text(&self) -> String {
        let mut text = format!(
            "{}{}#a={}",
            OPENPGP4FPR_SCHEME,
            self.fingerprint,
            urlencoding::encode(&self.addr)
        );
        match &self.group {
            Some(group) => {
                text.push_str(&format!(
                    "&g={}&x={}",
                    urlencoding::encode(&group.name),
                    urlencoding::encode(&group.id)
                ));
            }
            None => {
                if let Some(name) = &self.name {
                    text.push_str(&format!("&n={}", urlencoding::encode(name)));
                }
            }
        }
        if let (Some(invitenumber), Some(auth)) = (&self.invitenumber, &self.auth) {
            text.push_str(&format!("&i={invitenumber}&s={auth}"));
        }
        text
    }
}
