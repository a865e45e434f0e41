use serde::{Deserialize, Serialize};

use super::Permille;
use crate::ids::ContactId;

/// Inviter-side milestones of a secure-join run by somebody who scanned
/// one of our codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviterStage {
    /// A joiner presented a valid invitenumber.
    Requested,
    /// The joiner's key and auth token checked out.
    Verified,
    /// The joiner confirmed it was added to the group.
    MemberAdded,
    Done,
    Failed,
}

impl InviterStage {
    /// Maps the core's inviter permille onto a milestone.
    ///
    /// Intermediate values the core does not define yield `None`.
    pub fn from_permille(permille: Permille) -> Option<Self> {
        match permille.get() {
            0 => Some(Self::Failed),
            300 => Some(Self::Requested),
            600 => Some(Self::Verified),
            800 => Some(Self::MemberAdded),
            1000 => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviterEvent {
    pub contact_id: ContactId,
    pub stage: InviterStage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_inviter_stages() {
        let stage = |v| InviterStage::from_permille(Permille::new(v).unwrap());
        assert_eq!(stage(300), Some(InviterStage::Requested));
        assert_eq!(stage(600), Some(InviterStage::Verified));
        assert_eq!(stage(800), Some(InviterStage::MemberAdded));
        assert_eq!(stage(1000), Some(InviterStage::Done));
        assert_eq!(stage(0), Some(InviterStage::Failed));
        assert_eq!(stage(450), None);
    }
}
