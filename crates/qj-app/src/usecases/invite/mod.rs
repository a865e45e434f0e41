//! Inviter side: rendering and withdrawing secure-join codes.

mod generate;
mod withdraw;

pub use generate::{GenerateInvite, GroupRef};
pub use withdraw::WithdrawInvite;

use qj_core::ports::TokenStoreError;

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("account is not configured")]
    NotConfigured,

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}
