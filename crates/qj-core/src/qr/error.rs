use thiserror::Error;

/// Reasons a scanned code cannot be turned into a usable shape.
///
/// The display strings are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrParseError {
    #[error("Empty QR code.")]
    Empty,

    #[error("Bad e-mail address.")]
    BadAddress,

    #[error("Bad fingerprint length in QR code.")]
    BadFingerprintLength,

    #[error("Bad encoding in QR code parameter '{0}'.")]
    BadEncoding(char),

    #[error("Bad account link: {0}")]
    BadAccountLink(String),
}
