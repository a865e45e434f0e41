//! Common macros for implementing ID wrapper types.

/// String-backed identifiers minted locally (uuid v4).
macro_rules! impl_id {
    ($($name:ident),* $(,)?) => {
        $(
            impl $name {
                pub fn new() -> Self {
                    Self(uuid::Uuid::new_v4().to_string())
                }

                pub fn from_string(s: String) -> Self {
                    Self(s)
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }

                pub fn into_inner(self) -> String {
                    self.0
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }
        )*
    };
}

/// Numeric identifiers assigned by the messaging core.
///
/// Zero is reserved by the core to mean "none", so it is not a valid id.
macro_rules! impl_core_id {
    ($($name:ident),* $(,)?) => {
        $(
            impl $name {
                /// Wraps a raw core id, rejecting the reserved zero value.
                pub fn new(raw: u32) -> Option<Self> {
                    if raw == 0 {
                        None
                    } else {
                        Some(Self(raw))
                    }
                }

                pub fn get(&self) -> u32 {
                    self.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<$name> for u32 {
                fn from(id: $name) -> u32 {
                    id.0
                }
            }
        )*
    };
}

pub(crate) use impl_core_id;
pub(crate) use impl_id;
