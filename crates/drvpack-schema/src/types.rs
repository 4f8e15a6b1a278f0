//! Newtype wrappers and tag enums for manifest fields.
//!
//! String newtypes serialize as plain strings; tag enums serialize as the exact
//! upper-case tokens the installer writes into its manifests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Open-ended file type tag such as `GLX_CLIENT_LIB` or `DOCUMENTATION`.
    ///
    /// New tags appear with every driver branch, so this is deliberately not an enum.
    FileType
);

string_newtype!(
    /// Raw octal permission string, kept as text to preserve leading zeros.
    Mode
);

string_newtype!(
    /// Dotted category name produced by flattening a rule document, e.g. `opengl.native`.
    CategoryName
);

/// File type whose link target the installer never records.
pub const SYSTEMD_UNIT_SYMLINK: &str = "SYSTEMD_UNIT_SYMLINK";

/// Mode the installer writes for entries that are symlinks rather than files.
pub const LINK_SENTINEL_MODE: &str = "0000";

impl FileType {
    pub fn is_systemd_unit_symlink(&self) -> bool {
        self.0 == SYSTEMD_UNIT_SYMLINK
    }
}

impl Mode {
    pub fn is_link_sentinel(&self) -> bool {
        self.0 == LINK_SENTINEL_MODE
    }

    /// The last three octal digits, dropping setuid/setgid/sticky bits.
    pub fn permission_bits(&self) -> &str {
        let start = self.0.len().saturating_sub(3);
        self.0.get(start..).unwrap_or(&self.0)
    }
}

macro_rules! token_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// The manifest token for this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }

            /// Parse an exact manifest token; anything else is `None`.
            pub fn from_token(token: &str) -> Option<Self> {
                match token {
                    $($token => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

token_enum!(
    /// Which ABI a library entry is built for.
    Architecture {
        Native => "NATIVE",
        Compat32 => "COMPAT32",
    }
);

token_enum!(
    /// Thread-local-storage implementation shipped by old driver branches.
    TlsClass {
        Classic => "CLASSIC",
        New => "NEW",
    }
);

token_enum!(
    /// Distinguishes GLVND from non-GLVND builds on branches that ship both.
    GlvndVariant {
        Glvnd => "GLVND",
        NonGlvnd => "NON_GLVND",
    }
);
