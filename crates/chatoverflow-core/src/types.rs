//! Identifier newtypes and contract kinds.
//!
//! Every declared type (contract, implementation, connector type) is named by
//! a string identifier.  The newtypes below keep the three namespaces apart at
//! the type level while still allowing `&str` lookups through [`Borrow`].
//! They can be built in `const` context from `&'static str`, which is what the
//! link-time declarations emitted by the attribute macros rely on.

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            /// Creates an identifier from a static string without allocating.
            pub const fn from_static(id: &'static str) -> Self {
                Self(Cow::Borrowed(id))
            }

            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(Cow::Owned(id.into()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&'static str> for $name {
            fn from(id: &'static str) -> Self {
                Self::from_static(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Cow::Owned(id))
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }
    };
}

define_id!(
    /// Identifier of an abstract contract (e.g. `ChatInput`).
    ContractId
);

define_id!(
    /// Identifier of a concrete plugin implementation (e.g. `TwitchChatInputImpl`).
    ImplementationId
);

define_id!(
    /// Identifier of a connector type (e.g. `TwitchConnector`).
    ConnectorTypeId
);

// =============================================================================
// ContractKind
// =============================================================================

/// The closed set of abstract capability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    /// Produces data for the bot (e.g. chat messages).
    Input,
    /// Consumes data from the bot (e.g. sending chat messages).
    Output,
    /// Needs an injected connector to work.
    Requirement,
}

impl ContractKind {
    /// Returns the lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Requirement => "requirement",
        }
    }

    /// Returns `true` for contracts whose implementations must declare a connector.
    pub fn requires_connector(&self) -> bool {
        matches!(self, Self::Requirement)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            "requirement" => Ok(Self::Requirement),
            other => Err(format!(
                "unknown contract kind '{other}', expected one of: input, output, requirement"
            )),
        }
    }
}

// =============================================================================
// ConnectorKey
// =============================================================================

/// Identifies one live connector: its type plus a caller-chosen key
/// (typically an account name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorKey {
    /// The connector type.
    pub connector_type: ConnectorTypeId,
    /// The instance key within that type.
    pub key: String,
}

impl ConnectorKey {
    /// Creates a new connector key.
    pub fn new(connector_type: impl Into<ConnectorTypeId>, key: impl Into<String>) -> Self {
        Self {
            connector_type: connector_type.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ConnectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.connector_type, self.key)
    }
}
