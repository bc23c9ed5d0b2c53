use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                format!("{}:{}", $prefix, &self.0.to_string()[..8])
            }

            /// Parse from a string UUID, with or without the display prefix.
            pub fn parse(s: &str) -> Result<Self, crate::error::TypeError> {
                let raw = s
                    .strip_prefix(concat!($prefix, ":"))
                    .unwrap_or(s);
                uuid::Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|e| crate::error::TypeError::InvalidId(e.to_string()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identity of a platform user (donor or organizer).
    UserId,
    "usr"
);

define_id!(
    /// Identity of a fundraising campaign.
    CampaignId,
    "cmp"
);

define_id!(
    /// Identity of a donation record.
    DonationId,
    "don"
);

define_id!(
    /// Identity of a virtual wallet.
    WalletId,
    "wal"
);

define_id!(
    /// Identity of an append-only ledger entry.
    EntryId,
    "ent"
);

define_id!(
    /// Identity of a campaign settlement record.
    SettlementId,
    "set"
);
