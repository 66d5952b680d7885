//! Strongly-typed identifiers for domain entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Party references (registries live outside the hub)
define_id!(CustomerId, "CUS");
define_id!(AssetId, "AST");

// Coverage
define_id!(PlanId, "PLN");

// Claims and repairs
define_id!(ClaimId, "CLM");
define_id!(AssessmentId, "TAS");
define_id!(RepairOrderId, "RPO");

// Billing
define_id!(PaymentId, "PAY");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_id_display() {
        let id = PlanId::new();
        assert!(id.to_string().starts_with("PLN-"));
    }

    #[test]
    fn test_id_parsing_accepts_prefixed_and_bare_forms() {
        let original = RepairOrderId::new_v7();
        let prefixed: RepairOrderId = original.to_string().parse().unwrap();
        let bare: RepairOrderId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, prefixed);
        assert_eq!(original, bare);
    }

    #[test]
    fn test_ids_of_different_kinds_do_not_share_prefixes() {
        assert_ne!(ClaimId::prefix(), AssessmentId::prefix());
        assert_ne!(PaymentId::prefix(), PlanId::prefix());
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let claim_id = ClaimId::from(uuid);
        let back: Uuid = claim_id.into();
        assert_eq!(uuid, back);
    }
}
