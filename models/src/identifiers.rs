// models/src/identifiers.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::HospitalError;

/// Declares a UUID-backed identifier type for one entity kind. Keeping the
/// kinds apart at the type level means a bed id can never be passed where a
/// room id is expected.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Human-readable entity kind used in error messages.
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = HospitalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| HospitalError::InvalidData(format!("'{}' is not a valid {} id", s, $label)))
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(WardId, "ward");
entity_id!(RoomId, "room");
entity_id!(BedId, "bed");
entity_id!(AllocationId, "bed allocation");
entity_id!(AppointmentId, "appointment");
entity_id!(PaymentId, "payment");
entity_id!(UserId, "user");
entity_id!(EmergencyCaseId, "emergency case");
