//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Server-assigned id of a registered workflow.
    WorkflowId
);
uuid_id!(
    /// Id of an uploaded file bundle.
    UploadId
);
uuid_id!(RoleId);
uuid_id!(UserId);
uuid_id!(
    /// Id of a server-side background task.
    TaskId
);
uuid_id!(
    /// Session id; doubles as the bearer token.
    SessionToken
);

impl RoleId {
    pub const ADMIN: RoleId = RoleId(Uuid::from_u128(0xd5328854_6190_4af9_ad69_4e74b0961ac9));
    pub const REGISTERED_USER: RoleId =
        RoleId(Uuid::from_u128(0x4e8081b6_8aa6_4275_af0c_2fa2da557d28));
    pub const ANONYMOUS_USER: RoleId =
        RoleId(Uuid::from_u128(0xfd8e87bf_515c_4f36_8da6_1a53702ff102));
}

/// Name of a dataset, optionally namespaced as `namespace:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetName(pub String);

impl DatasetName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the namespace separator, or the whole name.
    pub fn local_name(&self) -> &str {
        self.0.rsplit_once(':').map_or(self.0.as_str(), |(_, n)| n)
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for DatasetName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_constants() {
        assert_eq!(
            RoleId::ADMIN.to_string(),
            "d5328854-6190-4af9-ad69-4e74b0961ac9"
        );
        assert_eq!(
            RoleId::ANONYMOUS_USER.to_string(),
            "fd8e87bf-515c-4f36-8da6-1a53702ff102"
        );
    }

    #[test]
    fn test_transparent_serde() {
        let id: WorkflowId = "5b9508a8-bd34-5a1c-acd6-75bb832d2d38".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5b9508a8-bd34-5a1c-acd6-75bb832d2d38\"");
    }

    #[test]
    fn test_dataset_local_name() {
        assert_eq!(DatasetName::new("user:ports").local_name(), "ports");
        assert_eq!(DatasetName::new("ports").local_name(), "ports");
    }
}
