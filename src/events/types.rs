//! Account event types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Timestamp format used by the provider (no zone, always UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Defines a string-backed enum that keeps unrecognised values
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $(
                #[doc = concat!("`", $wire, "`")]
                $variant,
            )+
            /// A value this crate does not know about
            Other(String),
        }

        impl $name {
            /// Wire representation
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Action recorded by an event
    EventAction {
        AccountUpdate => "account_update",
        BackupsEnable => "backups_enable",
        BackupsCancel => "backups_cancel",
        BackupsRestore => "backups_restore",
        DiskCreate => "disk_create",
        DiskDelete => "disk_delete",
        DiskDuplicate => "disk_duplicate",
        DiskImagize => "disk_imagize",
        DiskResize => "disk_resize",
        DomainCreate => "domain_create",
        DomainDelete => "domain_delete",
        ImageDelete => "image_delete",
        LinodeAddIp => "linode_addip",
        LinodeBoot => "linode_boot",
        LinodeClone => "linode_clone",
        LinodeCreate => "linode_create",
        LinodeDelete => "linode_delete",
        LinodeDeleteIp => "linode_deleteip",
        LinodeMigrate => "linode_migrate",
        LinodeMutate => "linode_mutate",
        LinodeReboot => "linode_reboot",
        LinodeRebuild => "linode_rebuild",
        LinodeResize => "linode_resize",
        LinodeShutdown => "linode_shutdown",
        LinodeSnapshot => "linode_snapshot",
        NodebalancerCreate => "nodebalancer_create",
        NodebalancerDelete => "nodebalancer_delete",
        PasswordReset => "password_reset",
        StackscriptCreate => "stackscript_create",
        StackscriptDelete => "stackscript_delete",
        TicketCreate => "ticket_create",
        VolumeAttach => "volume_attach",
        VolumeClone => "volume_clone",
        VolumeCreate => "volume_create",
        VolumeDelete => "volume_delete",
        VolumeDetach => "volume_detach",
        VolumeResize => "volume_resize",
    }
}

string_enum! {
    /// Kind of entity an event refers to
    EntityType {
        Account => "account",
        Backups => "backups",
        Database => "database",
        Disk => "disk",
        Domain => "domain",
        Firewall => "firewall",
        Image => "image",
        Linode => "linode",
        Lke => "lkecluster",
        Longview => "longview",
        Nodebalancer => "nodebalancer",
        Stackscript => "stackscript",
        Ticket => "ticket",
        Volume => "volume",
    }
}

/// Lifecycle status of an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Queued, not yet running
    Scheduled,
    /// In progress
    Started,
    /// Completed successfully
    Finished,
    /// Completed with an error
    Failed,
    /// Informational; never changes
    Notification,
    /// Missing or unrecognised status
    #[default]
    #[serde(other)]
    Unknown,
}

impl EventStatus {
    /// Check if the event can no longer change
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scheduled => "scheduled",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Notification => "notification",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Entity identifier; most entities use integers, some use strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Numeric id
    Int(i64),
    /// String id (LKE versions, object storage clusters)
    Str(String),
}

impl EntityId {
    /// Compare by textual form, so `123` matches `"123"`
    pub fn same_as(&self, other: &EntityId) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        i64::try_from(id).map_or_else(|_| Self::Str(id.to_string()), Self::Int)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Entity an event refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntity {
    /// Entity id
    pub id: EntityId,
    /// Entity kind
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Display label
    #[serde(default)]
    pub label: Option<String>,
    /// API path of the entity
    #[serde(default)]
    pub url: Option<String>,
}

/// An action taken on the account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event id
    pub id: u64,
    /// What happened
    pub action: EventAction,
    /// Progress of the action
    #[serde(default)]
    pub status: EventStatus,
    /// Primary entity the action ran on
    #[serde(default)]
    pub entity: Option<EventEntity>,
    /// Second entity involved, such as the disk of a resize
    #[serde(default)]
    pub secondary_entity: Option<EventEntity>,
    /// Creation time; `None` when absent or unparseable
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created: Option<DateTime<Utc>>,
    /// Completion percentage reported by the provider
    #[serde(default)]
    pub percent_complete: Option<u8>,
    /// Estimated time left, in whatever shape the provider sends
    #[serde(default)]
    pub time_remaining: Option<serde_json::Value>,
    /// Transfer rate of long-running actions
    #[serde(default)]
    pub rate: Option<String>,
    /// User that triggered the action
    #[serde(default)]
    pub username: Option<String>,
    /// Marked read
    #[serde(default)]
    pub read: bool,
    /// Marked seen
    #[serde(default)]
    pub seen: bool,
    /// Free-form provider message
    #[serde(default)]
    pub message: Option<String>,
}

/// Parse a provider timestamp, accepting RFC 3339 as well
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
