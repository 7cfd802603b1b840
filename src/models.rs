//! FlashBlade REST payload types used by the usage collector
//!
//! Field names follow the JSON bodies of the `file-systems`, `usage/groups`
//! and `usage/users` endpoints. Every field tolerates being absent or `null`
//! and falls back to its default, so a sparse response still decodes.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Decode `null` as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pagination metadata returned with every list endpoint
///
/// Only the first page is ever requested; the continuation token is kept
/// so callers can tell a truncated listing apart from a complete one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationData {
    #[serde(deserialize_with = "null_as_default")]
    pub continuation_token: String,
    #[serde(rename = "total_item_count", deserialize_with = "null_as_default")]
    pub total: i64,
}

impl PaginationData {
    /// Whether the server reported more pages after this one
    pub fn has_more(&self) -> bool {
        !self.continuation_token.is_empty()
    }
}

/// Space accounting attached to a file system
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesystemSpace {
    #[serde(rename = "virtual", deserialize_with = "null_as_default")]
    pub virtual_bytes: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub snapshots: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_physical: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub data_reduction: f64,
}

/// One file system as returned by the `file-systems` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesystemsItem {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Creation time in milliseconds since the epoch
    #[serde(deserialize_with = "null_as_default")]
    pub created: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub destroyed: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub provisioned: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub hard_limit_enabled: bool,
    pub space: Option<FilesystemSpace>,
}

impl FilesystemsItem {
    /// Convenience constructor for a file system known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Body of the `file-systems` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesystemsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<FilesystemsItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub pagination_info: PaginationData,
}

/// Identifier of a group or user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NameID {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// Quota and usage of one group within one file system
///
/// `usage` may exceed `quota`; a quota of 0 means none is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UsageItemGroup {
    /// Role label (`name`, `id`, ...) to file system identifier
    #[serde(deserialize_with = "null_as_default")]
    pub file_system: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub file_system_default_quota: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub group: NameID,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub quota: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub usage: i64,
}

/// Quota and usage of one user within one file system
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UsageItemUser {
    #[serde(deserialize_with = "null_as_default")]
    pub file_system: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub file_system_default_quota: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub user: NameID,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub quota: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub usage: i64,
}

/// First page of group usage for a single file system
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UsageGroup {
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<UsageItemGroup>,
    #[serde(deserialize_with = "null_as_default")]
    pub pagination_info: PaginationData,
}

/// First page of user usage for a single file system
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UsageUser {
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<UsageItemUser>,
    #[serde(deserialize_with = "null_as_default")]
    pub pagination_info: PaginationData,
}

/// Aggregated usage of every file system that passed the filter
///
/// `file_systems[i]`, `groups[i]` and `users[i]` belong to the same file system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageResponse {
    /// Names of the file systems collected, in collection order
    #[serde(skip)]
    pub file_systems: Vec<String>,
    pub groups: Vec<UsageGroup>,
    pub users: Vec<UsageUser>,
}

impl UsageResponse {
    /// Number of file systems covered
    pub fn len(&self) -> usize {
        self.groups.len().max(self.users.len())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.users.is_empty()
    }

    /// Group and user pages of the same file system, in collection order
    pub fn per_filesystem(&self) -> impl Iterator<Item = (&UsageGroup, &UsageUser)> {
        self.groups.iter().zip(self.users.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_usage_page_decodes() {
        let json = r#"{"items": [], "pagination_info": {"total_item_count": 0}}"#;

        let group: UsageGroup = serde_json::from_str(json).unwrap();
        assert!(group.items.is_empty());
        assert_eq!(group.pagination_info.total, 0);
        assert!(!group.pagination_info.has_more());

        let user: UsageUser = serde_json::from_str(json).unwrap();
        assert!(user.items.is_empty());
        assert_eq!(user.pagination_info.total, 0);
    }

    #[test]
    fn test_group_usage_item_decodes() {
        let json = r#"{
            "items": [{
                "file_system": {"name": "home", "id": "10314f42-020d-7080-8013-000ddt400090"},
                "file_system_default_quota": 0,
                "group": {"id": 1001, "name": "staff"},
                "name": "home/staff",
                "quota": 1099511627776,
                "usage": 2199023255552
            }],
            "pagination_info": {"continuation_token": "abc", "total_item_count": 42}
        }"#;

        let page: UsageGroup = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);

        let item = &page.items[0];
        assert_eq!(item.file_system.get("name").map(String::as_str), Some("home"));
        assert_eq!(item.group.id, 1001);
        assert_eq!(item.group.name, "staff");
        assert_eq!(item.name, "home/staff");
        assert_eq!(item.quota, 1_099_511_627_776);
        // Usage above quota is allowed
        assert!(item.usage > item.quota);

        assert_eq!(page.pagination_info.continuation_token, "abc");
        assert_eq!(page.pagination_info.total, 42);
        assert!(page.pagination_info.has_more());
    }

    #[test]
    fn test_null_and_missing_fields_decode_to_defaults() {
        let json = r#"{
            "items": [{
                "file_system": null,
                "user": {"id": 0, "name": null},
                "name": "scratch/nobody",
                "quota": null
            }],
            "pagination_info": {"continuation_token": null, "total_item_count": 1}
        }"#;

        let page: UsageUser = serde_json::from_str(json).unwrap();
        let item = &page.items[0];
        assert!(item.file_system.is_empty());
        assert_eq!(item.user, NameID::default());
        assert_eq!(item.quota, 0);
        assert_eq!(item.usage, 0);
        assert_eq!(item.file_system_default_quota, 0);
        assert_eq!(page.pagination_info.continuation_token, "");
    }

    #[test]
    fn test_filesystems_response_ignores_unknown_fields() {
        let json = r#"{
            "items": [
                {"name": "fs1", "id": "a", "created": 1554761285000, "destroyed": false,
                 "nfs": {"enabled": true}, "space": {"virtual": 1024, "unique": 512,
                 "snapshots": 0, "total_physical": 512, "data_reduction": 2.0}},
                {"name": "fs2", "space": null}
            ],
            "pagination_info": {"total_item_count": 2}
        }"#;

        let response: FilesystemsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].name, "fs1");
        assert_eq!(response.items[0].created, 1_554_761_285_000);
        let space = response.items[0].space.as_ref().unwrap();
        assert_eq!(space.virtual_bytes, 1024);
        assert_eq!(space.data_reduction, 2.0);
        assert_eq!(response.items[1].space, None);
        assert_eq!(response.pagination_info.total, 2);
    }

    #[test]
    fn test_usage_response_pairs_pages_by_index() {
        let mut first_group = UsageGroup::default();
        first_group.pagination_info.total = 1;
        let mut first_user = UsageUser::default();
        first_user.pagination_info.total = 2;

        let response = UsageResponse {
            file_systems: vec!["fs1".to_string(), "fs2".to_string()],
            groups: vec![first_group.clone(), UsageGroup::default()],
            users: vec![first_user.clone(), UsageUser::default()],
        };

        assert_eq!(response.len(), 2);
        assert!(!response.is_empty());

        let pairs: Vec<_> = response.per_filesystem().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, &first_group);
        assert_eq!(pairs[0].1, &first_user);

        assert!(UsageResponse::default().is_empty());
    }
}
