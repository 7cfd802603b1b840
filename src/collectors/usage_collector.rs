use crate::client::{get_json, JsonFetcher, QueryParams};
use crate::collectors::filter::FilesystemFilter;
use crate::error::{ClientError, UsageError};
use crate::models::{FilesystemsResponse, UsageGroup, UsageResponse, UsageUser};
use log::{debug, error, info, warn};

/// Endpoint listing every file system on the array
pub const FILESYSTEMS_ENDPOINT: &str = "file-systems";

/// Endpoint returning per-group usage of one file system
pub const GROUP_USAGE_ENDPOINT: &str = "usage/groups";

/// Endpoint returning per-user usage of one file system
pub const USER_USAGE_ENDPOINT: &str = "usage/users";

/// Query parameter scoping a usage request to one file system
pub const FILE_SYSTEM_NAMES_PARAM: &str = "file_system_names";

/// Collects group and user usage for the file systems of one array
///
/// Every call lists the file systems, filters them by name and then issues a
/// group-usage and a user-usage request per matching file system, strictly one
/// after another. Nothing is cached, so each call costs
/// `1 + 2 * matching file systems` round trips. On large arrays the filter is
/// the way to keep that bounded.
pub struct UsageCollector<F: JsonFetcher> {
    fetcher: F,
    legacy_filter: bool,
}

impl<F: JsonFetcher> UsageCollector<F> {
    /// Create a collector on top of a JSON fetcher
    ///
    /// # Example
    ///
    /// ```
    /// use fbusage::client::MockFetcher;
    /// use fbusage::collectors::{FilesystemFilter, UsageCollector};
    /// use serde_json::json;
    ///
    /// # tokio_test_block_on(async {
    /// let fetcher = MockFetcher::new()
    ///     .with_filesystems(&["home"])
    ///     .with_response("usage/groups", json!({"items": []}))
    ///     .with_response("usage/users", json!({"items": []}));
    ///
    /// let collector = UsageCollector::new(&fetcher);
    /// let usage = collector.usage(&FilesystemFilter::all()).await.unwrap();
    /// assert_eq!(usage.len(), 1);
    /// # });
    /// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
    /// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
    /// # }
    /// ```
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            legacy_filter: false,
        }
    }

    /// Treat an invalid filter pattern as "match nothing" instead of an error
    pub fn with_legacy_filter(mut self, legacy_filter: bool) -> Self {
        self.legacy_filter = legacy_filter;
        self
    }

    /// Compile `pattern` according to the filter mode and collect usage
    ///
    /// # Errors
    ///
    /// In strict mode an invalid pattern returns `UsageError::InvalidFilter`
    /// before any request is sent. Otherwise see [`usage`](Self::usage).
    pub async fn usage_matching(&self, pattern: &str) -> Result<UsageResponse, UsageError> {
        let filter = if self.legacy_filter {
            FilesystemFilter::lenient(pattern)
        } else {
            FilesystemFilter::new(pattern)?
        };
        self.usage(&filter).await
    }

    /// Collect group and user usage for every file system kept by `filter`
    ///
    /// # Errors
    ///
    /// - `UsageError::ListFilesystems` if the listing fails; nothing else is
    ///   requested.
    /// - `UsageError::Usage` on the first failing usage request. Processing
    ///   stops there; the error carries every page collected so far plus
    ///   placeholder pages for the failing file system, so `groups` and
    ///   `users` stay the same length.
    pub async fn usage(&self, filter: &FilesystemFilter) -> Result<UsageResponse, UsageError> {
        let listing: FilesystemsResponse =
            match get_json(&self.fetcher, FILESYSTEMS_ENDPOINT, None).await {
                Ok(listing) => listing,
                Err(e) => {
                    error!("Failed to list file systems: {}", e);
                    return Err(UsageError::ListFilesystems(e));
                }
            };

        if listing.pagination_info.has_more() {
            warn!(
                "File system listing is paginated; only the first {} of {} entries are considered",
                listing.items.len(),
                listing.pagination_info.total
            );
        }

        let filesystems = filter.apply(&listing.items);
        info!(
            "{} of {} file systems match filter {}",
            filesystems.len(),
            listing.items.len(),
            filter
        );

        let mut response = UsageResponse::default();
        let mut params = QueryParams::new();

        for filesystem in &filesystems {
            params.insert(FILE_SYSTEM_NAMES_PARAM.to_string(), filesystem.name.clone());
            debug!("Collecting usage for file system '{}'", filesystem.name);

            let group: UsageGroup =
                match get_json(&self.fetcher, GROUP_USAGE_ENDPOINT, Some(&params)).await {
                    Ok(group) => group,
                    Err(e) => {
                        return Err(Self::abort(
                            response,
                            UsageGroup::default(),
                            GROUP_USAGE_ENDPOINT,
                            &filesystem.name,
                            e,
                        ))
                    }
                };

            let user: UsageUser =
                match get_json(&self.fetcher, USER_USAGE_ENDPOINT, Some(&params)).await {
                    Ok(user) => user,
                    Err(e) => {
                        return Err(Self::abort(
                            response,
                            group,
                            USER_USAGE_ENDPOINT,
                            &filesystem.name,
                            e,
                        ))
                    }
                };

            if group.pagination_info.has_more() || user.pagination_info.has_more() {
                debug!(
                    "Usage of '{}' spans several pages; keeping the first ({} groups of {}, {} users of {})",
                    filesystem.name,
                    group.items.len(),
                    group.pagination_info.total,
                    user.items.len(),
                    user.pagination_info.total
                );
            }

            response.file_systems.push(filesystem.name.clone());
            response.groups.push(group);
            response.users.push(user);
        }

        Ok(response)
    }

    /// Close out a failed file system and wrap the partial result
    fn abort(
        mut partial: UsageResponse,
        group: UsageGroup,
        endpoint: &str,
        file_system: &str,
        source: ClientError,
    ) -> UsageError {
        error!(
            "Failed to fetch {} for file system '{}': {}",
            endpoint, file_system, source
        );

        partial.file_systems.push(file_system.to_string());
        partial.groups.push(group);
        partial.users.push(UsageUser::default());

        UsageError::Usage {
            endpoint: endpoint.to_string(),
            file_system: file_system.to_string(),
            partial: Box::new(partial),
            source,
        }
    }
}
