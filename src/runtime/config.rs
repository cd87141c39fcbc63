use crate::scan::element::ElementKind;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration as TimeDelta, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STORE_NAME: &str = "restash";
pub const DEFAULT_COLLECTION_NAME: &str = "assets";
/// Default TTL for cached entries, a quarter of a 365-day year.
pub const DEFAULT_EXPIRY_MINUTES: u32 = 131_400;
const DEFAULT_OPEN_TIMEOUT_MILLIS: u64 = 200;

/// Runtime configuration for the asset loader.
///
/// All instances must be constructed via [`LoaderConfig::builder`] or [`LoaderConfig::new`]
/// so invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    tags: Vec<ElementKind>,
    store_name: String,
    collection_name: String,
    data_dir: PathBuf,
    prune: bool,
    expiry_minutes: Option<u32>,
    open_timeout: Duration,
    fetch_timeout: Option<Duration>,
}

pub struct LoaderConfigParams {
    pub tags: Vec<ElementKind>,
    pub store_name: String,
    pub collection_name: String,
    pub data_dir: PathBuf,
    pub prune: bool,
    pub expiry_minutes: Option<u32>,
    pub open_timeout: Duration,
    pub fetch_timeout: Option<Duration>,
}

impl LoaderConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    ///
    /// Prefer [`LoaderConfig::builder`] for ergonomics when many values use defaults.
    pub fn new(params: LoaderConfigParams) -> Result<Self> {
        let LoaderConfigParams {
            tags,
            store_name,
            collection_name,
            data_dir,
            prune,
            expiry_minutes,
            open_timeout,
            fetch_timeout,
        } = params;

        let config = Self {
            tags,
            store_name: trimmed_string(store_name),
            collection_name: trimmed_string(collection_name),
            data_dir,
            prune,
            expiry_minutes,
            open_timeout,
            fetch_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Element kinds scanned when no explicit element set is supplied.
    pub fn tags(&self) -> &[ElementKind] {
        &self.tags
    }

    /// Name of the backing store (one database per name).
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Name of the collection holding cached entries within the store.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Directory where durable store backends keep their files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Whether stale entries are removed automatically after each load cycle.
    pub fn prune(&self) -> bool {
        self.prune
    }

    /// Global TTL in minutes applied to entries without a per-element override.
    ///
    /// `None` disables expiry entirely: entries persist until pruned.
    pub fn expiry_minutes(&self) -> Option<u32> {
        self.expiry_minutes
    }

    /// Deadline applied to the store-open step before the session degrades.
    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    /// Optional per-request timeout applied to fallback fetches.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout
    }

    /// Absolute expiry instant for an entry cached at `now`, per the global TTL.
    pub fn default_expiry_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expiry_minutes
            .map(|minutes| now + TimeDelta::minutes(i64::from(minutes)))
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.tags.is_empty() {
            bail!("tags must contain at least one element kind");
        }

        ensure_not_empty(&self.store_name, "store_name")?;
        ensure_identifier(&self.store_name, "store_name")?;
        ensure_not_empty(&self.collection_name, "collection_name")?;
        ensure_identifier(&self.collection_name, "collection_name")?;

        if self.data_dir.as_os_str().is_empty() {
            bail!("data_dir cannot be empty");
        }

        if self.expiry_minutes == Some(0) {
            bail!("expiry_minutes must be greater than 0; use disable_expiry to keep entries indefinitely");
        }

        if self.open_timeout.is_zero() {
            bail!("open_timeout must be greater than 0");
        }

        if self.fetch_timeout.is_some_and(|timeout| timeout.is_zero()) {
            bail!("fetch_timeout must be greater than 0 when set");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoaderConfigBuilder {
    tags: Option<Vec<ElementKind>>,
    store_name: Option<String>,
    collection_name: Option<String>,
    data_dir: Option<PathBuf>,
    prune: Option<bool>,
    expiry_minutes: Option<Option<u32>>,
    open_timeout: Option<Duration>,
    fetch_timeout: Option<Duration>,
}

impl LoaderConfigBuilder {
    pub fn tags(mut self, tags: impl IntoIterator<Item = ElementKind>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }

    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = Some(name.into());
        self
    }

    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn prune(mut self, prune: bool) -> Self {
        self.prune = Some(prune);
        self
    }

    pub fn expiry_minutes(mut self, minutes: u32) -> Self {
        self.expiry_minutes = Some(Some(minutes));
        self
    }

    /// Disables TTL expiry: entries persist until pruned or deleted explicitly.
    pub fn disable_expiry(mut self) -> Self {
        self.expiry_minutes = Some(None);
        self
    }

    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = Some(timeout);
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<LoaderConfig> {
        let params = LoaderConfigParams {
            tags: self.tags.unwrap_or_else(ElementKind::all),
            store_name: self
                .store_name
                .unwrap_or_else(|| DEFAULT_STORE_NAME.to_owned()),
            collection_name: self
                .collection_name
                .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_owned()),
            data_dir: self.data_dir.context("data_dir is required")?,
            prune: self.prune.unwrap_or(false),
            expiry_minutes: self.expiry_minutes.unwrap_or(Some(DEFAULT_EXPIRY_MINUTES)),
            open_timeout: self
                .open_timeout
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_OPEN_TIMEOUT_MILLIS)),
            fetch_timeout: self.fetch_timeout,
        };

        LoaderConfig::new(params)
    }
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

fn ensure_not_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} cannot be empty");
    }
    Ok(())
}

fn ensure_identifier(value: &str, field: &str) -> Result<()> {
    // Store and collection names end up in file names and SQL identifiers.
    if !value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        bail!("{field} may only contain ASCII letters, digits, '_' and '-'");
    }
    Ok(())
}
