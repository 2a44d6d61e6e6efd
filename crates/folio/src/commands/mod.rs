//! CLI command implementations.

pub(crate) mod add;
pub(crate) mod feeds;
pub(crate) mod remove;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use folio_catalog::{Catalog, CatalogDefaults, FeedKind, FeedRecord, SortKey, feed_record};
use folio_config::{CliSettings, Config, FeedConfig};

use crate::error::CliError;

pub(crate) use add::AddArgs;
pub(crate) use feeds::FeedsArgs;
pub(crate) use remove::RemoveArgs;
pub(crate) use serve::ServeArgs;

/// Arguments shared by every command that opens the library.
#[derive(Args)]
pub(crate) struct LibraryArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Library data directory (overrides config).
    #[arg(short, long, env = "FOLIO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output (info-level logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl LibraryArgs {
    /// Load configuration with `settings` applied over the file values.
    pub(crate) fn load_config(&self, mut settings: CliSettings) -> Result<Config, CliError> {
        if settings.data_dir.is_none() {
            settings.data_dir.clone_from(&self.data_dir);
        }
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }

    /// Load configuration and open the bootstrapped catalog.
    pub(crate) fn open(&self) -> Result<(Config, Catalog), CliError> {
        let config = self.load_config(CliSettings::default())?;
        let catalog = open_catalog(&config)?;
        Ok((config, catalog))
    }
}

/// Open the catalog under the configured data directory and create any
/// missing default or configured feeds.
pub(crate) fn open_catalog(config: &Config) -> Result<Catalog, CliError> {
    let catalog = Catalog::open(&config.library_resolved.data_dir)?;
    let created = catalog.bootstrap(&catalog_defaults(&config.feeds)?)?;
    if !created.is_empty() {
        tracing::info!(feeds = ?created, "Bootstrapped catalog");
    }
    Ok(catalog)
}

/// Built-in feeds followed by the configured ones.
pub(crate) fn catalog_defaults(feeds: &[FeedConfig]) -> Result<CatalogDefaults, CliError> {
    feeds
        .iter()
        .try_fold(CatalogDefaults::default(), |defaults, feed| {
            Ok(defaults.with_feed(feed_record_from_config(feed)?))
        })
}

fn feed_record_from_config(feed: &FeedConfig) -> Result<FeedRecord, CliError> {
    let kind = match feed.kind.as_str() {
        "navigation" => FeedKind::Navigation,
        "acquisition" => FeedKind::Acquisition,
        other => {
            return Err(CliError::Validation(format!(
                "feed {}: unknown kind {other}",
                feed.name
            )));
        }
    };
    let sort = feed
        .sort
        .parse::<SortKey>()
        .map_err(|e| CliError::Validation(format!("feed {}: {e}", feed.name)))?;

    Ok(feed_record(
        &feed.name,
        &feed.title,
        &feed.description,
        kind,
        sort,
        feed.members.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn feed(name: &str, kind: &str, sort: &str) -> FeedConfig {
        FeedConfig {
            name: name.to_owned(),
            title: "Recently Added".to_owned(),
            description: String::new(),
            kind: kind.to_owned(),
            sort: sort.to_owned(),
            members: Vec::new(),
        }
    }

    #[test]
    fn test_feed_record_from_config() {
        let record = feed_record_from_config(&feed("recent", "acquisition", "updated")).unwrap();

        assert_eq!(record.common.name, "recent");
        assert_eq!(record.common.kind, FeedKind::Acquisition);
        assert_eq!(record.sort, SortKey::Updated);
        assert_eq!(record.common.id, folio_catalog::feed_id("recent"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(matches!(
            feed_record_from_config(&feed("x", "search", "title")),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn test_catalog_defaults_append_configured_feeds() {
        let defaults = catalog_defaults(&[feed("recent", "acquisition", "updated")]).unwrap();

        let names: Vec<&str> = defaults
            .feeds
            .iter()
            .map(|f| f.common.name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "all", "recent"]);
        assert_eq!(defaults.feeds[0].members, vec!["all", "recent"]);
    }
}
