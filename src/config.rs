//! Listing configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--page-size`, etc.)
//! 2. `$PAGED_LISTING_CONFIG` environment variable (path to config file)
//! 3. Project-local `.paged-listing.toml` in the current working directory
//! 4. Global `~/.config/paged-listing/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::controller::DEFAULT_PAGE_SIZE;
use crate::error::{ListError, Result};
use crate::sort::{Direction, SortField, SortSpec};

// ── Section configs ──────────────────────────────────────────────────────────

/// Pagination and ordering settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ListingSection {
    /// Items requested per page.
    pub page_size: Option<usize>,
    /// Sort field: "name", "updated_at", "size".
    pub sort_field: Option<String>,
    /// "asc" or "desc".
    pub direction: Option<String>,
    /// Folders listed before files.
    pub folders_first: Option<bool>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogSection {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ListingConfig {
    pub listing: ListingSection,
    pub log: LogSection,
}

/// Default log filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Candidate config file paths in priority order, excluding `--config`.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("PAGED_LISTING_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".paged-listing.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("paged-listing").join("config.toml"));
    }

    paths
}

/// Read and parse a TOML config file. Returns `None` if the file is missing
/// or unparseable (the latter with a warning).
fn load_file(path: &Path) -> Option<ListingConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<ListingConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl ListingConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &ListingConfig) -> ListingConfig {
        ListingConfig {
            listing: ListingSection {
                page_size: other.listing.page_size.or(self.listing.page_size),
                sort_field: other
                    .listing
                    .sort_field
                    .clone()
                    .or(self.listing.sort_field),
                direction: other.listing.direction.clone().or(self.listing.direction),
                folders_first: other.listing.folders_first.or(self.listing.folders_first),
            },
            log: LogSection {
                filter: other.log.filter.clone().or(self.log.filter),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&ListingConfig>) -> ListingConfig {
        Self::load_from(&candidate_paths(), cli_config_path, cli_overrides)
    }

    fn load_from(
        candidates: &[PathBuf],
        cli_config_path: Option<&Path>,
        cli_overrides: Option<&ListingConfig>,
    ) -> ListingConfig {
        let mut config = ListingConfig::default();

        // Lowest priority first so higher-priority files overwrite.
        for path in candidates.iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn page_size(&self) -> usize {
        self.listing
            .page_size
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn folders_first(&self) -> bool {
        self.listing.folders_first.unwrap_or(true)
    }

    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Initial sort spec. Unknown field or direction names are rejected.
    pub fn sort_spec(&self) -> Result<SortSpec> {
        let field = match self.listing.sort_field.as_deref() {
            None => SortField::default(),
            Some(s) => SortField::parse(s)
                .ok_or_else(|| ListError::Config(format!("unknown sort field '{}'", s)))?,
        };
        let direction = match self.listing.direction.as_deref() {
            None => Direction::default(),
            Some(s) => Direction::parse(s)
                .ok_or_else(|| ListError::Config(format!("unknown direction '{}'", s)))?,
        };
        Ok(SortSpec::new(field, direction).with_folders_first(self.folders_first()))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
