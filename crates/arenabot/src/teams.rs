//! Where rosters come from.
//!
//! Three sources feed the roster assembler:
//!
//! - **static**: `team_dir/<format>`, a file of export text or a directory
//!   of them (one non-hidden file picked at random);
//! - **factory**: `factory_dir/<format>`, laid out the same way, holding a
//!   pool of candidate sets that is drafted down to one roster;
//! - **provided**: a paste link stored in a challenger's preferences,
//!   fetched as `<link>/raw`.
//!
//! Each lookup returns `Ok(None)` when the source simply has nothing for
//! the format and `Err` when looking failed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use arenabot_roster::{DraftRules, RosterSet, draft_factory, pack, parse_export};
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::BotConfig;

/// Errors from roster lookups.
#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    #[error("roster source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fetching roster failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("not a roster link: {0}")]
    BadLink(String),
}

/// A local roster source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSource {
    Static,
    Factory,
}

/// Static and factory roster directories plus an HTTP client for pastes.
#[derive(Debug, Clone)]
pub struct RosterLibrary {
    team_dir: PathBuf,
    factory_dir: PathBuf,
    rules: DraftRules,
    http: reqwest::Client,
}

impl RosterLibrary {
    pub fn new(
        team_dir: impl Into<PathBuf>,
        factory_dir: impl Into<PathBuf>,
        rules: DraftRules,
    ) -> Self {
        Self {
            team_dir: team_dir.into(),
            factory_dir: factory_dir.into(),
            rules,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(&config.team_dir, &config.factory_dir, config.draft_rules())
    }

    /// A hand-built roster for `format`, packed.
    pub async fn static_roster(&self, format: &str) -> Result<Option<String>, TeamError> {
        let Some(text) = read_source(&self.team_dir, format).await? else {
            return Ok(None);
        };
        Ok(packed(parse_export(&text), format))
    }

    /// A roster drafted from the candidate pool for `format`, packed.
    pub async fn factory_roster(&self, format: &str) -> Result<Option<String>, TeamError> {
        let Some(text) = read_source(&self.factory_dir, format).await? else {
            return Ok(None);
        };
        let pool = parse_export(&text);
        if pool.is_empty() {
            warn!(format, "factory pool has no usable sets");
            return Ok(None);
        }
        Ok(packed(draft_factory(pool, &self.rules), format))
    }

    /// The roster behind a paste link, packed.
    pub async fn provided_roster(&self, link: &str) -> Result<Option<String>, TeamError> {
        let link = link.trim().trim_end_matches('/');
        if !(link.starts_with("https://") || link.starts_with("http://")) {
            return Err(TeamError::BadLink(link.to_string()));
        }

        let url = format!("{link}/raw");
        debug!(%url, "fetching provided roster");
        let text = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(packed(parse_export(&text), link))
    }

    pub async fn resolve(
        &self,
        source: RosterSource,
        format: &str,
    ) -> Result<Option<String>, TeamError> {
        match source {
            RosterSource::Static => self.static_roster(format).await,
            RosterSource::Factory => self.factory_roster(format).await,
        }
    }

    /// The bot's own roster for challenge and ladder play: static first,
    /// then the factory pool.
    pub async fn own_roster(&self, format: &str) -> Result<Option<String>, TeamError> {
        if let Some(roster) = self.static_roster(format).await? {
            return Ok(Some(roster));
        }
        self.factory_roster(format).await
    }
}

fn packed(sets: Vec<RosterSet>, origin: &str) -> Option<String> {
    if sets.is_empty() {
        warn!(origin, "roster text held no usable sets");
        return None;
    }
    Some(pack(&sets))
}

/// Reads `base/<format>`, picking a file when it is a directory.
async fn read_source(base: &Path, format: &str) -> Result<Option<String>, TeamError> {
    let path = base.join(format);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no roster source");
            return Ok(None);
        }
        Err(source) => return Err(TeamError::Io { path, source }),
    };

    let file = if metadata.is_dir() {
        match pick_file(&path).await? {
            Some(file) => file,
            None => {
                debug!(path = %path.display(), "roster directory is empty");
                return Ok(None);
            }
        }
    } else {
        path
    };

    let text = tokio::fs::read_to_string(&file)
        .await
        .map_err(|source| TeamError::Io {
            path: file.clone(),
            source,
        })?;
    debug!(path = %file.display(), "read roster source");
    Ok(Some(text))
}

/// A random non-hidden regular file in `dir`.
async fn pick_file(dir: &Path) -> Result<Option<PathBuf>, TeamError> {
    let io_err = |source| TeamError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let is_file = entry
            .file_type()
            .await
            .map(|kind| kind.is_file())
            .unwrap_or(false);
        if is_file && !hidden {
            files.push(entry.path());
        }
    }
    files.sort();

    let picked = files.choose(&mut rand::rng()).cloned();
    Ok(picked)
}
