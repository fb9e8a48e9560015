//! Catalog title types.
//!
//! Titles are never persisted: every use re-fetches them from the catalog,
//! so these types are plain read-only snapshots.

use serde::{Deserialize, Serialize};

use crate::ids::TitleId;

/// Release status of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    /// Announced or still airing; new episodes may appear.
    #[default]
    Airing,
    /// Fully released; nothing left to notify about.
    Released,
}

impl ReleaseStatus {
    /// Maps a catalog status string. Only `released` is terminal.
    pub fn from_catalog(status: &str) -> Self {
        if status.eq_ignore_ascii_case("released") {
            ReleaseStatus::Released
        } else {
            ReleaseStatus::Airing
        }
    }

    /// Returns true if the title is complete.
    pub fn is_released(self) -> bool {
        self == ReleaseStatus::Released
    }
}

/// Snapshot of a catalog title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    /// Catalog id.
    pub id: TitleId,

    /// Romanized name, always present.
    pub name: String,

    /// English name, if the catalog has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,

    /// Japanese name, if the catalog has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub japanese: Option<String>,

    /// Current release status.
    pub status: ReleaseStatus,

    /// Planned episode count, 0 when unknown.
    pub episodes: u32,

    /// Episodes aired so far.
    pub episodes_aired: u32,

    /// Canonical page of the title.
    pub url: String,
}

impl Title {
    /// Name shown to users: English when available, otherwise the romanized name.
    pub fn display_name(&self) -> &str {
        self.english
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Display name followed by the Japanese name when it differs.
    pub fn full_name(&self) -> String {
        match self.japanese.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(japanese) if japanese != self.display_name() => {
                format!("{} / {}", self.display_name(), japanese)
            }
            _ => self.display_name().to_string(),
        }
    }

    /// Returns true if the title can no longer get new episodes.
    pub fn is_released(&self) -> bool {
        self.status.is_released()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(english: Option<&str>, japanese: Option<&str>) -> Title {
        Title {
            id: TitleId(52991),
            name: "Sousou no Frieren".to_string(),
            english: english.map(str::to_string),
            japanese: japanese.map(str::to_string),
            status: ReleaseStatus::Airing,
            episodes: 28,
            episodes_aired: 12,
            url: "https://shikimori.one/animes/52991".to_string(),
        }
    }

    #[test]
    fn test_release_status_from_catalog() {
        assert_eq!(ReleaseStatus::from_catalog("released"), ReleaseStatus::Released);
        assert_eq!(ReleaseStatus::from_catalog("ongoing"), ReleaseStatus::Airing);
        assert_eq!(ReleaseStatus::from_catalog("anons"), ReleaseStatus::Airing);
        assert_eq!(ReleaseStatus::from_catalog(""), ReleaseStatus::Airing);
    }

    #[test]
    fn test_display_name_falls_back_to_name() {
        assert_eq!(title(Some("Frieren"), None).display_name(), "Frieren");
        assert_eq!(title(None, None).display_name(), "Sousou no Frieren");
        assert_eq!(title(Some("  "), None).display_name(), "Sousou no Frieren");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(
            title(Some("Frieren"), Some("葬送のフリーレン")).full_name(),
            "Frieren / 葬送のフリーレン"
        );
        assert_eq!(title(Some("Frieren"), None).full_name(), "Frieren");
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&ReleaseStatus::Released).unwrap(), "\"released\"");
    }
}
