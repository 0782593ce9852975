use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::dto::champion_dto::Champion;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("champion catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("champion catalog is empty")]
    Empty,
}

/// Read-only champion list, fetched once per session and cached for its
/// lifetime. An unavailable catalog at session start aborts the draft.
pub struct ChampionCatalog {
    champions: Vec<Champion>,
    by_id: HashMap<i64, usize>,
}

impl ChampionCatalog {
    pub async fn fetch(http: &reqwest::Client, url: &str) -> Result<Self, CatalogError> {
        let champions: Vec<Champion> = http.get(url).send().await?.error_for_status()?.json().await?;
        info!("Loaded {} champions from {url}.", champions.len());
        Self::from_champions(champions).ok_or(CatalogError::Empty)
    }

    pub fn from_champions(champions: Vec<Champion>) -> Option<Self> {
        if champions.is_empty() {
            return None;
        }
        let by_id = champions
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();
        Some(Self { champions, by_id })
    }

    pub fn all(&self) -> &[Champion] {
        &self.champions
    }

    pub fn get(&self, id: i64) -> Option<&Champion> {
        self.by_id.get(&id).map(|&i| &self.champions[i])
    }

    /// Advisory role filtering for selection UIs; never used for validation.
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Champion> {
        self.champions.iter().filter(move |c| c.tags.iter().any(|t| t == tag))
    }

    /// Champions not yet locked anywhere in the session.
    pub fn eligible(&self, locked: &[i64]) -> Vec<&Champion> {
        self.champions.iter().filter(|c| !locked.contains(&c.id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn champion(id: i64, name: &str, tags: &[&str]) -> Champion {
        Champion {
            id,
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn catalog() -> ChampionCatalog {
        ChampionCatalog::from_champions(vec![
            champion(1, "Aatrox", &["Fighter"]),
            champion(2, "Ahri", &["Mage", "Assassin"]),
            champion(3, "Akali", &["Assassin"]),
        ])
        .unwrap()
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(ChampionCatalog::from_champions(vec![]).is_none());
    }

    #[test]
    fn lookup_and_tag_filter() {
        let catalog = catalog();
        assert_eq!(catalog.get(2).unwrap().name, "Ahri");
        assert!(catalog.get(99).is_none());
        let assassins: Vec<_> = catalog.with_tag("Assassin").map(|c| c.id).collect();
        assert_eq!(assassins, vec![2, 3]);
    }

    #[test]
    fn eligible_excludes_locked_champions() {
        let catalog = catalog();
        let eligible = catalog.eligible(&[2]);
        assert_eq!(eligible.len(), 2);
        assert!(eligible.iter().all(|c| c.id != 2));
    }
}
