//! Continent/currency registry read from a flat, one-token-per-line resource.
//!
//! Continent names are mixed case and currency codes are uppercase, so the
//! grouping is recovered from token order alone: every code belongs to the
//! most recent continent marker above it.

use crate::core::error::{RatesError, Result};
use crate::core::rates::ContinentGroups;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Registry shipped with the binary, used when no path is configured.
pub const BUNDLED_REGISTRY: &str = include_str!("../../resources/currency_per_category");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Continent(&'a str),
    Currency(&'a str),
}

impl<'a> Token<'a> {
    /// Blank lines carry no token.
    pub fn classify(line: &'a str) -> Option<Self> {
        let token = line.trim();
        if token.is_empty() {
            None
        } else if token.chars().all(char::is_uppercase) {
            Some(Token::Currency(token))
        } else {
            Some(Token::Continent(token))
        }
    }
}

enum GroupingState {
    NoContinent,
    InContinent { name: String, codes: Vec<String> },
}

impl GroupingState {
    fn step(self, token: Token<'_>, groups: &mut ContinentGroups) -> Self {
        match (self, token) {
            (GroupingState::NoContinent, Token::Continent(name)) => GroupingState::InContinent {
                name: name.to_string(),
                codes: Vec::new(),
            },
            (GroupingState::NoContinent, Token::Currency(code)) => {
                debug!(code, "Dropping currency listed before any continent");
                GroupingState::NoContinent
            }
            (previous @ GroupingState::InContinent { .. }, Token::Continent(name)) => {
                previous.commit(groups);
                GroupingState::InContinent {
                    name: name.to_string(),
                    codes: Vec::new(),
                }
            }
            (GroupingState::InContinent { name, mut codes }, Token::Currency(code)) => {
                codes.push(code.to_string());
                GroupingState::InContinent { name, codes }
            }
        }
    }

    // Continents without currencies are never committed.
    fn commit(self, groups: &mut ContinentGroups) {
        if let GroupingState::InContinent { name, codes } = self
            && !codes.is_empty()
        {
            groups.commit(name, codes);
        }
    }
}

/// Where an aggregation cycle reads its registry from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLocation {
    Bundled,
    File(PathBuf),
}

impl RegistryLocation {
    pub fn load(&self) -> Result<ContinentGroups> {
        match self {
            RegistryLocation::Bundled => Ok(ContinentRegistry::bundled()),
            RegistryLocation::File(path) => ContinentRegistry::load(path),
        }
    }
}

pub struct ContinentRegistry;

impl ContinentRegistry {
    /// Reads the registry at `path` and returns the grouping skeleton with
    /// every rate unset.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ContinentGroups> {
        let path = path.as_ref();
        debug!("Loading currency registry from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| RatesError::ResourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn bundled() -> ContinentGroups {
        Self::parse(BUNDLED_REGISTRY)
    }

    pub fn parse(text: &str) -> ContinentGroups {
        let mut groups = ContinentGroups::new();
        let state = text
            .lines()
            .filter_map(Token::classify)
            .fold(GroupingState::NoContinent, |state, token| {
                state.step(token, &mut groups)
            });
        state.commit(&mut groups);

        debug!(continents = groups.len(), "Parsed currency registry");
        groups
    }
}
