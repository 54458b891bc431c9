//! Rate tables and continent groupings

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Currency code to rate. Codes are stored without multiplier prefixes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, rate: f64) -> Option<f64> {
        self.rates.insert(code.into(), rate)
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        RateTable {
            rates: iter.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for RateTable {
    fn from(entries: [(S, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for RateTable {
    type Item = (String, f64);
    type IntoIter = btree_map::IntoIter<String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.rates.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySlot {
    pub code: String,
    /// `None` until filled, and stays `None` when the code has no rate.
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Continent {
    pub name: String,
    pub currencies: Vec<CurrencySlot>,
}

impl Continent {
    pub fn get(&self, code: &str) -> Option<&CurrencySlot> {
        self.currencies.iter().find(|slot| slot.code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.currencies.iter().map(|slot| slot.code.as_str())
    }
}

impl Serialize for Continent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.currencies.len()))?;
        for slot in &self.currencies {
            map.serialize_entry(&slot.code, &slot.rate)?;
        }
        map.end()
    }
}

/// Continents in first-seen order, each with its currencies in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinentGroups {
    continents: Vec<Continent>,
}

impl ContinentGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `codes` under `name` with unset rates. A name that is already
    /// present keeps its position and has its currencies replaced.
    pub fn commit(&mut self, name: String, codes: Vec<String>) {
        let mut currencies: Vec<CurrencySlot> = Vec::with_capacity(codes.len());
        for code in codes {
            if !currencies.iter().any(|slot| slot.code == code) {
                currencies.push(CurrencySlot { code, rate: None });
            }
        }

        match self.continents.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.currencies = currencies,
            None => self.continents.push(Continent { name, currencies }),
        }
    }

    /// Annotates every currency with its rate from `rates`. Codes missing
    /// from the table are left unset.
    pub fn fill_from(&mut self, rates: &RateTable) {
        for continent in &mut self.continents {
            for slot in &mut continent.currencies {
                slot.rate = rates.get(&slot.code);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Continent> {
        self.continents.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Continent> {
        self.continents.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.continents.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.continents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.continents.is_empty()
    }
}

impl<'a> IntoIterator for &'a ContinentGroups {
    type Item = &'a Continent;
    type IntoIter = std::slice::Iter<'a, Continent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for ContinentGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.continents.len()))?;
        for continent in &self.continents {
            map.serialize_entry(&continent.name, continent)?;
        }
        map.end()
    }
}
