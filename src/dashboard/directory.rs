//! Country Directory
//!
//! The set of countries the user can pick from, built once from the list
//! endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::source::CountrySummary;

/// Default flag image URL; `{code}` is replaced by the ISO code
pub const DEFAULT_FLAG_URL_TEMPLATE: &str = "https://www.countryflags.io/{code}/shiny/32.png";

/// A selectable country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub code: String,
    pub flag_url: String,
}

/// Known countries keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryDirectory {
    countries: BTreeMap<String, Country>,
}

impl CountryDirectory {
    /// Build from the list endpoint response
    ///
    /// Names are unique keys: when the list repeats a name the first entry
    /// wins.
    pub fn from_summaries(summaries: Vec<CountrySummary>, flag_url_template: &str) -> Self {
        let mut countries = BTreeMap::new();

        for summary in summaries {
            if countries.contains_key(&summary.name) {
                continue;
            }
            let flag_url = flag_url_template.replace("{code}", &summary.code);
            countries.insert(
                summary.name.clone(),
                Country {
                    name: summary.name,
                    code: summary.code,
                    flag_url,
                },
            );
        }

        Self { countries }
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Country> {
        self.countries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.countries.contains_key(name)
    }

    /// Look up by ISO code, ignoring case
    pub fn by_code(&self, code: &str) -> Option<&Country> {
        self.countries
            .values()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// Countries ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &Country> {
        self.countries.values()
    }
}
