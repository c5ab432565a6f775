//! Domain types and wire structs for the pollenrapporten.se v1 API.

use serde::Deserialize;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use tracing::warn;

// --- Wire structs (v1 API response shapes) ---

/// Generic envelope of the v1 list endpoints.
///
/// A missing `items` field deserializes to an empty list, matching how lenient
/// the upstream contract is about it.
#[derive(Debug, Deserialize, Clone)]
pub struct ItemsResponse<T> {
    // `default = "Vec::new"` keeps the derive from bounding `T: Default`.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// One entry of the `/v1/pollen-types` or `/v1/regions` catalogs.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
}

/// One entry of the `/v1/forecasts` response. Only the level series is consumed.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ForecastItem {
    #[serde(default = "Vec::new")]
    pub level_series: Vec<LevelSeries>,
}

/// A single (pollen type, time, level) reading inside a forecast item.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LevelSeries {
    pub pollen_id: String,
    pub time: String,
    pub level: String,
}

// --- Domain types ---

/// A named allergen category with a stable id (e.g. `bjork` / "Birch").
///
/// Equality and hashing consider the id alone: two catalog entries with the
/// same id are the same pollen type regardless of display name. `Borrow<str>`
/// lets maps keyed by `PollenType` be looked up with a bare id.
#[derive(Debug, Clone, Eq)]
pub struct PollenType {
    pub id: String,
    pub name: String,
}

impl PollenType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for PollenType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for PollenType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Borrow<str> for PollenType {
    fn borrow(&self) -> &str {
        &self.id
    }
}

/// Finds a pollen type by its id within a catalog slice.
#[allow(dead_code)] // Lookup helper for hosts holding a plain catalog slice
pub fn find_pollen_type<'a>(types: &'a [PollenType], id: &str) -> Option<&'a PollenType> {
    types.iter().find(|t| t.id == id)
}

/// A geographic forecasting area, used to scope a forecast query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    pub region_id: String,
    pub name: String,
}

impl City {
    pub fn new(region_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            name: name.into(),
        }
    }
}

/// One observation/prediction point: a pollen type at a time with a level code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pollen {
    pub pollen_type: PollenType,
    pub level: String,
    pub time: String,
}

/// A city paired with its ordered pollen readings, for presentation.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub city: City,
    pub pollen_levels: Vec<Pollen>,
}

impl Forecast {
    /// Flattens a forecast table for one city into an ordered reading list,
    /// sorted by pollen name then time.
    pub fn from_table(city: City, table: &ForecastTable) -> Self {
        let mut pollen_levels: Vec<Pollen> = table
            .iter()
            .flat_map(|(pollen_type, levels)| {
                levels.iter().map(|(time, level)| Pollen {
                    pollen_type: pollen_type.clone(),
                    level: level.clone(),
                    time: time.clone(),
                })
            })
            .collect();
        pollen_levels.sort_by(|a, b| {
            (a.pollen_type.name.as_str(), a.time.as_str())
                .cmp(&(b.pollen_type.name.as_str(), b.time.as_str()))
        });
        Self {
            city,
            pollen_levels,
        }
    }
}

/// The merged forecast table: pollen type -> (time -> level code).
///
/// Every pollen type known to the catalog gets a slot, even when the forecast
/// carries no readings for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    entries: HashMap<PollenType, BTreeMap<String, String>>,
}

impl ForecastTable {
    /// Folds the level series of one forecast item into a table.
    ///
    /// Entries whose `pollenId` matches no known pollen type are skipped with
    /// a warning rather than rejecting the whole response.
    pub fn from_series(pollen_types: &[PollenType], series: &[LevelSeries]) -> Self {
        let mut entries: HashMap<PollenType, BTreeMap<String, String>> = pollen_types
            .iter()
            .map(|t| (t.clone(), BTreeMap::new()))
            .collect();
        for entry in series {
            match entries.get_mut(entry.pollen_id.as_str()) {
                Some(levels) => {
                    levels.insert(entry.time.clone(), entry.level.clone());
                },
                None => {
                    warn!(
                        "Skipping level series entry for unknown pollen type '{}'",
                        entry.pollen_id
                    );
                },
            }
        }
        Self { entries }
    }

    /// The (time -> level) readings for one pollen type, looked up by id.
    #[allow(dead_code)]
    pub fn levels_for(&self, pollen_id: &str) -> Option<&BTreeMap<String, String>> {
        self.entries.get(pollen_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PollenType, &BTreeMap<String, String>)> {
        self.entries.iter()
    }

    /// True when no pollen type carries any reading.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|levels| levels.is_empty())
    }
}

// --- Severity scale ---

/// Highest severity ordinal on the fixed 0-7 scale.
pub const SEVERITY_MAX: u8 = 7;

/// Maps a level code from the API onto its severity ordinal (0 = none/very
/// low .. 7 = very high).
///
/// The scale is a fixed closed set of 8 codes; anything else is outside the
/// domain and yields `None`.
pub fn severity_ordinal(level: &str) -> Option<u8> {
    match level {
        "i.h." => Some(0),
        "L" => Some(1),
        "L-M" => Some(2),
        "M" => Some(3),
        "M-H" => Some(4),
        "H" => Some(5),
        "H-H+" => Some(6),
        "H+" => Some(7),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn pollen_type_equality_and_hash_are_by_id() {
        let a = PollenType::new("bjork", "Birch");
        let b = PollenType::new("bjork", "Björk");
        let c = PollenType::new("gras", "Grass");
        assert_eq!(a, b);
        assert_ne!(a, c);

        // Borrow<str> lets a map keyed by PollenType be read with a bare id.
        let mut map: HashMap<PollenType, u8> = HashMap::new();
        map.insert(a.clone(), 1);
        assert_eq!(map.get("bjork"), Some(&1));
        assert_eq!(map.get("gras"), None);
    }

    #[test]
    fn find_pollen_type_by_id() {
        let types = vec![
            PollenType::new("bjork", "Birch"),
            PollenType::new("gras", "Grass"),
        ];
        assert_eq!(find_pollen_type(&types, "gras").map(|t| t.name.as_str()), Some("Grass"));
        assert!(find_pollen_type(&types, "alm").is_none());
    }

    #[test]
    fn forecast_table_seeds_every_known_type() {
        let types = vec![
            PollenType::new("bjork", "Birch"),
            PollenType::new("gras", "Grass"),
        ];
        let series = vec![LevelSeries {
            pollen_id: "bjork".to_string(),
            time: "2024-05-01".to_string(),
            level: "M".to_string(),
        }];
        let table = ForecastTable::from_series(&types, &series);
        assert_eq!(
            table.levels_for("bjork").and_then(|l| l.get("2024-05-01")),
            Some(&"M".to_string())
        );
        // No readings for grass, but the slot exists.
        assert_eq!(table.levels_for("gras").map(|l| l.len()), Some(0));
        assert!(!table.is_empty());
    }

    #[test]
    fn forecast_table_skips_unknown_pollen_ids() {
        let types = vec![PollenType::new("bjork", "Birch")];
        let series = vec![LevelSeries {
            pollen_id: "mystery".to_string(),
            time: "2024-05-01".to_string(),
            level: "H".to_string(),
        }];
        let table = ForecastTable::from_series(&types, &series);
        assert!(table.levels_for("mystery").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn forecast_flattens_sorted_by_name_then_time() {
        let types = vec![
            PollenType::new("gras", "Grass"),
            PollenType::new("bjork", "Birch"),
        ];
        let series = vec![
            LevelSeries {
                pollen_id: "gras".to_string(),
                time: "2024-05-02".to_string(),
                level: "L".to_string(),
            },
            LevelSeries {
                pollen_id: "bjork".to_string(),
                time: "2024-05-02".to_string(),
                level: "H".to_string(),
            },
            LevelSeries {
                pollen_id: "bjork".to_string(),
                time: "2024-05-01".to_string(),
                level: "M".to_string(),
            },
        ];
        let table = ForecastTable::from_series(&types, &series);
        let forecast = Forecast::from_table(City::new("r1", "Stockholm"), &table);

        assert_eq!(forecast.city.name, "Stockholm");
        let flat: Vec<(&str, &str, &str)> = forecast
            .pollen_levels
            .iter()
            .map(|p| (p.pollen_type.name.as_str(), p.time.as_str(), p.level.as_str()))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("Birch", "2024-05-01", "M"),
                ("Birch", "2024-05-02", "H"),
                ("Grass", "2024-05-02", "L"),
            ]
        );
    }

    #[rstest]
    #[case("i.h.", Some(0))]
    #[case("L", Some(1))]
    #[case("L-M", Some(2))]
    #[case("M", Some(3))]
    #[case("M-H", Some(4))]
    #[case("H", Some(5))]
    #[case("H-H+", Some(6))]
    #[case("H+", Some(7))]
    #[case("", None)]
    #[case("XXL", None)]
    #[case("h+", None)]
    fn severity_ordinal_scale(#[case] level: &str, #[case] expected: Option<u8>) {
        assert_eq!(severity_ordinal(level), expected);
    }

    #[test]
    fn items_response_defaults_missing_items() {
        let parsed: ItemsResponse<CatalogItem> = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_empty());

        let parsed: ItemsResponse<CatalogItem> =
            serde_json::from_str(r#"{"items":[{"id":"bjork","name":"Birch"}]}"#).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].id, "bjork");
    }
}
