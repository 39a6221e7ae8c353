//! Series Filter/Sorter
//!
//! Derives the renderable series from an aggregated mapping: only dates on
//! which every selected country has a positive value, in ascending order.

use super::types::{AggregatedDatum, SeriesMap};

/// Dates where all `selected` countries have reported, ascending
///
/// Each returned datum carries only the selected countries' values; fields
/// left behind by countries that are no longer selected are dropped. An
/// empty selection yields an empty series.
pub fn displayable(series: &SeriesMap, selected: &[String]) -> Vec<AggregatedDatum> {
    if selected.is_empty() {
        return Vec::new();
    }

    // BTreeMap iteration is already ascending by date
    series
        .values()
        .filter(|datum| datum.positive_count(selected) == selected.len())
        .map(|datum| AggregatedDatum {
            date: datum.date,
            label: datum.label.clone(),
            values: datum
                .values
                .iter()
                .filter(|(name, _)| selected.contains(*name))
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn insert(map: &mut SeriesMap, d: &str, values: &[(&str, u64)]) {
        let mut datum = AggregatedDatum::new(date(d));
        for (name, v) in values {
            datum = datum.with(*name, *v);
        }
        map.insert(datum.date, datum);
    }

    #[test]
    fn test_excludes_dates_missing_a_country() {
        let mut map = SeriesMap::new();
        insert(&mut map, "2020-01-01", &[("A", 25)]);
        insert(&mut map, "2020-01-02", &[("A", 30), ("B", 40)]);

        let out = displayable(&map, &names(&["A", "B"]));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, date("2020-01-02"));
    }

    #[test]
    fn test_sorted_ascending() {
        let mut map = SeriesMap::new();
        insert(&mut map, "2020-03-10", &[("A", 90)]);
        insert(&mut map, "2020-01-05", &[("A", 30)]);
        insert(&mut map, "2020-02-01", &[("A", 60)]);

        let out = displayable(&map, &names(&["A"]));

        let dates: Vec<_> = out.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![date("2020-01-05"), date("2020-02-01"), date("2020-03-10")]
        );
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_values_do_not_qualify() {
        let mut map = SeriesMap::new();
        insert(&mut map, "2020-01-01", &[("A", 25), ("B", 0)]);

        assert!(displayable(&map, &names(&["A", "B"])).is_empty());
    }

    #[test]
    fn test_stale_fields_do_not_block_or_leak() {
        let mut map = SeriesMap::new();
        // "C" was selected earlier and has since been removed
        insert(&mut map, "2020-01-01", &[("A", 25), ("C", 99)]);
        insert(&mut map, "2020-01-02", &[("C", 99)]);

        let out = displayable(&map, &names(&["A"]));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("A"), Some(25));
        assert_eq!(out[0].get("C"), None);
    }

    #[test]
    fn test_empty_selection() {
        let mut map = SeriesMap::new();
        insert(&mut map, "2020-01-01", &[("A", 25)]);

        assert!(displayable(&map, &[]).is_empty());
    }
}
