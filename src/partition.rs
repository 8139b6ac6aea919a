//! Year partition and year × species counts
//!
//! Only records with a known acquisition date take part. Records without one
//! are listed in [`YearPartition::undated`] and counted nowhere.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::Record;

/// Records of one species within a year, by register index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesGroup {
    pub species: String,
    pub rows: Vec<usize>,
}

impl SpeciesGroup {
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearGroup {
    pub year: i32,
    pub species: Vec<SpeciesGroup>,
}

impl YearGroup {
    pub fn count(&self) -> usize {
        self.species.iter().map(SpeciesGroup::count).sum()
    }

    pub fn group(&self, species: &str) -> Option<&SpeciesGroup> {
        self.species.iter().find(|g| g.species == species)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct YearPartition {
    /// Ascending by year
    pub years: Vec<YearGroup>,
    /// Rows whose acquisition date is unknown
    pub undated: Vec<usize>,
}

impl YearPartition {
    /// Group records by `(year, species)`.
    ///
    /// Years ascend. Species within a year follow their first appearance in
    /// `records`, and rows within a group keep register order.
    pub fn build(records: &[Record]) -> Self {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            first_seen.entry(record.species.as_str()).or_insert(i);
        }

        let mut by_year: BTreeMap<i32, BTreeMap<usize, SpeciesGroup>> = BTreeMap::new();
        let mut undated = Vec::new();

        for (i, record) in records.iter().enumerate() {
            let Some(year) = record.year() else {
                undated.push(i);
                continue;
            };
            let order = first_seen[record.species.as_str()];
            by_year
                .entry(year)
                .or_default()
                .entry(order)
                .or_insert_with(|| SpeciesGroup {
                    species: record.species.clone(),
                    rows: Vec::new(),
                })
                .rows
                .push(i);
        }

        let years = by_year
            .into_iter()
            .map(|(year, groups)| YearGroup {
                year,
                species: groups.into_values().collect(),
            })
            .collect();

        Self { years, undated }
    }

    pub fn year(&self, year: i32) -> Option<&YearGroup> {
        self.years.iter().find(|g| g.year == year)
    }

    pub fn year_list(&self) -> Vec<i32> {
        self.years.iter().map(|g| g.year).collect()
    }
}

/// Year × species pivot with explicit zeros
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CountTable {
    /// Row labels, ascending
    pub years: Vec<i32>,
    /// Column labels, sorted
    pub species: Vec<String>,
    /// `counts[y][s]` for `years[y]`, `species[s]`
    pub counts: Vec<Vec<usize>>,
}

impl CountTable {
    pub fn build(records: &[Record]) -> Self {
        let dated: Vec<(i32, &str)> = records
            .iter()
            .filter_map(|r| r.year().map(|y| (y, r.species.as_str())))
            .collect();

        let years: Vec<i32> = dated
            .iter()
            .map(|(y, _)| *y)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let species: Vec<String> = dated
            .iter()
            .map(|(_, s)| *s)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect();

        let mut counts = vec![vec![0; species.len()]; years.len()];
        for (year, sp) in dated {
            // Both labels were collected from `dated`, so the lookups succeed
            if let (Ok(y), Ok(s)) = (
                years.binary_search(&year),
                species.binary_search_by(|probe| probe.as_str().cmp(sp)),
            ) {
                counts[y][s] += 1;
            }
        }

        Self {
            years,
            species,
            counts,
        }
    }

    /// Count for a pair. `Some(0)` for a pair in the cross product with no
    /// records, `None` for a year or species that never appears.
    pub fn get(&self, year: i32, species: &str) -> Option<usize> {
        let y = self.years.iter().position(|v| *v == year)?;
        let s = self.species.iter().position(|v| v == species)?;
        Some(self.counts[y][s])
    }

    pub fn year_total(&self, year: i32) -> Option<usize> {
        let y = self.years.iter().position(|v| *v == year)?;
        Some(self.counts[y].iter().sum())
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn rec(name: &str, species: &str, acquired: &str) -> Record {
        Record::new(name, species).with_acquired(acquired)
    }

    fn sample() -> Vec<Record> {
        vec![
            rec("Fido", "Dog", "01/06/2022"),
            rec("Whiskers", "Cat", "15/03/2022"),
            rec("Hen 1", "Chicken", "02/02/2023"),
            rec("Rex", "Dog", "not-a-date"),
            rec("Bella", "Dog", "09/09/2022"),
        ]
    }

    #[test]
    fn test_partition_groups_by_year_and_species() {
        let partition = YearPartition::build(&sample());

        assert_eq!(partition.year_list(), vec![2022, 2023]);
        let y2022 = partition.year(2022).unwrap();
        assert_eq!(y2022.count(), 3);
        // Dog appears before Cat in the register
        let species: Vec<&str> = y2022.species.iter().map(|g| g.species.as_str()).collect();
        assert_eq!(species, vec!["Dog", "Cat"]);
        assert_eq!(y2022.group("Dog").unwrap().rows, vec![0, 4]);
        assert_eq!(y2022.group("Cat").unwrap().rows, vec![1]);
    }

    #[test]
    fn test_undated_rows_in_no_bucket() {
        let partition = YearPartition::build(&sample());
        assert_eq!(partition.undated, vec![3]);
        for year in &partition.years {
            for group in &year.species {
                assert!(!group.rows.contains(&3));
            }
        }
    }

    #[test]
    fn test_every_dated_row_in_exactly_one_matching_bucket() {
        let records = sample();
        let partition = YearPartition::build(&records);
        for (i, record) in records.iter().enumerate() {
            let hits: Vec<(i32, &str)> = partition
                .years
                .iter()
                .flat_map(|y| {
                    y.species
                        .iter()
                        .filter(|g| g.rows.contains(&i))
                        .map(move |g| (y.year, g.species.as_str()))
                })
                .collect();
            match record.year() {
                Some(year) => assert_eq!(hits, vec![(year, record.species.as_str())]),
                None => assert!(hits.is_empty()),
            }
        }
    }

    #[test]
    fn test_count_table_zero_fill() {
        let table = CountTable::build(&sample());

        assert_eq!(table.years, vec![2022, 2023]);
        assert_eq!(table.species, vec!["Cat", "Chicken", "Dog"]);
        assert_eq!(table.counts, vec![vec![1, 0, 2], vec![0, 1, 0]]);
        assert_eq!(table.get(2023, "Dog"), Some(0));
        assert_eq!(table.get(2024, "Dog"), None);
        assert_eq!(table.year_total(2022), Some(3));
    }

    #[test]
    fn test_count_table_has_full_cross_product() {
        let table = CountTable::build(&sample());
        for year in &table.years {
            for species in &table.species {
                assert!(table.get(*year, species).is_some());
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(YearPartition::build(&[]), YearPartition::default());
        assert!(CountTable::build(&[]).is_empty());
    }

    #[test]
    fn test_native_dates_count_too() {
        let records = vec![Record::new("Daisy", "Cow")
            .with_acquired(NaiveDate::from_ymd_opt(2019, 4, 1).unwrap())];
        let table = CountTable::build(&records);
        assert_eq!(table.get(2019, "Cow"), Some(1));
    }
}
