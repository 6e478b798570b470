//! Grouping and reduction of extracted metrics.

use std::cmp::Ordering;
use std::hash::Hash;

use indexmap::IndexMap;
use serde_json::Value;

use crate::compose::ReportRow;

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Running count/sum for one metric in one group.
///
/// `records` counts every record offered, `samples` only those whose metric
/// was present. Averages divide by samples and are 0 for an empty sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tally {
    records: u64,
    samples: u64,
    sum: f64,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers one record; a missing value only bumps the record count.
    pub fn record(&mut self, value: Option<f64>) {
        self.records += 1;
        if let Some(v) = value {
            self.samples += 1;
            self.sum += v;
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        self.records += other.records;
        self.samples += other.samples;
        self.sum += other.sum;
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn average(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.sum / self.samples as f64
        }
    }
}

impl FromIterator<Option<f64>> for Tally {
    fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for value in iter {
            tally.record(value);
        }
        tally
    }
}

// ---------------------------------------------------------------------------
// Language key
// ---------------------------------------------------------------------------

pub const OTHERS_LABEL: &str = "Others";

/// Grouping key for per-language rows. Null and empty languages share the
/// single `Others` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageKey {
    Named(String),
    Others,
}

impl LanguageKey {
    pub fn of(language: Option<&str>) -> Self {
        match language.map(str::trim) {
            Some(l) if !l.is_empty() => Self::Named(l.to_owned()),
            _ => Self::Others,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Named(l) => l,
            Self::Others => OTHERS_LABEL,
        }
    }
}

// ---------------------------------------------------------------------------
// Grouped
// ---------------------------------------------------------------------------

/// Tallies keyed by group, in first-seen order.
#[derive(Debug, Clone)]
pub struct Grouped<K: Hash + Eq> {
    groups: IndexMap<K, Tally>,
}

impl<K: Hash + Eq> Default for Grouped<K> {
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq> Grouped<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures a group exists so it is reported even with no records.
    pub fn touch(&mut self, key: K) -> &mut Tally {
        self.groups.entry(key).or_default()
    }

    pub fn record(&mut self, key: K, value: Option<f64>) {
        self.touch(key).record(value);
    }

    pub fn get(&self, key: &K) -> Option<&Tally> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Tally)> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Reduction of every group.
    pub fn total(&self) -> Tally {
        let mut total = Tally::new();
        for tally in self.groups.values() {
            total.merge(tally);
        }
        total
    }
}

impl<K: Hash + Eq> IntoIterator for Grouped<K> {
    type Item = (K, Tally);
    type IntoIter = indexmap::map::IntoIter<K, Tally>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Groups `items` by `key` and tallies `value` for each.
pub fn group_by<T, K, I, FK, FV>(items: I, mut key: FK, mut value: FV) -> Grouped<K>
where
    K: Hash + Eq,
    I: IntoIterator<Item = T>,
    FK: FnMut(&T) -> K,
    FV: FnMut(&T) -> Option<f64>,
{
    let mut grouped = Grouped::new();
    for item in items {
        grouped.record(key(&item), value(&item));
    }
    grouped
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Orders report cells: missing/null first, then numbers, then strings.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Stable sort of rows by one column. Ties keep their insertion order in
/// both directions.
pub fn sort_rows(rows: &mut [ReportRow], column: &str, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(column), b.get(column));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(name: &str, n: i64) -> ReportRow {
        let mut r = ReportRow::new();
        r.insert("Name".into(), json!(name));
        r.insert("Count".into(), json!(n));
        r
    }

    #[test]
    fn average_of_empty_sample_is_zero() {
        let mut t = Tally::new();
        t.record(None);
        t.record(None);
        assert_eq!(t.records(), 2);
        assert_eq!(t.samples(), 0);
        assert_eq!(t.average(), 0.0);
    }

    #[test]
    fn average_is_sum_over_samples() {
        let t: Tally = [Some(2.0), None, Some(4.0)].into_iter().collect();
        assert_eq!(t.records(), 3);
        assert_eq!(t.samples(), 2);
        assert_eq!(t.sum(), 6.0);
        assert_eq!(t.average(), t.sum() / t.samples() as f64);
    }

    #[test]
    fn missing_word_counts_shrink_sample_not_count() {
        let values: Vec<Option<f64>> = (0..10)
            .map(|i| if i < 6 { Some(10.0) } else { None })
            .collect();
        let t: Tally = values.into_iter().collect();
        assert_eq!(t.records(), 10);
        assert_eq!(t.samples(), 6);
        assert_eq!(t.sum(), 60.0);
    }

    #[test]
    fn null_and_empty_language_pool_into_others() {
        assert_eq!(LanguageKey::of(None), LanguageKey::Others);
        assert_eq!(LanguageKey::of(Some("")), LanguageKey::Others);
        assert_eq!(LanguageKey::of(Some("  ")), LanguageKey::Others);
        assert_eq!(LanguageKey::of(Some("Tamil")).label(), "Tamil");
        assert_eq!(LanguageKey::Others.label(), "Others");
    }

    #[test]
    fn others_bucket_sums_pooled_records() {
        let langs = [None, Some("Hindi"), Some(""), None, Some("Hindi")];
        let grouped = group_by(langs.iter(), |l| LanguageKey::of(**l), |_| Some(1.0));
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.get(&LanguageKey::Others).unwrap().records(), 3);
        assert_eq!(grouped.get(&LanguageKey::Named("Hindi".into())).unwrap().records(), 2);
        assert_eq!(grouped.total().records(), langs.len() as u64);
    }

    #[test]
    fn group_sizes_sum_to_total() {
        let items = [1, 2, 3, 4, 5, 6, 7];
        let grouped = group_by(items.iter(), |n| *n % 3, |n| Some(**n as f64));
        let total: u64 = grouped.iter().map(|(_, t)| t.records()).sum();
        assert_eq!(total, items.len() as u64);
        assert_eq!(grouped.total().sum(), 28.0);
    }

    #[test]
    fn touched_group_reports_zero() {
        let mut g: Grouped<&str> = Grouped::new();
        g.touch("Marathi");
        assert_eq!(g.get(&"Marathi").unwrap().records(), 0);
        assert_eq!(g.get(&"Marathi").unwrap().average(), 0.0);
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let grouped = group_by(["b", "a", "b", "c"], |s| *s, |_| None);
        let keys: Vec<&str> = grouped.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn sort_is_stable_ascending() {
        let mut rows = vec![row("x", 2), row("y", 1), row("z", 2)];
        sort_rows(&mut rows, "Count", false);
        let names: Vec<&Value> = rows.iter().map(|r| &r["Name"]).collect();
        assert_eq!(names, vec![&json!("y"), &json!("x"), &json!("z")]);
    }

    #[test]
    fn sort_is_stable_descending() {
        let mut rows = vec![row("x", 2), row("y", 1), row("z", 2)];
        sort_rows(&mut rows, "Count", true);
        let names: Vec<&Value> = rows.iter().map(|r| &r["Name"]).collect();
        assert_eq!(names, vec![&json!("x"), &json!("z"), &json!("y")]);
    }

    #[test]
    fn compare_values_mixed_types() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(1.5)), Some(&json!(1))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!("a")), Some(&json!("b"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(5)), Some(&json!("a"))), Ordering::Less);
    }
}
