//! Inner join of the two datasets through the match table.
//!
//! Each matched primary record takes the secondary-side name as its join
//! key; the join then runs on `(name, team)` against the secondary records
//! named in the match table. Unjoined rows are dropped, never padded.

use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::model::{Dataset, MatchTable, MergedRecord, MergedTable};

/// Join `primary` and `secondary` on the keys established by `matches`.
///
/// Rows come out in match-table order (primary order). Columns are the
/// primary performance columns followed by the secondary ones; a name
/// present on both sides gets `_x` / `_y` suffixes.
pub fn merge(primary: &Dataset, secondary: &Dataset, matches: &MatchTable) -> MergedTable {
    let columns = joined_columns(&primary.columns, &secondary.columns);

    let wanted: HashSet<&str> = matches.secondary_names().collect();
    let mut by_key: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (si, record) in secondary.records.iter().enumerate() {
        if wanted.contains(record.name.as_str()) {
            by_key
                .entry((record.name.as_str(), record.team.as_str()))
                .or_default()
                .push(si);
        }
    }

    let mut rows = Vec::with_capacity(matches.len());
    for m in matches {
        let Some(left) = primary.records.get(m.primary_index) else {
            warn!("match for '{}' points past the primary dataset", m.primary_name);
            continue;
        };
        let key = (m.secondary_name.as_str(), left.team.as_str());
        let Some(partners) = by_key.get(&key) else {
            continue;
        };
        if partners.len() > 1 {
            warn!(
                "join key ('{}', '{}') appears {} times in '{}'",
                key.0,
                key.1,
                partners.len(),
                secondary.label
            );
        }

        for &si in partners {
            let right = &secondary.records[si];
            let mut values = Vec::with_capacity(columns.len());
            values.extend(padded(&left.fields, primary.columns.len()));
            values.extend(padded(&right.fields, secondary.columns.len()));
            rows.push(MergedRecord {
                name: m.secondary_name.clone(),
                team: left.team.clone(),
                values,
            });
        }
    }

    info!("merged {} row(s) from {} match(es)", rows.len(), matches.len());

    MergedTable { columns, rows }
}

/// Output column names, suffixing collisions `_x` (primary) / `_y` (secondary).
pub fn joined_columns(left: &[String], right: &[String]) -> Vec<String> {
    let left_set: HashSet<&str> = left.iter().map(String::as_str).collect();
    let right_set: HashSet<&str> = right.iter().map(String::as_str).collect();

    let left_cols = left.iter().map(|c| {
        if right_set.contains(c.as_str()) {
            format!("{c}_x")
        } else {
            c.clone()
        }
    });
    let right_cols = right.iter().map(|c| {
        if left_set.contains(c.as_str()) {
            format!("{c}_y")
        } else {
            c.clone()
        }
    });
    left_cols.chain(right_cols).collect()
}

fn padded(fields: &[String], width: usize) -> impl Iterator<Item = String> + '_ {
    fields
        .iter()
        .cloned()
        .chain(std::iter::repeat(String::new()))
        .take(width)
}
