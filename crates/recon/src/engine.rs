use std::collections::HashSet;

use log::info;
use serde_json::Value;

use crate::config::{DataFormat, DatasetConfig, ReconConfig};
use crate::derived::apply_derived;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::{match_players, MatchOptions};
use crate::merge::merge;
use crate::model::{
    Dataset, MatchOutput, MergedTable, PlayerRecord, ReconInput, ReconMeta, ReconResult,
};
use crate::teams::TeamNormalizer;

/// Intermediate products of one pass over both datasets.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Secondary dataset with canonical team labels.
    pub secondary: Dataset,
    pub output: MatchOutput,
    pub merged: MergedTable,
}

/// Run reconciliation per config. Returns matches, drops, merged rows + summary.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let normalizer = TeamNormalizer::from_config(&config.teams);
    let options = MatchOptions::from(config);

    let reconciled = reconcile(&input.primary, &input.secondary, &normalizer, &options)?;
    let summary = compute_summary(
        &input.primary,
        &reconciled.secondary,
        &reconciled.output,
        &reconciled.merged,
    );

    info!(
        "'{}': {} primary, {} secondary, {} matched, {} merged, {} dropped",
        config.name,
        summary.primary_records,
        summary.secondary_records,
        summary.matched,
        summary.merged,
        summary.dropped()
    );

    let Reconciled { output, merged, .. } = reconciled;
    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            threshold: options.threshold,
            one_to_one: options.one_to_one,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        matches: output.matches,
        unmatched: output.unmatched,
        merged,
    })
}

/// Two datasets in, merged dataset out, with the built-in aliases and the
/// default threshold.
pub fn pipeline(primary: &Dataset, secondary: &Dataset) -> Result<MergedTable, ReconError> {
    reconcile(
        primary,
        secondary,
        &TeamNormalizer::builtin(),
        &MatchOptions::default(),
    )
    .map(|r| r.merged)
}

/// Normalize teams, match, merge. Fails only on malformed input.
pub fn reconcile(
    primary: &Dataset,
    secondary: &Dataset,
    normalizer: &TeamNormalizer,
    options: &MatchOptions,
) -> Result<Reconciled, ReconError> {
    validate_records(primary)?;
    validate_records(secondary)?;

    let secondary = normalizer.normalize(secondary);
    let output = match_players(primary, &secondary, options);
    let merged = merge(primary, &secondary, &output.matches);

    Ok(Reconciled {
        secondary,
        output,
        merged,
    })
}

/// Every record needs a name, a team and one cell per column.
pub fn validate_records(dataset: &Dataset) -> Result<(), ReconError> {
    for (i, record) in dataset.records.iter().enumerate() {
        let malformed = |field: &str| ReconError::MalformedRecord {
            dataset: dataset.label.clone(),
            row: i + 1,
            field: field.into(),
        };
        if record.name.trim().is_empty() {
            return Err(malformed("name"));
        }
        if record.team.trim().is_empty() {
            return Err(malformed("team"));
        }
        if record.fields.len() != dataset.columns.len() {
            return Err(malformed("fields"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Rows of strings under a header, before column mapping.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Load one dataset from CSV or JSON text, applying column mapping, drops,
/// derived columns and the optional name sort.
pub fn load_dataset(
    label: &str,
    data: &str,
    dataset_config: &DatasetConfig,
) -> Result<Dataset, ReconError> {
    let table = match dataset_config.format {
        DataFormat::Csv => read_csv_table(data)?,
        DataFormat::Json => read_json_table(label, data)?,
    };
    let mut dataset = shape_dataset(label, table, dataset_config)?;

    apply_derived(&mut dataset, &dataset_config.derived)?;

    if dataset_config.sort_by_name {
        dataset.records.sort_by(|a, b| a.name.cmp(&b.name));
    }

    info!(
        "loaded {} record(s), {} column(s) into '{label}' ({})",
        dataset.records.len(),
        dataset.columns.len(),
        dataset_config.format
    );
    Ok(dataset)
}

fn read_csv_table(data: &str) -> Result<RawTable, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

/// A JSON array of objects. Nested objects flatten to dotted keys; columns
/// appear in first-seen order and absent keys read as empty.
fn read_json_table(label: &str, data: &str) -> Result<RawTable, ReconError> {
    let value: Value = serde_json::from_str(data).map_err(|e| ReconError::Io(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ReconError::Io(format!(
            "dataset '{label}': expected a JSON array of objects"
        )));
    };

    let mut headers: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut flat_rows = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let Value::Object(_) = item else {
            return Err(ReconError::MalformedRecord {
                dataset: label.into(),
                row: i + 1,
                field: "record".into(),
            });
        };
        let mut flat = Vec::new();
        flatten_json("", item, &mut flat);
        for (key, _) in &flat {
            if seen.insert(key.clone()) {
                headers.push(key.clone());
            }
        }
        flat_rows.push(flat);
    }

    let rows = flat_rows
        .into_iter()
        .map(|flat| {
            let mut row = vec![String::new(); headers.len()];
            for (key, value) in flat {
                if let Some(idx) = headers.iter().position(|h| *h == key) {
                    row[idx] = value;
                }
            }
            row
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn flatten_json(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_json(&path, child, out);
            }
        }
        Value::Null => out.push((prefix.to_string(), String::new())),
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

fn shape_dataset(
    label: &str,
    table: RawTable,
    dataset_config: &DatasetConfig,
) -> Result<Dataset, ReconError> {
    let cols = &dataset_config.columns;
    let idx = |name: &str| -> Result<usize, ReconError> {
        table
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReconError::MissingColumn {
                dataset: label.into(),
                column: name.into(),
            })
    };

    let name_idx: Vec<usize> = cols
        .name_sources()
        .into_iter()
        .map(idx)
        .collect::<Result<_, _>>()?;
    let team_idx = idx(&cols.team)?;

    let dropped: HashSet<&str> = dataset_config.drop.iter().map(String::as_str).collect();
    let carried: Vec<usize> = (0..table.headers.len())
        .filter(|i| !name_idx.contains(i) && *i != team_idx)
        .filter(|i| !dropped.contains(table.headers[*i].as_str()))
        .collect();

    let columns = carried.iter().map(|&i| table.headers[i].clone()).collect();
    let mut dataset = Dataset::new(label, columns);

    for (i, row) in table.rows.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).map_or("", |v| v.trim());

        let name = name_idx
            .iter()
            .map(|&ni| cell(ni))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let team = cell(team_idx).to_string();

        for (field, value) in [("name", &name), ("team", &team)] {
            if value.is_empty() {
                return Err(ReconError::MalformedRecord {
                    dataset: label.into(),
                    row: i + 1,
                    field: field.into(),
                });
            }
        }

        dataset.records.push(PlayerRecord {
            name,
            team,
            fields: carried
                .iter()
                .map(|&ci| row.get(ci).cloned().unwrap_or_default())
                .collect(),
        });
    }

    Ok(dataset)
}
