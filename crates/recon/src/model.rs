use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single player row. `fields` is aligned with the owning dataset's
/// `columns` and carried through the pipeline untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub fields: Vec<String>,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// A tabular player dataset: identity columns (`name`, `team`) plus an
/// ordered set of opaque performance columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub columns: Vec<String>,
    pub records: Vec<PlayerRecord>,
}

impl Dataset {
    pub fn new(label: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            label: label.into(),
            columns,
            records: Vec::new(),
        }
    }

    pub fn with_records(mut self, records: Vec<PlayerRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of `column` for the record at `row`, if both exist.
    pub fn field(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.records.get(row)?.fields.get(idx).map(String::as_str)
    }
}

/// Both sides of a run, already loaded and shaped.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub primary: Dataset,
    pub secondary: Dataset,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// An accepted pairing of one primary record with its best secondary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    pub primary_index: usize,
    pub primary_name: String,
    pub secondary_index: usize,
    pub secondary_name: String,
    pub team: String,
    pub score: u32,
}

/// Accepted matches in primary iteration order, at most one per primary record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchTable {
    rows: Vec<MatchCandidate>,
}

impl MatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a match. Rows must arrive in primary order; a second row for
    /// the same primary record is a logic error upstream.
    pub fn push(&mut self, candidate: MatchCandidate) {
        debug_assert!(
            self.rows
                .last()
                .map_or(true, |last| last.primary_index < candidate.primary_index),
            "match table rows must follow primary order"
        );
        self.rows.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchCandidate> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[MatchCandidate] {
        &self.rows
    }

    pub fn primary_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|m| m.primary_name.as_str())
    }

    pub fn secondary_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|m| m.secondary_name.as_str())
    }

    pub fn for_primary(&self, primary_index: usize) -> Option<&MatchCandidate> {
        self.rows
            .binary_search_by_key(&primary_index, |m| m.primary_index)
            .ok()
            .map(|i| &self.rows[i])
    }
}

impl<'a> IntoIterator for &'a MatchTable {
    type Item = &'a MatchCandidate;
    type IntoIter = std::slice::Iter<'a, MatchCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// No secondary record shares the primary record's team.
    EmptyCandidateSet,
    /// Candidates exist but none scored above the threshold.
    NoQualifyingCandidate,
    /// One-to-one mode: every same-team candidate was claimed earlier.
    AllCandidatesClaimed,
}

impl std::fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCandidateSet => write!(f, "empty_candidate_set"),
            Self::NoQualifyingCandidate => write!(f, "no_qualifying_candidate"),
            Self::AllCandidatesClaimed => write!(f, "all_candidates_claimed"),
        }
    }
}

/// Best rejected candidate for a dropped primary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedCandidate {
    pub secondary_index: usize,
    pub secondary_name: String,
    pub score: u32,
}

/// A primary record that produced no match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unmatched {
    pub primary_index: usize,
    pub name: String,
    pub team: String,
    pub reason: UnmatchedReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<RejectedCandidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchOutput {
    pub matches: MatchTable,
    pub unmatched: Vec<Unmatched>,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// One joined player. `values` is aligned with `MergedTable::columns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub name: String,
    pub team: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedTable {
    /// Performance columns: primary first, then secondary.
    pub columns: Vec<String>,
    pub rows: Vec<MergedRecord>,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full header including the join keys.
    pub fn header(&self) -> Vec<&str> {
        let mut header = vec!["name", "team"];
        header.extend(self.columns.iter().map(String::as_str));
        header
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.values.get(idx).map(String::as_str)
    }

    pub fn find(&self, name: &str, team: &str) -> Option<&MergedRecord> {
        self.rows.iter().find(|r| r.name == name && r.team == team)
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub primary_records: usize,
    pub secondary_records: usize,
    pub matched: usize,
    pub merged: usize,
    pub empty_candidate_set: usize,
    pub no_qualifying_candidate: usize,
    pub all_candidates_claimed: usize,
    /// Secondary records claimed by more than one primary record.
    pub contested_secondary: usize,
    /// Normalized secondary team labels absent from the primary vocabulary.
    pub unresolved_teams: Vec<String>,
}

impl ReconSummary {
    pub fn dropped(&self) -> usize {
        self.empty_candidate_set + self.no_qualifying_candidate + self.all_candidates_claimed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub threshold: u32,
    pub one_to_one: bool,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub matches: MatchTable,
    pub unmatched: Vec<Unmatched>,
    pub merged: MergedTable,
}
