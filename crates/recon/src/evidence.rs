use std::collections::BTreeSet;

use log::warn;

use crate::matcher::contested_secondary;
use crate::model::{Dataset, MatchOutput, MergedTable, ReconSummary, UnmatchedReason};

/// Secondary team labels (already normalized) that no primary record uses.
/// Every player under such a label is unmatchable.
pub fn unresolved_teams(primary: &Dataset, secondary: &Dataset) -> Vec<String> {
    let vocabulary: BTreeSet<&str> = primary.records.iter().map(|r| r.team.as_str()).collect();
    let unresolved: BTreeSet<&str> = secondary
        .records
        .iter()
        .map(|r| r.team.as_str())
        .filter(|team| !vocabulary.contains(team))
        .collect();
    unresolved.into_iter().map(str::to_string).collect()
}

/// Compute summary statistics and diagnostics for a run.
pub fn compute_summary(
    primary: &Dataset,
    secondary: &Dataset,
    output: &MatchOutput,
    merged: &MergedTable,
) -> ReconSummary {
    let mut empty_candidate_set = 0;
    let mut no_qualifying_candidate = 0;
    let mut all_candidates_claimed = 0;
    for u in &output.unmatched {
        match u.reason {
            UnmatchedReason::EmptyCandidateSet => empty_candidate_set += 1,
            UnmatchedReason::NoQualifyingCandidate => no_qualifying_candidate += 1,
            UnmatchedReason::AllCandidatesClaimed => all_candidates_claimed += 1,
        }
    }

    let contested = contested_secondary(&output.matches);
    for &si in &contested {
        if let Some(record) = secondary.records.get(si) {
            warn!(
                "secondary record '{}' ({}) claimed by more than one primary record",
                record.name, record.team
            );
        }
    }

    let unresolved = unresolved_teams(primary, secondary);
    for team in &unresolved {
        warn!("team label '{team}' has no counterpart in '{}'", primary.label);
    }

    ReconSummary {
        primary_records: primary.records.len(),
        secondary_records: secondary.records.len(),
        matched: output.matches.len(),
        merged: merged.len(),
        empty_candidate_set,
        no_qualifying_candidate,
        all_candidates_claimed,
        contested_secondary: contested.len(),
        unresolved_teams: unresolved,
    }
}
