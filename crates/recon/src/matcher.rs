use std::collections::HashMap;

use log::{debug, info};

use crate::config::{ReconConfig, DEFAULT_THRESHOLD};
use crate::model::{
    Dataset, MatchCandidate, MatchOutput, MatchTable, RejectedCandidate, Unmatched,
    UnmatchedReason,
};
use crate::similarity::score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// A candidate is accepted only when its score is strictly greater.
    pub threshold: u32,
    /// Skip secondary records already claimed by an earlier primary record.
    pub one_to_one: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            one_to_one: false,
        }
    }
}

impl From<&ReconConfig> for MatchOptions {
    fn from(config: &ReconConfig) -> Self {
        Self {
            threshold: config.threshold,
            one_to_one: config.one_to_one,
        }
    }
}

/// Find the best same-team secondary record for each primary record.
///
/// `secondary` must already carry canonical team labels. Candidates are
/// scored with `score(secondary.name, primary.name)`; the running best is
/// replaced only on a strictly greater score, so the first-seen candidate
/// wins ties.
pub fn match_players(primary: &Dataset, secondary: &Dataset, options: &MatchOptions) -> MatchOutput {
    let mut by_team: HashMap<&str, Vec<usize>> = HashMap::new();
    for (si, record) in secondary.records.iter().enumerate() {
        by_team.entry(record.team.as_str()).or_default().push(si);
    }

    let mut claimed = vec![false; secondary.records.len()];
    let mut matches = MatchTable::new();
    let mut unmatched = Vec::new();

    for (pi, player) in primary.records.iter().enumerate() {
        let Some(candidates) = by_team.get(player.team.as_str()) else {
            debug!(
                "'{}' ({}): no secondary records on this team",
                player.name, player.team
            );
            unmatched.push(Unmatched {
                primary_index: pi,
                name: player.name.clone(),
                team: player.team.clone(),
                reason: UnmatchedReason::EmptyCandidateSet,
                best: None,
            });
            continue;
        };

        let best = candidates
            .iter()
            .copied()
            .filter(|&si| !(options.one_to_one && claimed[si]))
            .map(|si| (si, score(&secondary.records[si].name, &player.name)))
            .fold(None, |best: Option<(usize, u32)>, (si, s)| match best {
                Some((_, best_score)) if s <= best_score => best,
                _ => Some((si, s)),
            });

        match best {
            Some((si, s)) if s > options.threshold => {
                claimed[si] = true;
                matches.push(MatchCandidate {
                    primary_index: pi,
                    primary_name: player.name.clone(),
                    secondary_index: si,
                    secondary_name: secondary.records[si].name.clone(),
                    team: player.team.clone(),
                    score: s,
                });
            }
            Some((si, s)) => {
                debug!(
                    "'{}' ({}): best candidate '{}' scored {}, at or below threshold {}",
                    player.name,
                    player.team,
                    secondary.records[si].name,
                    s,
                    options.threshold
                );
                unmatched.push(Unmatched {
                    primary_index: pi,
                    name: player.name.clone(),
                    team: player.team.clone(),
                    reason: UnmatchedReason::NoQualifyingCandidate,
                    best: Some(RejectedCandidate {
                        secondary_index: si,
                        secondary_name: secondary.records[si].name.clone(),
                        score: s,
                    }),
                });
            }
            None => {
                debug!(
                    "'{}' ({}): every candidate on this team is already claimed",
                    player.name, player.team
                );
                unmatched.push(Unmatched {
                    primary_index: pi,
                    name: player.name.clone(),
                    team: player.team.clone(),
                    reason: UnmatchedReason::AllCandidatesClaimed,
                    best: None,
                });
            }
        }
    }

    info!(
        "matched {} of {} primary record(s) (threshold {}, one_to_one={})",
        matches.len(),
        primary.records.len(),
        options.threshold,
        options.one_to_one
    );

    MatchOutput { matches, unmatched }
}

/// Secondary indices claimed by more than one accepted match.
pub fn contested_secondary(matches: &MatchTable) -> Vec<usize> {
    let mut claims: HashMap<usize, usize> = HashMap::new();
    for m in matches {
        *claims.entry(m.secondary_index).or_insert(0) += 1;
    }
    let mut contested: Vec<usize> = claims
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(si, _)| si)
        .collect();
    contested.sort_unstable();
    contested
}
