//! Attach problems to the dangers they were assessed with.

use avy_varsom::{
    danger::{AvalancheDanger, SourceKind},
    problem::AvalancheProblem,
    region::NOT_GIVEN,
};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Synthesize a level 0 danger for problems with no matching danger
    /// instead of failing.
    pub allow_orphan_problems: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A problem has no danger for its region and date
    #[error("Problem for region {region_id} on {date} has no matching danger")]
    OrphanProblem { region_id: i32, date: NaiveDate },

    /// An entity of the wrong source kind was passed in
    #[error("Expected {expected} entities, found {found}")]
    SourceMismatch {
        expected: SourceKind,
        found: SourceKind,
    },
}

/// Attach `problems` to `dangers` of one source kind.
///
/// Problems are grouped by region and date. Within a group a problem goes
/// to the danger with the same registration id, or to the first danger of
/// the group in input order. Each danger's problems end up sorted by
/// `order` and the dangers by date then region; both sorts are stable.
pub fn reconcile(
    mut dangers: Vec<AvalancheDanger>,
    problems: Vec<AvalancheProblem>,
    source: SourceKind,
    options: &ReconcileOptions,
) -> Result<Vec<AvalancheDanger>, ReconcileError> {
    let sources = dangers
        .iter()
        .map(|d| d.source)
        .chain(problems.iter().map(|p| p.source));
    for found in sources {
        if found != source {
            return Err(ReconcileError::SourceMismatch {
                expected: source,
                found,
            });
        }
    }

    let mut groups: HashMap<(i32, NaiveDate), Vec<usize>> = HashMap::new();
    for (index, danger) in dangers.iter().enumerate() {
        groups
            .entry((danger.region_id, danger.date))
            .or_default()
            .push(index);
    }

    let mut synthesized = 0;
    for problem in problems {
        let key = (problem.region_id, problem.date);
        let target = match groups.get(&key).and_then(|indices| indices.first()) {
            Some(&first) => problem
                .reg_id
                .and_then(|reg_id| {
                    groups[&key]
                        .iter()
                        .copied()
                        .find(|&i| dangers[i].reg_id == Some(reg_id))
                })
                .unwrap_or(first),
            None => {
                if !options.allow_orphan_problems {
                    return Err(ReconcileError::OrphanProblem {
                        region_id: problem.region_id,
                        date: problem.date,
                    });
                }
                dangers.push(not_given_danger(&problem));
                let index = dangers.len() - 1;
                groups.insert(key, vec![index]);
                synthesized += 1;
                index
            }
        };
        dangers[target].problems.push(problem);
    }
    if synthesized > 0 {
        warn!(
            "Synthesized {} {} dangers for orphan problems",
            synthesized, source
        );
    }

    for danger in dangers.iter_mut() {
        danger.problems.sort_by_key(|p| p.order);
    }
    dangers.sort_by_key(|d| (d.date, d.region_id));
    debug!("Reconciled {} {} dangers", dangers.len(), source);
    Ok(dangers)
}

/// Level 0 danger standing in for an orphan problem's missing assessment.
fn not_given_danger(problem: &AvalancheProblem) -> AvalancheDanger {
    AvalancheDanger {
        region_id: problem.region_id,
        region_name: problem.region_name.clone(),
        source: problem.source,
        schema: problem.schema,
        date: problem.date,
        time: None,
        danger_level: 0,
        danger_level_name: NOT_GIVEN.to_string(),
        main_message: None,
        nick: None,
        reg_id: None,
        forecast_correct: None,
        problems: Vec::new(),
    }
}
