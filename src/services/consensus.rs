//! Majority-vote consensus over a pool.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, Consensus};

struct Tally<'a> {
    answer: &'a str,
    check: bool,
    count: usize,
}

/// Resolve the majority answer of a pool.
///
/// Answers are compared exactly (case-sensitive). The answer with the
/// strictly highest count wins; on a tie the answer seen first in pool order
/// wins. Members sharing an answer must share their `check` value.
pub fn resolve(pool: &[Candidate]) -> DomainResult<Consensus> {
    let mut tallies: Vec<Tally<'_>> = Vec::new();

    for candidate in pool {
        match tallies.iter_mut().find(|t| t.answer == candidate.answer) {
            Some(tally) => {
                if tally.check != candidate.check {
                    return Err(DomainError::InconsistentCheck {
                        answer: candidate.answer.clone(),
                    });
                }
                tally.count += 1;
            }
            None => tallies.push(Tally {
                answer: &candidate.answer,
                check: candidate.check,
                count: 1,
            }),
        }
    }

    let mut winner: Option<&Tally<'_>> = None;
    for tally in &tallies {
        if winner.is_none_or(|w| tally.count > w.count) {
            winner = Some(tally);
        }
    }

    winner
        .map(|w| Consensus {
            answer: w.answer.to_string(),
            check: w.check,
        })
        .ok_or(DomainError::EmptyPool)
}

/// Number of pool members whose answer is correct.
pub fn correct_members(pool: &[Candidate]) -> usize {
    pool.iter().filter(|c| c.check).count()
}
