use crate::codeforces::model::{problem_id, Contest, Problem, ProblemType, Submission, Verdict};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-problem aggregate derived from the submission history. One entry per
/// problem identity, rebuilt from scratch on every load cycle.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProblemStatus {
    pub solved: bool,
    pub attempts: u32,
    pub last_submission: i64,
    pub last_verdict: Option<Verdict>,
    /// Whether the first accepted submission fell inside the contest's live
    /// window. Never recomputed by later resubmissions.
    pub during_contest: bool,
    pub tags: Vec<String>,
    pub rating: Option<i64>,
    pub problem_type: Option<ProblemType>,
}

impl ProblemStatus {
    fn seed(problem: &Problem) -> Self {
        ProblemStatus {
            solved: false,
            attempts: 0,
            last_submission: 0,
            last_verdict: None,
            during_contest: false,
            tags: problem.tags.clone(),
            rating: problem.rating,
            problem_type: Some(problem.problem_type),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct StatusIndex {
    pub solved: BTreeSet<String>,
    pub unsolved: BTreeSet<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimeIndexEntry {
    pub problem_id: String,
    pub timestamp: i64,
    pub contest_id: Option<i64>,
    pub verdict: Verdict,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct TimeIndex {
    pub submissions: Vec<TimeIndexEntry>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct DailyActivity {
    /// Problems whose first accepted submission happened on this date.
    pub problems: BTreeSet<String>,
    /// Highest rating among them, 0 when none of them is rated.
    pub max_rating: i64,
}

/// The query-ready aggregate the rendering layer reads. Built once per load
/// cycle from a complete submissions+contests snapshot and immutable
/// afterwards.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct FilteredProblems {
    pub by_status: StatusIndex,
    pub by_tag: BTreeMap<String, BTreeSet<String>>,
    pub by_rating: BTreeMap<i64, BTreeSet<String>>,
    pub by_contest: BTreeMap<i64, BTreeSet<String>>,
    pub by_time: TimeIndex,
    pub by_date: BTreeMap<NaiveDate, DailyActivity>,
    pub statuses: BTreeMap<String, ProblemStatus>,
}

struct ContestWindow {
    start: i64,
    end: i64,
}

impl ContestWindow {
    /// Both bounds inclusive: a submission at the exact start or end second
    /// counts as during-contest.
    fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Difficulty rating rounded to the nearest 100, half up: 1249 -> 1200,
/// 1250 -> 1300.
pub fn rating_bucket(rating: i64) -> i64 {
    (rating + 50) / 100 * 100
}

fn utc_date(timestamp: i64) -> Option<NaiveDate> {
    NaiveDateTime::from_timestamp_opt(timestamp, 0).map(|datetime| datetime.date())
}

fn valid_parts(submission: &Submission) -> Option<(&Problem, i64, Verdict)> {
    match (
        submission.problem.as_ref(),
        submission.creation_time_seconds,
        submission.verdict,
    ) {
        (Some(problem), Some(created_at), Some(verdict)) => {
            Some((problem, created_at, verdict))
        }
        _ => None,
    }
}

impl FilteredProblems {
    /// Ingests the raw submission and contest lists and derives every index.
    /// Total over well-typed input: malformed submissions are dropped and
    /// counted, never surfaced as an error.
    pub fn build(submissions: &[Submission], contests: &[Contest]) -> FilteredProblems {
        let mut filters = FilteredProblems::default();

        let contest_windows: HashMap<i64, ContestWindow> = contests
            .iter()
            .filter_map(|contest| {
                match (contest.start_time_seconds, contest.duration_seconds) {
                    (Some(start), Some(duration)) => {
                        Some((contest.id, ContestWindow { start, end: start + duration }))
                    }
                    _ => None,
                }
            })
            .collect();

        let mut valid: Vec<(&Submission, &Problem, i64, Verdict)> = Vec::new();
        let mut invalid_submissions: usize = 0;
        for submission in submissions {
            match valid_parts(submission) {
                Some((problem, created_at, verdict)) => {
                    valid.push((submission, problem, created_at, verdict))
                }
                None => invalid_submissions += 1,
            }
        }

        // First pass in input order: every identity starts out unsolved with
        // status metadata seeded from the first submission that mentions it.
        for (submission, problem, _, _) in &valid {
            let id = problem_id(submission.contest_id, &problem.index);
            if !filters.statuses.contains_key(&id) {
                filters.by_status.unsolved.insert(id.clone());
                filters.statuses.insert(id, ProblemStatus::seed(problem));
            }
        }

        // Second pass in chronological order. The sort must be stable so
        // submissions sharing a timestamp keep their original relative order.
        valid.sort_by_key(|(_, _, created_at, _)| *created_at);

        for (submission, problem, created_at, verdict) in valid {
            let id = problem_id(submission.contest_id, &problem.index);

            let newly_solved = {
                let status = filters
                    .statuses
                    .entry(id.clone())
                    .or_insert_with(|| ProblemStatus::seed(problem));

                status.attempts += 1;
                status.last_submission = created_at;
                status.last_verdict = Some(verdict);
                // Upstream problem metadata can differ between submissions of
                // the same problem; the most recently processed one wins.
                if problem.rating.is_some() {
                    status.rating = problem.rating;
                }
                if !problem.tags.is_empty() {
                    status.tags = problem.tags.clone();
                }

                let newly_solved = verdict.is_accepted() && !status.solved;
                if newly_solved {
                    status.solved = true;
                    status.during_contest = submission
                        .contest_id
                        .and_then(|contest_id| contest_windows.get(&contest_id))
                        .map(|window| window.contains(created_at))
                        .unwrap_or(false);
                }
                newly_solved
            };

            if newly_solved {
                filters.by_status.unsolved.remove(&id);
                filters.by_status.solved.insert(id.clone());

                if let Some(date) = utc_date(created_at) {
                    let day = filters.by_date.entry(date).or_default();
                    day.problems.insert(id.clone());
                    if let Some(rating) = problem.rating {
                        day.max_rating = day.max_rating.max(rating);
                    }
                }
            }

            filters.by_time.submissions.push(TimeIndexEntry {
                problem_id: id.clone(),
                timestamp: created_at,
                contest_id: submission.contest_id,
                verdict,
            });

            for tag in &problem.tags {
                filters
                    .by_tag
                    .entry(tag.clone())
                    .or_default()
                    .insert(id.clone());
            }

            if let Some(rating) = problem.rating {
                filters
                    .by_rating
                    .entry(rating_bucket(rating))
                    .or_default()
                    .insert(id.clone());
            }

            if let Some(contest_id) = submission.contest_id {
                filters
                    .by_contest
                    .entry(contest_id)
                    .or_default()
                    .insert(id.clone());
            }
        }

        tracing::info!(
            "built problem filters: {} submissions ({} invalid), {} problems ({} solved / {} unsolved), {} tags, {} rating buckets, {} contests, {} active days",
            submissions.len(),
            invalid_submissions,
            filters.statuses.len(),
            filters.by_status.solved.len(),
            filters.by_status.unsolved.len(),
            filters.by_tag.len(),
            filters.by_rating.len(),
            filters.by_contest.len(),
            filters.by_date.len(),
        );

        filters
    }

    /// How many problems of each tag are solved (or unsolved). Tags whose
    /// count comes out zero are omitted rather than reported as 0.
    pub fn tag_counts(&self, solved: bool) -> BTreeMap<String, usize> {
        let relevant = if solved {
            &self.by_status.solved
        } else {
            &self.by_status.unsolved
        };

        self.by_tag
            .iter()
            .filter_map(|(tag, problems)| {
                let count = problems.intersection(relevant).count();
                if count > 0 {
                    Some((tag.clone(), count))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Same projection as [`tag_counts`](Self::tag_counts), keyed by rating
    /// bucket.
    pub fn rating_counts(&self, solved: bool) -> BTreeMap<i64, usize> {
        let relevant = if solved {
            &self.by_status.solved
        } else {
            &self.by_status.unsolved
        };

        self.by_rating
            .iter()
            .filter_map(|(bucket, problems)| {
                let count = problems.intersection(relevant).count();
                if count > 0 {
                    Some((*bucket, count))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Unsolved problem identities with their ratings, rated ones first in
    /// ascending order, unrated ones last.
    pub fn unsolved_by_rating(&self) -> Vec<(String, Option<i64>)> {
        let mut problems: Vec<(String, Option<i64>)> = self
            .by_status
            .unsolved
            .iter()
            .map(|id| {
                let rating = self.statuses.get(id).and_then(|status| status.rating);
                (id.clone(), rating)
            })
            .collect();

        problems.sort_by_key(|(_, rating)| match rating {
            Some(rating) => (0, *rating),
            None => (1, 0),
        });

        problems
    }
}
