use serde::{Deserialize, Serialize};

/// Scoring system used for the contest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestType {
    Cf,
    Ioi,
    Icpc,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestPhase {
    Before,
    Coding,
    PendingSystemTest,
    SystemTest,
    Finished,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemType {
    Programming,
    Question,
}

/// Judged outcome of a submission. Absence on the wire means the submission
/// is still in the judging queue. Verdict strings the API may introduce
/// later deserialize to `Failed` instead of breaking the whole response.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Ok,
    Partial,
    CompilationError,
    RuntimeError,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    IdlenessLimitExceeded,
    SecurityViolated,
    Crashed,
    InputPreparationCrashed,
    Challenged,
    Skipped,
    Testing,
    Rejected,
    Submitted,
    #[serde(other)]
    Failed,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Ok)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Contest {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub contest_type: ContestType,
    pub phase: ContestPhase,
    /// Contest start in unix seconds. Can be absent for unscheduled gyms.
    #[serde(alias = "startTimeSeconds")]
    pub start_time_seconds: Option<i64>,
    #[serde(alias = "durationSeconds")]
    pub duration_seconds: Option<i64>,
}

impl Contest {
    /// A contest can participate in during-contest detection only when its
    /// live window is fully known.
    pub fn is_timed(&self) -> bool {
        self.start_time_seconds.is_some() && self.duration_seconds.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Problem {
    #[serde(alias = "contestId")]
    pub contest_id: Option<i64>,
    /// In-contest label, e.g. "A" or "B2".
    pub index: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub problem_type: ProblemType,
    /// Maximum score for IOI-style problems.
    pub points: Option<f64>,
    /// Difficulty rating. Absent until the problem gets rated.
    pub rating: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: i64,
    #[serde(alias = "contestId")]
    pub contest_id: Option<i64>,
    #[serde(alias = "creationTimeSeconds")]
    pub creation_time_seconds: Option<i64>,
    #[serde(alias = "relativeTimeSeconds")]
    pub relative_time_seconds: Option<i64>,
    pub problem: Option<Problem>,
    #[serde(alias = "programmingLanguage")]
    pub programming_language: Option<String>,
    pub verdict: Option<Verdict>,
}

impl Submission {
    /// Submissions missing problem data, a creation time or the verdict
    /// field are dropped before indexing.
    pub fn is_valid(&self) -> bool {
        self.problem.is_some()
            && self.creation_time_seconds.is_some()
            && self.verdict.is_some()
    }

    /// The identity the indexes are keyed by. None when the submission has
    /// no problem attached.
    pub fn problem_id(&self) -> Option<String> {
        self.problem
            .as_ref()
            .map(|problem| problem_id(self.contest_id, &problem.index))
    }
}

/// Derives the stable problem identity from a submission's contest id and
/// in-contest index. Two submissions with the same contest and index refer
/// to the same logical problem.
pub fn problem_id(contest_id: Option<i64>, index: &str) -> String {
    match contest_id {
        Some(contest_id) => format!("{}-{}", contest_id, index),
        None => String::from(index),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub handle: String,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    pub contribution: i64,
    /// Absent for accounts that never took part in a rated contest.
    pub rank: Option<String>,
    pub rating: Option<i64>,
    #[serde(alias = "maxRank")]
    pub max_rank: Option<String>,
    #[serde(alias = "maxRating")]
    pub max_rating: Option<i64>,
    #[serde(alias = "lastOnlineTimeSeconds")]
    pub last_online_time_seconds: i64,
    #[serde(alias = "registrationTimeSeconds")]
    pub registration_time_seconds: i64,
    #[serde(alias = "friendOfCount")]
    pub friend_of_count: i64,
    pub avatar: Option<String>,
    #[serde(alias = "titlePhoto")]
    pub title_photo: Option<String>,
}
