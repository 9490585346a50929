use anyhow::{Context, Result};
use codeforces_profile_libs::{
    codeforces::{
        client::CodeforcesApi,
        model::{Contest, Submission, User},
    },
    filters::FilteredProblems,
    loadable::Loadable,
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    RwLock,
};
use tokio::sync::watch;

/// Everything the presentation layer reads, one `Loadable` per asynchronous
/// resource. Cloned out of the store as a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProfileState {
    pub user: Loadable<User>,
    pub submissions: Loadable<Vec<Submission>>,
    pub contests: Loadable<Vec<Contest>>,
    pub filters: Loadable<FilteredProblems>,
}

/// Owned application state. Task ids come from a process-wide counter so a
/// fetch that was superseded by a newer request can never overwrite the
/// newer result; every applied transition bumps the version published on
/// the watch channel.
pub struct ProfileStore {
    state: RwLock<ProfileState>,
    task_counter: AtomicU64,
    version: watch::Sender<u64>,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        ProfileStore {
            state: RwLock::new(ProfileState::default()),
            task_counter: AtomicU64::new(0),
            version,
        }
    }

    pub fn snapshot(&self) -> ProfileState {
        self.state.read().expect("profile store lock poisoned").clone()
    }

    /// Change notifications for reactive consumers. The value is a version
    /// counter bumped on every applied state transition.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn next_task_id(&self) -> u64 {
        self.task_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn notify(&self) {
        self.version.send_modify(|version| *version += 1);
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ProfileState) -> R) -> R {
        let result = {
            let mut state = self.state.write().expect("profile store lock poisoned");
            f(&mut state)
        };
        self.notify();
        result
    }

    pub fn set_user(&self, user: User) {
        self.with_state(|state| state.user = Loadable::Success { data: user });
    }

    pub fn start_submissions(&self) -> u64 {
        let task_id = self.next_task_id();
        self.with_state(|state| state.submissions.start(task_id));
        task_id
    }

    pub fn finish_submissions(&self, task_id: u64, data: Vec<Submission>) -> bool {
        self.with_state(|state| state.submissions.finish(task_id, data))
    }

    pub fn fail_submissions(&self, task_id: u64, message: impl ToString) -> bool {
        self.with_state(|state| state.submissions.fail(task_id, message))
    }

    pub fn start_contests(&self) -> u64 {
        let task_id = self.next_task_id();
        self.with_state(|state| state.contests.start(task_id));
        task_id
    }

    pub fn finish_contests(&self, task_id: u64, data: Vec<Contest>) -> bool {
        self.with_state(|state| state.contests.finish(task_id, data))
    }

    pub fn fail_contests(&self, task_id: u64, message: impl ToString) -> bool {
        self.with_state(|state| state.contests.fail(task_id, message))
    }

    pub fn start_filters(&self) -> u64 {
        let task_id = self.next_task_id();
        self.with_state(|state| state.filters.start(task_id));
        task_id
    }

    pub fn finish_filters(&self, task_id: u64, data: FilteredProblems) -> bool {
        self.with_state(|state| state.filters.finish(task_id, data))
    }

    pub fn fail_filters(&self, task_id: u64, message: impl ToString) -> bool {
        self.with_state(|state| state.filters.fail(task_id, message))
    }
}

async fn fetch_submissions(
    store: &ProfileStore,
    client: &(impl CodeforcesApi + Sync),
    handle: &str,
) -> Result<Vec<Submission>> {
    let task_id = store.start_submissions();
    match client.user_status(handle).await {
        Ok(submissions) => {
            store.finish_submissions(task_id, submissions.clone());
            Ok(submissions)
        }
        Err(e) => {
            store.fail_submissions(task_id, &e);
            Err(e).context("failed to fetch submission history")
        }
    }
}

async fn fetch_contests(
    store: &ProfileStore,
    client: &(impl CodeforcesApi + Sync),
) -> Result<Vec<Contest>> {
    let task_id = store.start_contests();
    match client.contest_list().await {
        Ok(contests) => {
            store.finish_contests(task_id, contests.clone());
            Ok(contests)
        }
        Err(e) => {
            store.fail_contests(task_id, &e);
            Err(e).context("failed to fetch contest list")
        }
    }
}

/// Loads a user's whole profile: user info first, then the submission
/// history and the contest list in parallel, then one indexing pass over the
/// complete snapshot. The filters entry never holds a partial aggregate; any
/// failure along the way fails it with the underlying message.
pub async fn load_user_data(
    store: &ProfileStore,
    client: &(impl CodeforcesApi + Sync),
    handle: &str,
) -> Result<()> {
    let filters_task = store.start_filters();

    let result = async {
        let user = client
            .user_info(handle)
            .await
            .context("failed to fetch user info")?;
        store.set_user(user);

        let (submissions, contests) = tokio::try_join!(
            fetch_submissions(store, client, handle),
            fetch_contests(store, client),
        )?;

        Ok::<FilteredProblems, anyhow::Error>(FilteredProblems::build(&submissions, &contests))
    }
    .await;

    match result {
        Ok(filters) => {
            store.finish_filters(filters_task, filters);
            Ok(())
        }
        Err(e) => {
            store.fail_filters(filters_task, format!("{:#}", e));
            Err(e)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use codeforces_profile_libs::codeforces::{
        client::CodeforcesError,
        model::{ContestPhase, ContestType, Problem, ProblemType, Verdict},
    };

    fn user(handle: &str) -> User {
        User {
            handle: String::from(handle),
            first_name: None,
            last_name: None,
            country: None,
            city: None,
            organization: None,
            contribution: 0,
            rank: Some(String::from("specialist")),
            rating: Some(1500),
            max_rank: Some(String::from("expert")),
            max_rating: Some(1700),
            last_online_time_seconds: 0,
            registration_time_seconds: 0,
            friend_of_count: 0,
            avatar: None,
            title_photo: None,
        }
    }

    fn accepted_submission() -> Submission {
        Submission {
            id: 1,
            contest_id: Some(100),
            creation_time_seconds: Some(1000),
            relative_time_seconds: None,
            problem: Some(Problem {
                contest_id: Some(100),
                index: String::from("A"),
                name: None,
                problem_type: ProblemType::Programming,
                points: None,
                rating: Some(800),
                tags: vec![String::from("implementation")],
            }),
            programming_language: None,
            verdict: Some(Verdict::Ok),
        }
    }

    struct FakeApi {
        fail_submissions: bool,
    }

    #[async_trait]
    impl CodeforcesApi for FakeApi {
        async fn user_info(&self, handle: &str) -> Result<User, CodeforcesError> {
            Ok(user(handle))
        }

        async fn user_status(&self, _handle: &str) -> Result<Vec<Submission>, CodeforcesError> {
            if self.fail_submissions {
                Err(CodeforcesError::ApiError(String::from(
                    "Call limit exceeded",
                )))
            } else {
                Ok(vec![accepted_submission()])
            }
        }

        async fn contest_list(&self) -> Result<Vec<Contest>, CodeforcesError> {
            Ok(vec![Contest {
                id: 100,
                name: String::from("Round #100"),
                contest_type: ContestType::Cf,
                phase: ContestPhase::Finished,
                start_time_seconds: Some(900),
                duration_seconds: Some(7200),
            }])
        }
    }

    #[test]
    fn test_task_ids_are_monotonic() {
        let store = ProfileStore::new();
        let first = store.start_submissions();
        let second = store.start_contests();
        let third = store.start_filters();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_stale_results_are_dropped() {
        let store = ProfileStore::new();
        let stale = store.start_submissions();
        let current = store.start_submissions();

        assert!(!store.finish_submissions(stale, vec![accepted_submission()]));
        assert!(store.snapshot().submissions.is_loading());

        assert!(store.finish_submissions(current, Vec::new()));
        assert_eq!(store.snapshot().submissions.data(), Some(&Vec::new()));
    }

    #[test]
    fn test_transitions_notify_subscribers() {
        let store = ProfileStore::new();
        let receiver = store.subscribe();
        let before = *receiver.borrow();

        let task_id = store.start_contests();
        store.finish_contests(task_id, Vec::new());

        assert!(*receiver.borrow() > before);
    }

    #[tokio::test]
    async fn test_load_user_data_builds_filters() {
        let store = ProfileStore::new();
        let client = FakeApi {
            fail_submissions: false,
        };

        load_user_data(&store, &client, "tourist").await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.user.data().map(|u| u.handle.as_str()), Some("tourist"));

        let filters = state.filters.data().expect("filters should be built");
        assert!(filters.by_status.solved.contains("100-A"));
        assert!(filters.statuses["100-A"].during_contest);
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_the_filters_task() {
        let store = ProfileStore::new();
        let client = FakeApi {
            fail_submissions: true,
        };

        let result = load_user_data(&store, &client, "tourist").await;
        assert!(result.is_err());

        let state = store.snapshot();
        assert!(state.submissions.error().is_some());
        // no partial aggregate: the filters entry carries the error instead
        assert!(state.filters.error().is_some());
        assert_eq!(state.filters.data(), None);
    }
}
