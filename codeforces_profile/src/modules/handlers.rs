use crate::modules::{
    models::{
        request::{
            CountsQueryParameters, HeatmapQueryParameters, RefreshQueryParameters,
            UnsolvedQueryParameters, ValidatedQueryParameters,
        },
        response::{
            ErrorResponse, HeatmapDay, HeatmapResponse, ProfileSummaryResponse,
            RatingCountsResponse, TagCountsResponse, UnsolvedProblem, UnsolvedResponse,
        },
    },
    store::{self, ProfileState, ProfileStore},
};
use axum::{extract::Extension, http::StatusCode, Json};
use chrono::Datelike;
use codeforces_profile_libs::{
    codeforces::client::RestCodeforcesApi, filters::FilteredProblems, loadable::Loadable,
};
use std::sync::Arc;
use tokio::time::Instant;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// The built aggregate, or the proper error code when nothing is loaded, a
/// load is still in flight, or the last load failed.
fn ready_filters(state: &ProfileState) -> Result<&FilteredProblems, ApiError> {
    match &state.filters {
        Loadable::Success { data } => Ok(data),
        Loadable::Loading { .. } => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("a profile load is in progress")),
        )),
        Loadable::Error { message } => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(message)),
        )),
        Loadable::Idle => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("no profile loaded yet")),
        )),
    }
}

fn summarize(state: &ProfileState) -> Result<ProfileSummaryResponse, ApiError> {
    let filters = ready_filters(state)?;
    let user = state.user.data().ok_or((
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("no user data available")),
    ))?;

    Ok(ProfileSummaryResponse {
        handle: user.handle.clone(),
        rank: user.rank.clone(),
        rating: user.rating,
        max_rank: user.max_rank.clone(),
        max_rating: user.max_rating,
        solved_count: filters.by_status.solved.len(),
        unsolved_count: filters.by_status.unsolved.len(),
        submission_count: filters.by_time.submissions.len(),
        active_days: filters.by_date.len(),
    })
}

pub async fn refresh_profile(
    ValidatedQueryParameters(params): ValidatedQueryParameters<RefreshQueryParameters>,
    Extension(store): Extension<Arc<ProfileStore>>,
    Extension(client): Extension<Arc<RestCodeforcesApi>>,
) -> Result<Json<ProfileSummaryResponse>, ApiError> {
    let start_process = Instant::now();

    if let Err(e) = store::load_user_data(&store, client.as_ref(), &params.handle).await {
        tracing::error!("profile load for {} failed cause: {:#}", params.handle, e);
        return Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(format!("{:#}", e))),
        ));
    }

    let time = Instant::now().duration_since(start_process).as_millis();
    tracing::info!(
        target: "loadlog",
        "elapsed_time={} params={}",
        time,
        serde_json::to_string(&params).unwrap_or(String::from(""))
    );

    summarize(&store.snapshot()).map(Json)
}

pub async fn get_profile(
    Extension(store): Extension<Arc<ProfileStore>>,
) -> Result<Json<ProfileSummaryResponse>, ApiError> {
    summarize(&store.snapshot()).map(Json)
}

pub async fn get_tag_counts(
    ValidatedQueryParameters(params): ValidatedQueryParameters<CountsQueryParameters>,
    Extension(store): Extension<Arc<ProfileStore>>,
) -> Result<Json<TagCountsResponse>, ApiError> {
    let state = store.snapshot();
    let filters = ready_filters(&state)?;

    let solved = params.solved.unwrap_or(true);
    Ok(Json(TagCountsResponse {
        solved,
        counts: filters.tag_counts(solved),
    }))
}

pub async fn get_rating_counts(
    ValidatedQueryParameters(params): ValidatedQueryParameters<CountsQueryParameters>,
    Extension(store): Extension<Arc<ProfileStore>>,
) -> Result<Json<RatingCountsResponse>, ApiError> {
    let state = store.snapshot();
    let filters = ready_filters(&state)?;

    let solved = params.solved.unwrap_or(true);
    Ok(Json(RatingCountsResponse {
        solved,
        counts: filters.rating_counts(solved),
    }))
}

pub async fn get_heatmap(
    ValidatedQueryParameters(params): ValidatedQueryParameters<HeatmapQueryParameters>,
    Extension(store): Extension<Arc<ProfileStore>>,
) -> Result<Json<HeatmapResponse>, ApiError> {
    let state = store.snapshot();
    let filters = ready_filters(&state)?;

    let days = filters
        .by_date
        .iter()
        .filter(|(date, _)| params.year.map(|year| date.year() == year).unwrap_or(true))
        .map(|(date, day)| HeatmapDay {
            date: *date,
            solved: day.problems.len(),
            max_rating: day.max_rating,
        })
        .collect();

    Ok(Json(HeatmapResponse {
        year: params.year,
        days,
    }))
}

pub async fn get_unsolved(
    ValidatedQueryParameters(params): ValidatedQueryParameters<UnsolvedQueryParameters>,
    Extension(store): Extension<Arc<ProfileStore>>,
) -> Result<Json<UnsolvedResponse>, ApiError> {
    let state = store.snapshot();
    let filters = ready_filters(&state)?;

    let unsolved = filters.unsolved_by_rating();
    let total = unsolved.len();
    let limit = params.limit.unwrap_or(200);

    let items = unsolved
        .into_iter()
        .take(limit)
        .map(|(problem_id, rating)| {
            let status = filters.statuses.get(&problem_id);
            UnsolvedProblem {
                attempts: status.map(|status| status.attempts).unwrap_or(0),
                last_verdict: status.and_then(|status| status.last_verdict),
                problem_id,
                rating,
            }
        })
        .collect();

    Ok(Json(UnsolvedResponse { total, items }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
