use crate::modules::store::{self, ProfileStore};
use anyhow::{Context, Result};
use clap::Args;
use codeforces_profile_libs::codeforces::client::RestCodeforcesApi;
use itertools::Itertools;
use std::{cmp::Reverse, env};

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Codeforces handle to summarize
    handle: String,
    /// How many tags to list in the tag table
    #[arg(long, default_value_t = 10)]
    top: usize,
}

pub async fn run(args: StatsArgs) -> Result<()> {
    let api_url = env::var("CODEFORCES_API_URL")
        .unwrap_or(String::from("https://codeforces.com/api"));
    let client = RestCodeforcesApi::new(&api_url).with_context(|| {
        let message = "couldn't create Codeforces API client. check the value of the CODEFORCES_API_URL environment variable.";
        tracing::error!(message);
        format!("{}", message)
    })?;

    let store = ProfileStore::new();
    store::load_user_data(&store, &client, &args.handle).await?;

    let state = store.snapshot();
    let user = state
        .user
        .data()
        .context("user data missing after a successful load")?;
    let filters = state
        .filters
        .data()
        .context("profile data missing after a successful load")?;

    let rank = user.rank.as_deref().unwrap_or("unrated");
    println!("{} ({})", user.handle, rank);
    match (user.rating, user.max_rating) {
        (Some(rating), Some(max_rating)) => {
            println!("rating: {} (max: {})", rating, max_rating)
        }
        _ => println!("rating: -"),
    }
    println!(
        "solved: {}  unsolved: {}  submissions: {}  active days: {}",
        filters.by_status.solved.len(),
        filters.by_status.unsolved.len(),
        filters.by_time.submissions.len(),
        filters.by_date.len(),
    );

    println!();
    println!("top tags (solved):");
    let tag_counts = filters.tag_counts(true);
    for (tag, count) in tag_counts
        .into_iter()
        .sorted_by_key(|(tag, count)| (Reverse(*count), tag.clone()))
        .take(args.top)
    {
        println!("  {:<24} {:>5}", tag, count);
    }

    println!();
    println!("rating histogram (solved):");
    for (bucket, count) in filters.rating_counts(true) {
        println!("  {:>4} {:>5}", bucket, count);
    }

    Ok(())
}
