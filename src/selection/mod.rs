//! Post selection: video filtering, pinned-post removal, ranking and truncation

use std::cmp::Reverse;

use crate::input::{CountField, PostRecord};

/// Number of leading rows assumed to be pinned in a profile export
pub const PINNED_POST_COUNT: usize = 3;

const REEL_MARKER: &str = "/reel/";
const POST_MARKER: &str = "/p/";

/// Keep records that look like video posts: the URL must be a reel or post
/// link, and posts (as opposed to reels) also need a positive view count.
pub fn filter_video_posts(posts: Vec<PostRecord>) -> Vec<PostRecord> {
    let video_posts: Vec<PostRecord> = posts
        .into_iter()
        .filter(|post| {
            let url = post.url.as_deref().unwrap_or("");
            let is_reel = url.contains(REEL_MARKER);
            if !is_reel && !url.contains(POST_MARKER) {
                return false;
            }
            is_reel || post.count(CountField::ViewCount) > 0
        })
        .collect();

    tracing::info!("Filtered to {} video posts", video_posts.len());
    video_posts
}

/// Drop the first [`PINNED_POST_COUNT`] records. Inputs that small are left
/// untouched so the heuristic can never empty the set.
pub fn filter_pinned_posts(posts: Vec<PostRecord>) -> Vec<PostRecord> {
    if posts.len() <= PINNED_POST_COUNT {
        tracing::warn!(
            "Only {} posts available, not filtering pinned posts",
            posts.len()
        );
        return posts;
    }

    let non_pinned: Vec<PostRecord> = posts.into_iter().skip(PINNED_POST_COUNT).collect();
    tracing::info!(
        "Filtered out {} potentially pinned posts, {} remaining",
        PINNED_POST_COUNT,
        non_pinned.len()
    );
    non_pinned
}

/// Sort descending by the given counter. The sort is stable, so ties keep
/// their input order.
pub fn rank_posts(mut posts: Vec<PostRecord>, field: CountField) -> Vec<PostRecord> {
    tracing::info!("Sorting posts by {}...", field);
    posts.sort_by_key(|post| Reverse(post.count(field)));

    for (i, post) in posts.iter().take(5).enumerate() {
        tracing::info!(
            "  {}. {} {} - {}",
            i + 1,
            post.count(field),
            field,
            post.url().unwrap_or("No URL")
        );
    }

    posts
}

/// First `count` records, or all of them if there are fewer
pub fn select_top(mut posts: Vec<PostRecord>, count: usize) -> Vec<PostRecord> {
    posts.truncate(count);
    tracing::info!("Selected top {} posts for transcription", posts.len());
    posts
}

/// Options controlling [`select_posts`]
#[derive(Debug, Clone, Copy)]
pub struct SelectionOptions {
    pub top_count: usize,
    pub sort_by: CountField,
    pub filter_pinned: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            top_count: 5,
            sort_by: CountField::ViewCount,
            filter_pinned: true,
        }
    }
}

/// Run filter, pinned filter, ranker and selector in order
pub fn select_posts(posts: Vec<PostRecord>, options: &SelectionOptions) -> Vec<PostRecord> {
    let mut posts = filter_video_posts(posts);
    if posts.is_empty() {
        tracing::warn!("No video posts found in CSV");
        return posts;
    }

    if options.filter_pinned {
        posts = filter_pinned_posts(posts);
    }

    let ranked = rank_posts(posts, options.sort_by);
    select_top(ranked, options.top_count)
}
