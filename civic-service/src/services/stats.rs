/// Engagement totals across the loaded post snapshot
use crate::models::Post;
use serde::Serialize;

/// Pure function of its input; recompute on every snapshot change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementTotals {
    pub likes: i64,
    pub dislikes: i64,
    pub comments: i64,
    /// No share counter has a writer anywhere in the system.
    pub shares: i64,
}

impl EngagementTotals {
    pub fn from_posts(posts: &[Post]) -> Self {
        posts.iter().fold(Self::default(), |mut totals, post| {
            totals.likes += post.like_count;
            totals.dislikes += post.dislike_count;
            totals.comments += post.comment_count;
            totals
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Area, Ministry};
    use chrono::Utc;

    fn post(likes: i64, dislikes: i64, comments: i64) -> Post {
        Post {
            id: "p".to_string(),
            title: "t".to_string(),
            subtitle: None,
            content: "c".to_string(),
            image_url: None,
            area: Some(Area::Gasabo),
            ministry: Ministry::default(),
            author_id: "u".to_string(),
            author_name: "a".to_string(),
            created_at: Utc::now(),
            like_count: likes,
            dislike_count: dislikes,
            comment_count: comments,
        }
    }

    #[test]
    fn totals_sum_over_the_snapshot() {
        let posts = vec![post(3, 1, 2), post(0, 0, 0), post(4, 2, 5)];
        let totals = EngagementTotals::from_posts(&posts);
        assert_eq!(
            totals,
            EngagementTotals {
                likes: 7,
                dislikes: 3,
                comments: 7,
                shares: 0,
            }
        );
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        assert_eq!(EngagementTotals::from_posts(&[]), EngagementTotals::default());
    }
}
