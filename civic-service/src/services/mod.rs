pub mod comments;
pub mod forum;
pub mod posts;
pub mod session;
pub mod stats;

pub use comments::CommentThread;
pub use forum::ForumChat;
pub use posts::PostFeed;
pub use session::{Session, SessionResolver};
pub use stats::EngagementTotals;
