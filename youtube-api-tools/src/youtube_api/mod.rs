//! Typed clients for the YouTube Data API v3 resources.
//!
//! Every resource family has a small client struct that borrows the [`Session`] it was
//! created from. Clients hold nothing else, so they are `Copy` and free to create per
//! call; the session owns the token and the HTTP connection pool.
//!
//! Operations follow the same shape across families:
//!
//! - `list` fetches one page and returns the raw [`ListResponse`] envelope
//! - `list_all` returns a lazy [`Stream`](tokio_stream::Stream) over every item, fetching
//!   pages of 50 only as the stream is drained
//! - `get` returns one record or [`Error::NotFound`](crate::Error::NotFound)
//! - mutating operations take the record (or the few fields they need) and return what
//!   the API answered with
//!
//! The `parts` argument selects which sub-objects the API includes; at least one part is
//! required. Filters the API treats as "exactly one of" are enums, e.g. [`ChannelFilter`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tokio_stream::StreamExt;
//! use youtube_api_tools::Session;
//! use youtube_api_tools::youtube_api::PlaylistFilter;
//!
//! # async fn example(session: Session) -> youtube_api_tools::Result<()> {
//! let mut playlists = session.playlists().list_all(&["snippet"], PlaylistFilter::Mine);
//! while let Some(playlist) = playlists.next().await {
//!     let playlist = playlist?;
//!     println!("{} {}", playlist.id, playlist.snippet.map(|s| s.title).unwrap_or_default());
//! }
//!
//! let copied = session.playlist_items().copy_playlist("PLsource", "PLdestination").await?;
//! println!("copied {copied} videos");
//! # Ok(())
//! # }
//! ```

pub mod activities;
pub mod captions;
pub mod channels;
pub mod comment_threads;
pub mod comments;
pub mod members;
pub mod playlist_items;
pub mod playlists;
pub mod search;
pub mod subscriptions;
pub mod thumbnails;
pub mod types;
pub mod video_categories;
pub mod videos;
pub mod watermarks;

use crate::session::Session;

pub use types::{ListResponse, MAX_PAGE_SIZE, Media, PageInfo, PageRequest, PagedStream, Thumbnail};

pub use activities::{Activities, Activity, ActivityFilter, ActivityOptions};
pub use captions::{Caption, CaptionSnippet, Captions};
pub use channels::{Channel, ChannelFilter, ChannelSnippet, Channels};
pub use comment_threads::{
    CommentThread, CommentThreadFilter, CommentThreadOptions, CommentThreads,
};
pub use comments::{Comment, CommentFilter, CommentSnippet, Comments};
pub use members::{Member, MemberOptions, Members, MembershipsLevel, MembershipsLevels};
pub use playlist_items::{PlaylistItem, PlaylistItemFilter, PlaylistItems};
pub use playlists::{Playlist, PlaylistFilter, PlaylistSnippet, PlaylistStatus, Playlists};
pub use search::{Search, SearchQuery, SearchResult};
pub use subscriptions::{Subscription, SubscriptionFilter, SubscriptionOptions, Subscriptions};
pub use thumbnails::Thumbnails;
pub use video_categories::{
    VideoAbuseReportReason, VideoAbuseReportReasons, VideoCategories, VideoCategory,
    VideoCategoryFilter,
};
pub use videos::{AbuseReport, Rating, Video, VideoFilter, VideoRating, VideoSnippet, Videos};
pub use watermarks::{InvideoBranding, Watermarks};

impl Session {
    pub fn activities(&self) -> Activities<'_> {
        Activities::new(self)
    }

    pub fn captions(&self) -> Captions<'_> {
        Captions::new(self)
    }

    pub fn channels(&self) -> Channels<'_> {
        Channels::new(self)
    }

    pub fn comments(&self) -> Comments<'_> {
        Comments::new(self)
    }

    pub fn comment_threads(&self) -> CommentThreads<'_> {
        CommentThreads::new(self)
    }

    pub fn members(&self) -> Members<'_> {
        Members::new(self)
    }

    pub fn memberships_levels(&self) -> MembershipsLevels<'_> {
        MembershipsLevels::new(self)
    }

    pub fn playlist_items(&self) -> PlaylistItems<'_> {
        PlaylistItems::new(self)
    }

    pub fn playlists(&self) -> Playlists<'_> {
        Playlists::new(self)
    }

    pub fn search(&self) -> Search<'_> {
        Search::new(self)
    }

    pub fn subscriptions(&self) -> Subscriptions<'_> {
        Subscriptions::new(self)
    }

    pub fn thumbnails(&self) -> Thumbnails<'_> {
        Thumbnails::new(self)
    }

    pub fn video_abuse_report_reasons(&self) -> VideoAbuseReportReasons<'_> {
        VideoAbuseReportReasons::new(self)
    }

    pub fn video_categories(&self) -> VideoCategories<'_> {
        VideoCategories::new(self)
    }

    pub fn videos(&self) -> Videos<'_> {
        Videos::new(self)
    }

    pub fn watermarks(&self) -> Watermarks<'_> {
        Watermarks::new(self)
    }
}
