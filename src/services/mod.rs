pub mod assets;
pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod comments;
pub mod discovery;
pub mod media_info;
pub mod presence;
pub mod providers;
pub mod rating;
pub mod ratings;

pub use assets::AssetService;
pub use calendar::{CalendarService, CalendarWindow, ShowCalendar};
pub use comments::CommentService;
pub use discovery::{DiscoveryService, DiscoveryStrategy};
pub use media_info::{MediaDetails, MediaInfoService};
pub use ratings::RatingService;
