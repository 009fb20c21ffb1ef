//! Response bodies produced by the handlers.

mod error_response;
mod origin_reply;
mod pages;
mod session;

pub use error_response::ErrorResponse;
pub use origin_reply::OriginReply;
pub use pages::{AnimePage, AuthPage, HomePage, ProfilePage, SearchFilters, SearchPage, WatchPage};
pub use session::{LogoutResponse, UserResponse};
