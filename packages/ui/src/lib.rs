//! This crate contains the shared UI glue for the clinic client: session
//! context, route guards and the community widgets.

mod auth;
pub use auth::{
    use_auth, use_backend, use_client_config, use_session_store, AuthProvider, AuthState,
    LogoutButton, SignInForm,
};

mod guard;
pub use guard::{AuthGuard, RoleGuard};

mod community;
pub use community::{use_community, use_community_revision, AppCommunity, CommunityProvider};

mod like_button;
pub use like_button::LikeButton;

mod comment_section;
pub use comment_section::CommentSection;

mod notices;
pub use notices::NoticeTray;
