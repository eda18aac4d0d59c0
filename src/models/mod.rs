// Models module

pub mod member_type;
pub mod post;
pub mod profile;
pub mod user;

// Re-export commonly used types
pub use member_type::MemberType;
pub use post::{ChangePostRequest, CreatePostRequest, ListPostsQuery, Post};
pub use profile::{ChangeProfileRequest, CreateProfileRequest, Profile};
pub use user::{ChangeUserRequest, CreateUserRequest, SubscribeRequest, User};
