pub mod chapter;
pub mod project;
pub mod user;

pub use chapter::Chapter;
pub use project::Project;
pub use user::User;
