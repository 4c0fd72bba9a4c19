pub mod attachments;
pub mod auth;
pub mod profile;
pub mod prompts;
pub mod tags;
pub mod two_factor;
pub mod users;
