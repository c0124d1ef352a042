/// Database models
///
/// - `user`: user accounts and their roles

pub mod user;
