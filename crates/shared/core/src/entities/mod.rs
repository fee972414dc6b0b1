mod key;
mod user;

pub use key::Key;
pub use user::User;
