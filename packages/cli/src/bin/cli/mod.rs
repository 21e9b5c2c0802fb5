pub mod requirements;
pub mod users;
mod utils;
