pub mod helpers;
pub mod models;
pub mod routes;

pub use helpers::{forget, get_account, remember, verify_organizer, verify_player};
pub use models::CurrentAccount;
