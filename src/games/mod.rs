pub mod models;
pub mod routes;
pub mod status;

pub use models::{Game, GameResponse};
pub use status::{Status, StatusChange};
