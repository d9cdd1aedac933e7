use actix_identity::Identity;
use actix_web::web::Data;
use actix_web::{get, web};

use crate::auth;
use crate::db;
use crate::server::Response;
use crate::users::Account;

#[get("/users/me")]
async fn find_me(pool: Data<db::Pool>, id: Identity) -> Response {
    let current = auth::get_account(&id)?;

    let account = web::block(move || {
        let conn = pool.get()?;
        Account::find(current.id, &conn)
    })
    .await?;

    http_ok_json!(account);
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(find_me);
}
