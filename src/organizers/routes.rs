use actix_identity::Identity;
use actix_web::web::{Data, Json};
use actix_web::{delete, get, put, web};
use serde_json::json;

use crate::auth;
use crate::db;
use crate::players::routes::PasswordConfirmation;
use crate::server::Response;
use crate::users::models::UpdateProfile;
use crate::users::Account;
use crate::validator::Validator;

#[get("/organizers/profile")]
async fn profile(pool: Data<db::Pool>, id: Identity) -> Response {
    let organizer = auth::verify_organizer(&id)?;

    let account = web::block(move || {
        let conn = pool.get()?;
        Account::find(organizer.id, &conn)
    })
    .await?;

    http_ok_json!(account);
}

#[put("/organizers/profile")]
async fn update_profile(
    payload: Json<Validator<UpdateProfile>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let organizer = auth::verify_organizer(&id)?;
    let changes = payload.into_inner().validate()?;

    let account = web::block(move || {
        let conn = pool.get()?;

        let account = Account::find(organizer.id, &conn)?;
        account.update_profile(&changes, &conn)
    })
    .await?;

    http_ok_json!(account);
}

#[delete("/organizers/profile")]
async fn delete_profile(
    confirmation: Json<PasswordConfirmation>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let organizer = auth::verify_organizer(&id)?;
    let confirmation = confirmation.into_inner();

    web::block(move || {
        let conn = pool.get()?;

        let account = Account::find(organizer.id, &conn)?;
        account.verify_password(confirmation.password.as_bytes())?;

        Account::delete(organizer.id, &conn)
    })
    .await?;

    auth::forget(&id);

    http_ok_json!(json!({ "message": "your account is gone" }));
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(profile);
    cfg.service(update_profile);
    cfg.service(delete_profile);
}
