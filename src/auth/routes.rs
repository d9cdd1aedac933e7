use actix_identity::Identity;
use actix_web::web::{Data, Json};
use actix_web::{post, web, HttpResponse};
use serde_json::json;

use crate::auth;
use crate::auth::models::{Credentials, CurrentAccount, PasswordChange, Registration};
use crate::db;
use crate::errors::ServiceError;
use crate::server::Response;
use crate::users::Account;
use crate::validator::Validator;

#[post("/register")]
async fn register(payload: Json<Validator<Registration>>, pool: Data<db::Pool>) -> Response {
    let registration = payload.into_inner().validate()?;

    let account = web::block(move || {
        let conn = pool.get()?;
        Account::create(registration.into_account(), &conn)
    })
    .await?;

    http_created_json!(account);
}

#[post("/login")]
async fn login(credentials: Json<Credentials>, id: Identity, pool: Data<db::Pool>) -> Response {
    let credentials = credentials.into_inner();

    let account = web::block(move || -> Result<Account, ServiceError> {
        let conn = pool.get()?;

        let account =
            Account::find_by_email(&credentials.email, &conn).map_err(|error| match error {
                ServiceError::NotFound => ServiceError::Unauthorized,
                _ => error,
            })?;

        account.verify_password(credentials.password.as_bytes())?;

        Ok(account)
    })
    .await?;

    auth::remember(&id, &CurrentAccount::from(&account))?;

    http_ok_json!(account);
}

#[post("/logout")]
async fn logout(id: Identity) -> Response {
    auth::get_account(&id)?;
    auth::forget(&id);

    http_ok_json!(json!({ "message": "Successfully signed out" }));
}

#[post("/change-password")]
async fn change_password(
    payload: Json<Validator<PasswordChange>>,
    id: Identity,
    pool: Data<db::Pool>,
) -> Response {
    let current = auth::get_account(&id)?;
    let change = payload.into_inner().validate()?;

    web::block(move || {
        let conn = pool.get()?;

        let mut account = Account::find(current.id, &conn)?;
        account.verify_password(change.old.as_bytes())?;
        account.update_password(&change.new, &conn)
    })
    .await?;

    http_ok_json!(json!({ "message": "password updated" }));
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register);
    cfg.service(login);
    cfg.service(logout);
    cfg.service(change_password);
}
