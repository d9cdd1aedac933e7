use actix_identity::Identity;
use actix_web::web::{Data, Json};
use actix_web::{delete, get, put, web};
use diesel::Connection;
use serde_json::json;

use crate::auth;
use crate::db;
use crate::errors::ServiceError;
use crate::players::models::{
    DetailsChanges, PlayerDetails, PlayerProfile, RankScores, UpdatePlayerProfile,
};
use crate::server::Response;
use crate::users::models::UpdateProfile;
use crate::users::Account;
use crate::validator::Validator;

#[derive(Debug, Deserialize)]
pub struct PasswordConfirmation {
    pub password: String,
}

#[get("/players/profile")]
async fn profile(pool: Data<db::Pool>, id: Identity) -> Response {
    let player = auth::verify_player(&id)?;

    let player_profile = web::block(move || -> Result<PlayerProfile, ServiceError> {
        let conn = pool.get()?;

        let account = Account::find(player.id, &conn)?;
        let details = PlayerDetails::find(player.id, &conn)?;

        Ok(PlayerProfile::assemble(account, details))
    })
    .await?;

    http_ok_json!(player_profile);
}

#[put("/players/profile")]
async fn update_profile(
    payload: Json<Validator<UpdatePlayerProfile>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let player = auth::verify_player(&id)?;
    let changes = payload.into_inner().validate()?;

    let updated = web::block(move || {
        let conn = pool.get()?;

        conn.transaction::<PlayerProfile, ServiceError, _>(|| {
            let account = Account::find(player.id, &conn)?;
            let account = account.update_profile(
                &UpdateProfile {
                    name: changes.name.clone(),
                    image: changes.image.clone(),
                },
                &conn,
            )?;

            let details = PlayerDetails::update(
                player.id,
                &DetailsChanges {
                    age_group: changes.age_group.clone(),
                    skill_level: changes.skill_level.clone(),
                    positions: changes.positions.clone(),
                },
                &conn,
            )?;

            Ok(PlayerProfile::assemble(account, details))
        })
    })
    .await?;

    http_ok_json!(updated);
}

#[put("/players/rank-scores")]
async fn update_rank_scores(
    payload: Json<Validator<RankScores>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let player = auth::verify_player(&id)?;
    let scores = payload.into_inner().validate()?;

    let details = web::block(move || {
        let conn = pool.get()?;
        PlayerDetails::update_rank_scores(player.id, &scores, &conn)
    })
    .await?;

    http_ok_json!(details);
}

#[delete("/players/profile")]
async fn delete_profile(
    confirmation: Json<PasswordConfirmation>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let player = auth::verify_player(&id)?;
    let confirmation = confirmation.into_inner();

    web::block(move || {
        let conn = pool.get()?;

        let account = Account::find(player.id, &conn)?;
        account.verify_password(confirmation.password.as_bytes())?;

        Account::delete(player.id, &conn)
    })
    .await?;

    auth::forget(&id);

    http_ok_json!(json!({ "message": "your account is gone" }));
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(profile);
    cfg.service(update_profile);
    cfg.service(update_rank_scores);
    cfg.service(delete_profile);
}
