use actix_identity::Identity;
use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, web};
use chrono::Utc;

use crate::auth;
use crate::db;
use crate::participants::models::{JoinRequest, Participation};
use crate::server::Response;

#[post("/games/{id}/join")]
async fn join(
    game_id: Path<i64>,
    request: Option<Json<JoinRequest>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let player = auth::verify_player(&id)?;
    let request = request.map(Json::into_inner).unwrap_or_default();

    let participation = web::block(move || {
        let conn = pool.get()?;
        Participation::join(*game_id, &player, request, Utc::now(), &conn)
    })
    .await?;

    http_created_json!(participation);
}

#[post("/games/{id}/leave")]
async fn leave(game_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    let player = auth::verify_player(&id)?;

    web::block(move || {
        let conn = pool.get()?;
        Participation::leave(*game_id, player.id, &conn)
    })
    .await?;

    http_ok_json!(serde_json::json!({ "message": "you left the game" }));
}

#[get("/games/{id}/participants")]
async fn roster(game_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    auth::get_account(&id)?;

    let roster = web::block(move || {
        let conn = pool.get()?;
        Participation::roster(*game_id, &conn)
    })
    .await?;

    http_ok_json!(roster);
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(join);
    cfg.service(leave);
    cfg.service(roster);
}
