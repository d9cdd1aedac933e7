use actix_identity::Identity;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::{get, post, put, web};
use chrono::Utc;
use diesel::Connection;

use crate::auth;
use crate::db;
use crate::games::models::{CreateGame, Game, GameFilter, UpdateGame};
use crate::games::Status;
use crate::notifications::models::{Kind, Notification};
use crate::participants::models::Participation;
use crate::server::Response;
use crate::validator::Validator;

#[get("/games")]
async fn find_all(query: Query<GameFilter>, pool: Data<db::Pool>, id: Identity) -> Response {
    let account = auth::get_account(&id)?;

    let games = web::block(move || {
        let conn = pool.get()?;
        Game::find_all(query.into_inner(), account.id, Utc::now(), &conn)
    })
    .await?;

    http_ok_json!(games);
}

#[get("/games/{id}")]
async fn find(game_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    auth::get_account(&id)?;

    let game = web::block(move || {
        let conn = pool.get()?;
        Game::find_response(*game_id, Utc::now(), &conn)
    })
    .await?;

    http_ok_json!(game);
}

#[post("/games")]
async fn create(
    payload: Json<Validator<CreateGame>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let organizer = auth::verify_organizer(&id)?;

    let mut game = payload.into_inner().validate()?;
    game.organizer_id = organizer.id;

    let game = web::block(move || {
        let conn = pool.get()?;
        Game::create(game, &conn)
    })
    .await?;

    http_created_json!(game);
}

#[put("/games/{id}")]
async fn update(
    game_id: Path<i64>,
    payload: Json<Validator<UpdateGame>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let organizer = auth::verify_organizer(&id)?;
    let changes = payload.into_inner().validate()?;

    let game = web::block(move || {
        let conn = pool.get()?;

        let game = Game::find_by_id(*game_id, &conn)?;

        if !game.is_organizer(organizer.id) {
            forbidden!("only the organizer of this game can edit it");
        }

        if game.status_at(Utc::now()) != Status::UPCOMING {
            conflict!("only upcoming games can be edited");
        }

        let joined = Game::participant_count(game.id, &conn)?;
        if i64::from(changes.capacity) < joined {
            bad_request!("capacity can't drop below the current number of participants");
        }

        game.update(&changes, &conn)
    })
    .await?;

    http_ok_json!(game);
}

#[post("/games/{id}/cancel")]
async fn cancel(game_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    let organizer = auth::verify_organizer(&id)?;

    let game = web::block(move || {
        let conn = pool.get()?;

        let mut game = Game::find_by_id(*game_id, &conn)?;

        if !game.is_organizer(organizer.id) {
            forbidden!("only the organizer of this game can cancel it");
        }

        let status = game.status_at(Utc::now());

        if status == Status::CANCELED {
            conflict!("this game is already canceled");
        }

        if status == Status::COMPLETED {
            conflict!("completed games can't be canceled");
        }

        conn.transaction::<Game, crate::errors::ServiceError, _>(|| {
            game.status = Status::CANCELED.to_string();
            game.persist_status(&conn)?;

            for player_id in Participation::player_ids(game.id, &conn)? {
                Notification::notify(
                    player_id,
                    game.id,
                    Kind::GameCanceled,
                    format!("\"{}\" has been canceled", game.title),
                    &conn,
                )?;
            }

            Ok(game)
        })
    })
    .await?;

    http_ok_json!(game);
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(find_all);
    cfg.service(find);
    cfg.service(create);
    cfg.service(update);
    cfg.service(cancel);
}
