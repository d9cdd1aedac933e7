use actix_identity::Identity;
use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, web};
use diesel::Connection;

use crate::auth;
use crate::db;
use crate::errors::ServiceError;
use crate::games::Game;
use crate::notifications::models::{Kind, Notification};
use crate::participants::Participation;
use crate::ratings::models::{Rating, SubmitRating};
use crate::server::Response;
use crate::validator::Validator;

#[post("/games/{id}/ratings")]
async fn submit(
    game_id: Path<i64>,
    payload: Json<Validator<SubmitRating>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let player = auth::verify_player(&id)?;
    let rating = payload.into_inner().validate()?;

    let rating = web::block(move || {
        let conn = pool.get()?;

        let game = Game::find_by_id(*game_id, &conn)?;

        if !Participation::is_member(game.id, player.id, &conn)? {
            forbidden!("only participants can rate a game");
        }

        conn.transaction::<Rating, ServiceError, _>(|| {
            let rating = Rating::create(game.id, player.id, &rating, &conn)?;

            Notification::notify(
                game.organizer_id,
                game.id,
                Kind::RatingSubmitted,
                format!("{} submitted a rating for \"{}\"", player.username, game.title),
                &conn,
            )?;

            Ok(rating)
        })
    })
    .await?;

    http_created_json!(rating);
}

#[get("/games/{id}/ratings")]
async fn find_by_game(game_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    auth::get_account(&id)?;

    let ratings = web::block(move || {
        let conn = pool.get()?;
        Rating::find_by_game(*game_id, &conn)
    })
    .await?;

    http_ok_json!(ratings);
}

#[post("/ratings/{id}/verify")]
async fn verify(rating_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    let organizer = auth::verify_organizer(&id)?;

    let rating = web::block(move || {
        let conn = pool.get()?;

        let rating = Rating::find_by_id(*rating_id, &conn)?;
        let game = Game::find_by_id(rating.game_id, &conn)?;

        if !game.is_organizer(organizer.id) {
            forbidden!("only the organizer of this game can verify ratings");
        }

        conn.transaction::<Rating, ServiceError, _>(|| {
            let rating = rating.verify(&conn)?;

            Notification::notify(
                rating.player_id,
                game.id,
                Kind::RatingVerified,
                format!("your rating for \"{}\" was verified", game.title),
                &conn,
            )?;

            Ok(rating)
        })
    })
    .await?;

    http_ok_json!(rating);
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(submit);
    cfg.service(find_by_game);
    cfg.service(verify);
}
