use actix_identity::Identity;
use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, web};
use diesel::Connection;

use crate::auth;
use crate::comments::models::{Comment, NewComment};
use crate::db;
use crate::errors::ServiceError;
use crate::games::Game;
use crate::notifications::models::{Kind, Notification};
use crate::server::Response;
use crate::validator::Validator;

#[post("/games/{id}/comments")]
async fn create(
    game_id: Path<i64>,
    payload: Json<Validator<NewComment>>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let account = auth::get_account(&id)?;
    let comment = payload.into_inner().validate()?;

    let comment = web::block(move || {
        let conn = pool.get()?;

        let game = Game::find_by_id(*game_id, &conn)?;

        conn.transaction::<Comment, ServiceError, _>(|| {
            let comment = Comment::create(game.id, account.id, &comment.content, &conn)?;

            // organizers commenting on their own game don't notify themselves
            if game.organizer_id != account.id {
                Notification::notify(
                    game.organizer_id,
                    game.id,
                    Kind::NewComment,
                    format!("{} commented on \"{}\"", account.username, game.title),
                    &conn,
                )?;
            }

            Ok(comment)
        })
    })
    .await?;

    http_created_json!(comment);
}

#[get("/games/{id}/comments")]
async fn find_by_game(game_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    auth::get_account(&id)?;

    let comments = web::block(move || {
        let conn = pool.get()?;
        Comment::find_by_game(*game_id, &conn)
    })
    .await?;

    http_ok_json!(comments);
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(create);
    cfg.service(find_by_game);
}
