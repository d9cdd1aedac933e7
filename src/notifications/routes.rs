use actix_identity::Identity;
use actix_web::web::{Data, Path, Query};
use actix_web::{get, post, web};

use crate::auth;
use crate::db;
use crate::notifications::models::{Notification, NotificationFilter};
use crate::server::Response;

#[get("/notifications")]
async fn find_all(
    filter: Query<NotificationFilter>,
    pool: Data<db::Pool>,
    id: Identity,
) -> Response {
    let account = auth::get_account(&id)?;

    let notifications = web::block(move || {
        let conn = pool.get()?;
        Notification::find_for(account.id, filter.into_inner(), &conn)
    })
    .await?;

    http_ok_json!(notifications);
}

#[post("/notifications/{id}/read")]
async fn mark_read(notification_id: Path<i64>, pool: Data<db::Pool>, id: Identity) -> Response {
    let account = auth::get_account(&id)?;

    let notification = web::block(move || {
        let conn = pool.get()?;
        Notification::mark_read(*notification_id, account.id, &conn)
    })
    .await?;

    http_ok_json!(notification);
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(find_all);
    cfg.service(mark_read);
}
