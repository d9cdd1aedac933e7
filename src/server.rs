use actix_cors::Cors;
use actix_identity::{CookieIdentityPolicy, IdentityService};
use actix_web::{get, middleware, web, App, HttpRequest, HttpResponse, HttpServer};

use crate::auth;
use crate::comments;
use crate::config::Config;
use crate::db;
use crate::errors::ServiceError;
use crate::games;
use crate::notifications;
use crate::organizers;
use crate::participants;
use crate::players;
use crate::ratings;
use crate::stats;
use crate::users;

pub type Response = Result<HttpResponse, ServiceError>;

#[get("/health")]
async fn health(_: HttpRequest) -> &'static str {
    "ok"
}

pub async fn launch(db_pool: db::Pool) -> std::io::Result<()> {
    HttpServer::new(move || {
        App::new()
            .data(db_pool.clone())
            .wrap(middleware::DefaultHeaders::new().header("X-Version", env!("CARGO_PKG_VERSION")))
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::default())
            .wrap(stats::Middleware::default())
            .wrap(sentry_actix::Sentry::new())
            .wrap(Cors::permissive())
            .wrap(IdentityService::new(
                CookieIdentityPolicy::new(Config::session_private_key().as_bytes())
                    .name("matchday-auth")
                    .secure(false),
            ))
            .data(web::JsonConfig::default().limit(262_144))
            .data(web::PayloadConfig::default().limit(262_144))
            .service(health)
            .service(
                web::scope("/api")
                    .configure(auth::routes::register_routes)
                    .configure(users::routes::register)
                    .configure(players::routes::register)
                    .configure(organizers::routes::register)
                    .configure(games::routes::register)
                    .configure(participants::routes::register)
                    .configure(ratings::routes::register)
                    .configure(comments::routes::register)
                    .configure(notifications::routes::register)
                    .service(stats::route),
            )
    })
    .bind(format!("{}:{}", Config::api_host(), Config::api_port()))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn health_endpoint_answers() {
        let mut app = test::init_service(App::new().service(health)).await;

        let request = test::TestRequest::get().uri("/health").to_request();
        let response = test::call_service(&mut app, request).await;

        assert!(response.status().is_success());
    }
}
