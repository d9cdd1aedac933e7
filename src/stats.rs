use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use actix_service::{Service, Transform};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::web::Data;
use actix_web::Error;
use actix_web::{get, web};
use chrono::Utc;
use futures::future::{ok, Ready};
use futures::Future;

use crate::db;
use crate::games::models::StatusCounts;
use crate::games::Game;
use crate::server::Response;

pub struct Stats {
    pub requests: AtomicU32,
    pub errors: AtomicU32,
}

lazy_static! {
    static ref STATS: Stats = Stats {
        requests: AtomicU32::new(0),
        errors: AtomicU32::new(0),
    };
}

impl Stats {
    pub fn count_request() {
        STATS.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_error() {
        STATS.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests() -> u32 {
        STATS.requests.load(Ordering::Relaxed)
    }

    pub fn errors() -> u32 {
        STATS.errors.load(Ordering::Relaxed)
    }
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub requests: u32,
    pub errors: u32,
    pub games: StatusCounts,
    pub active_db_connections: u32,
    pub idle_db_connections: u32,
}

#[get("/stats")]
pub async fn route(pool: Data<db::Pool>) -> Response {
    let state = pool.clone().into_inner().state();

    let games = web::block(move || {
        let conn = pool.get()?;
        Game::status_counts(Utc::now(), &conn)
    })
    .await?;

    http_ok_json!(StatsResponse {
        requests: Stats::requests(),
        errors: Stats::errors(),
        games,
        active_db_connections: state.connections,
        idle_db_connections: state.idle_connections,
    });
}

pub struct Middleware;

impl Middleware {
    pub fn default() -> Middleware {
        Middleware
    }
}

impl<S, B> Transform<S> for Middleware
where
    S: Service<Request = ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
{
    type Request = ServiceRequest;
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestCountMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestCountMiddleware { service })
    }
}

pub struct RequestCountMiddleware<S> {
    service: S,
}

impl<S, B> Service for RequestCountMiddleware<S>
where
    S: Service<Request = ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
{
    type Request = ServiceRequest;
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: ServiceRequest) -> Self::Future {
        Stats::count_request();

        let fut = self.service.call(request);

        Box::pin(async move {
            let res = fut.await?;

            if res.response().status().is_server_error() {
                Stats::count_error();
            }

            Ok(res)
        })
    }
}
