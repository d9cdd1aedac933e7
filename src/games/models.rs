use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use regex::Regex;
use url::Url;

use crate::db;
use crate::errors::ServiceError;
use crate::games::status::{self, Status, StatusChange};
use crate::schema::{games, participants, users};
use crate::users::{Account, AccountSummary};

/// Who gets to see a game in public listings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Visibility {
    PUBLIC,
    PRIVATE,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, AsChangeset, Clone)]
pub struct Game {
    pub id: i64,
    pub title: String,
    pub organizer_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub capacity: i32,
    pub fee_cents: i64,
    pub venue: String,
    pub rules: String,
    pub images: Vec<String>,
    pub status: String,
    pub visibility: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

///
/// **POST /api/games**
///
/// The organizer_id is ignored when sent, it's taken from the session.
/// The lifecycle status is not part of the payload at all: new games
/// start UPCOMING (database default) and move on their own from there.
#[derive(Debug, Clone, Deserialize, Insertable)]
#[table_name = "games"]
pub struct CreateGame {
    pub title: String,
    #[serde(skip)]
    pub organizer_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub capacity: i32,
    pub fee_cents: i64,
    pub venue: String,
    pub rules: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub visibility: String,
    pub password: Option<String>,
}

///
/// **PUT /api/games/{id}**
///
/// Full replacement of the editable fields, allowed to the owning
/// organizer while the game is still upcoming. Omitted optional fields
/// clear their columns, so dropping the duration or the join password
/// actually sticks.
#[derive(Debug, Clone, Deserialize, AsChangeset)]
#[table_name = "games"]
#[changeset_options(treat_none_as_null = "true")]
pub struct UpdateGame {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub capacity: i32,
    pub fee_cents: i64,
    pub venue: String,
    pub rules: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub visibility: String,
    pub password: Option<String>,
}

/// GameFilter is what the client can query games with.
#[derive(Debug, Deserialize)]
pub struct GameFilter {
    /// filter games by %title%
    pub title: Option<String>,
    /// matched against the time-derived status, not the stored column
    pub status: Option<Status>,
    pub visibility: Option<Visibility>,
    /// list games published by a specific organizer
    pub organizer_id: Option<i64>,
    /// default false, set to true to only list games you participate in
    pub joined: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub id: i64,
    pub title: String,
    pub organizer: AccountSummary,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: i32,
    pub participant_count: i64,
    pub fee_cents: i64,
    pub venue: String,
    pub rules: String,
    pub images: Vec<String>,
    pub status: Status,
    pub visibility: String,
}

/// effective-status tallies, as reported by /stats and the status updater
#[derive(Debug, Default, Serialize)]
pub struct StatusCounts {
    pub upcoming: i64,
    pub ongoing: i64,
    pub completed: i64,
    pub canceled: i64,
}

impl Game {
    pub fn starts_at(&self) -> DateTime<Utc> {
        status::starts_at(self.date, self.start_time)
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        status::ends_at(self.starts_at(), self.duration_minutes)
    }

    /// the status column, parsed
    pub fn stored_status(&self) -> Status {
        self.status.parse().unwrap_or_else(|_| {
            warn!("game {} carries unknown status '{}'", self.id, self.status);
            Status::UPCOMING
        })
    }

    /// The status the game effectively has at `now`: the stored value when
    /// that is terminal, the time-derived one otherwise. Every read path
    /// and permission check goes through here, so responses are never
    /// stale even when the updater hasn't run yet.
    pub fn status_at(&self, now: DateTime<Utc>) -> Status {
        let stored = self.stored_status();

        if stored.is_terminal() {
            return stored;
        }

        status::derive(self.starts_at(), self.ends_at(), now)
    }

    /// Point the stored status at what the clock says it should be.
    ///
    /// Terminal statuses are left alone. Returns what changed, or None;
    /// persisting the row is the caller's job. Calling this twice with
    /// the same `now` reports a change at most once.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> Option<StatusChange> {
        let stored = self.stored_status();

        if stored.is_terminal() {
            return None;
        }

        let target = status::derive(self.starts_at(), self.ends_at(), now);

        if target == stored {
            return None;
        }

        self.status = target.to_string();

        Some(StatusChange {
            game_id: self.id,
            title: self.title.clone(),
            from: stored,
            to: target,
        })
    }

    /// Reconcile every non-canceled game against `now`.
    ///
    /// One game failing to persist is logged and skipped, the rest of the
    /// batch still goes through. Returns the changes that were applied
    /// (or, with `persist` false, would have been).
    #[tracing::instrument(skip(conn))]
    pub fn reconcile_all(
        conn: &db::Conn,
        now: DateTime<Utc>,
        persist: bool,
    ) -> Result<Vec<StatusChange>, ServiceError> {
        let games = Game::find_active(conn)?;

        let mut changes = Vec::new();

        for mut game in games {
            let change = match game.reconcile(now) {
                Some(change) => change,
                None => continue,
            };

            if persist {
                if let Err(error) = game.persist_status(conn) {
                    error!(
                        "unable to persist status {} for game {}: {}",
                        change.to, game.id, error
                    );
                    continue;
                }
            }

            changes.push(change);
        }

        Ok(changes)
    }

    /// write only the status column back
    pub fn persist_status(&self, conn: &db::Conn) -> Result<(), ServiceError> {
        diesel::update(self)
            .set(games::status.eq(&self.status))
            .execute(conn)?;

        Ok(())
    }

    pub fn create(new_game: CreateGame, conn: &db::Conn) -> Result<Game, ServiceError> {
        let game: Game = diesel::insert_into(games::table)
            .values(&new_game)
            .get_result(conn)?;

        Ok(game)
    }

    pub fn find_by_id(id: i64, conn: &db::Conn) -> Result<Game, ServiceError> {
        let game = games::table.filter(games::id.eq(id)).first::<Game>(conn)?;

        Ok(game)
    }

    /// every game the status updater still cares about
    pub fn find_active(conn: &db::Conn) -> Result<Vec<Game>, ServiceError> {
        let games = games::table
            .filter(games::status.ne(Status::CANCELED.to_string()))
            .order((games::date, games::start_time))
            .load::<Game>(conn)?;

        Ok(games)
    }

    pub fn find_all(
        filter: GameFilter,
        viewer_id: i64,
        now: DateTime<Utc>,
        conn: &db::Conn,
    ) -> Result<Vec<GameResponse>, ServiceError> {
        let status_filter = filter.status;

        let mut query = games::table
            .inner_join(users::table)
            .order((games::date, games::start_time))
            .into_boxed();

        if let Some(title) = filter.title {
            query = query.filter(games::title.ilike(format!("%{}%", title)));
        }

        if let Some(visibility) = filter.visibility {
            query = query.filter(games::visibility.eq(visibility.to_string()));
        }

        if let Some(id) = filter.organizer_id {
            query = query.filter(games::organizer_id.eq(id));
        }

        if filter.joined.unwrap_or(false) {
            use diesel::dsl::any;

            let joined = participants::table
                .filter(participants::user_id.eq(viewer_id))
                .select(participants::game_id);

            query = query.filter(games::id.eq(any(joined)));
        }

        let rows = query.load::<(Game, Account)>(conn)?;
        let counts = participant_counts(rows.iter().map(|(game, _)| game.id).collect(), conn)?;

        let games = rows
            .into_iter()
            .map(|(game, organizer)| {
                let count = counts.get(&game.id).copied().unwrap_or(0);
                GameResponse::assemble(game, organizer.summary(), count, now)
            })
            // the status filter matches the derived status, so it has to
            // run after the rows are loaded
            .filter(|game| match status_filter {
                Some(status) => game.status == status,
                None => true,
            })
            .collect();

        Ok(games)
    }

    pub fn find_response(id: i64, now: DateTime<Utc>, conn: &db::Conn) -> Result<GameResponse, ServiceError> {
        let (game, organizer) = games::table
            .inner_join(users::table)
            .filter(games::id.eq(id))
            .first::<(Game, Account)>(conn)?;

        let count = Game::participant_count(game.id, conn)?;

        Ok(GameResponse::assemble(game, organizer.summary(), count, now))
    }

    pub fn participant_count(game_id: i64, conn: &db::Conn) -> Result<i64, ServiceError> {
        use diesel::dsl::count_star;

        let count = participants::table
            .filter(participants::game_id.eq(game_id))
            .select(count_star())
            .first::<i64>(conn)?;

        Ok(count)
    }

    pub fn update(&self, changes: &UpdateGame, conn: &db::Conn) -> Result<Game, ServiceError> {
        let game = diesel::update(self).set(changes).get_result(conn)?;

        Ok(game)
    }

    /// effective-status tallies over every game, for /stats and the
    /// status updater's summary
    pub fn status_counts(now: DateTime<Utc>, conn: &db::Conn) -> Result<StatusCounts, ServiceError> {
        let games = games::table.load::<Game>(conn)?;

        let mut counts = StatusCounts::default();

        for game in games {
            match game.status_at(now) {
                Status::UPCOMING => counts.upcoming += 1,
                Status::ONGOING => counts.ongoing += 1,
                Status::COMPLETED => counts.completed += 1,
                Status::CANCELED => counts.canceled += 1,
            }
        }

        Ok(counts)
    }

    pub fn is_organizer(&self, account_id: i64) -> bool {
        self.organizer_id == account_id
    }
}

impl GameResponse {
    fn assemble(
        game: Game,
        organizer: AccountSummary,
        participant_count: i64,
        now: DateTime<Utc>,
    ) -> GameResponse {
        GameResponse {
            status: game.status_at(now),
            starts_at: game.starts_at(),
            ends_at: game.ends_at(),
            id: game.id,
            title: game.title,
            organizer,
            date: game.date,
            start_time: game.start_time,
            duration_minutes: game.duration_minutes,
            capacity: game.capacity,
            participant_count,
            fee_cents: game.fee_cents,
            venue: game.venue,
            rules: game.rules,
            images: game.images,
            visibility: game.visibility,
        }
    }
}

fn participant_counts(
    game_ids: Vec<i64>,
    conn: &db::Conn,
) -> Result<HashMap<i64, i64>, ServiceError> {
    let rows = participants::table
        .filter(participants::game_id.eq_any(&game_ids))
        .select(participants::game_id)
        .load::<i64>(conn)?;

    let mut counts: HashMap<i64, i64> = HashMap::new();
    for game_id in rows {
        *counts.entry(game_id).or_insert(0) += 1;
    }

    Ok(counts)
}

fn validate_game_fields(
    title: &str,
    date: NaiveDate,
    start_time: NaiveTime,
    capacity: i32,
    fee_cents: i64,
    venue: &str,
    rules: &str,
    images: &[String],
    visibility: &str,
    password: &Option<String>,
) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        bad_request!("title is too short");
    }

    if title.trim().len() > 60 {
        bad_request!("title is too long, maximum 60 characters");
    }

    let pattern: Regex = Regex::new(r"^[a-zA-Z0-9_-]+( [a-zA-Z0-9_-]+)*$").unwrap();

    if !pattern.is_match(title) {
        bad_request!("title can only contain letters, numbers, spaces, '-' and '_'");
    }

    if status::starts_at(date, start_time) <= Utc::now() {
        bad_request!("the game can't start in the past");
    }

    if capacity < 2 {
        bad_request!("a game needs room for at least 2 players");
    }

    if capacity > 100 {
        bad_request!("a game can hold at most 100 players");
    }

    if fee_cents < 0 {
        bad_request!("the player fee can't be negative");
    }

    if venue.trim().is_empty() {
        bad_request!("the venue can't be empty");
    }

    if rules.trim().is_empty() {
        bad_request!("the game rules can't be empty");
    }

    for image in images {
        if Url::parse(image).is_err() {
            bad_request!("an image url is not a valid url");
        }
    }

    let visibility: Visibility = match visibility {
        "PUBLIC" => Visibility::PUBLIC,
        "PRIVATE" => Visibility::PRIVATE,
        _ => {
            return Err(ServiceError::BadRequest(
                "visibility has to be PUBLIC or PRIVATE".to_string(),
            ))
        }
    };

    if let Some(password) = password {
        if visibility == Visibility::PUBLIC {
            bad_request!("only private games can have a join password");
        }

        if password.len() < 4 || password.len() > 40 {
            bad_request!("the join password has to be between 4 and 40 characters");
        }
    }

    Ok(())
}

impl crate::validator::Validate<CreateGame> for CreateGame {
    fn validate(&self) -> Result<(), ServiceError> {
        validate_game_fields(
            &self.title,
            self.date,
            self.start_time,
            self.capacity,
            self.fee_cents,
            &self.venue,
            &self.rules,
            &self.images,
            &self.visibility,
            &self.password,
        )
    }
}

impl crate::validator::Validate<UpdateGame> for UpdateGame {
    fn validate(&self) -> Result<(), ServiceError> {
        validate_game_fields(
            &self.title,
            self.date,
            self.start_time,
            self.capacity,
            self.fee_cents,
            &self.venue,
            &self.rules,
            &self.images,
            &self.visibility,
            &self.password,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;
    use chrono::Duration;

    fn instant(value: &str) -> DateTime<Utc> {
        format!("{}:00Z", value).parse().unwrap()
    }

    pub fn game() -> Game {
        Game {
            id: 1,
            title: String::from("sunday-five-a-side"),
            organizer_id: 1,
            date: "2024-01-01".parse().unwrap(),
            start_time: "10:00:00".parse().unwrap(),
            duration_minutes: Some(60),
            capacity: 10,
            fee_cents: 500,
            venue: String::from("Riverside pitch 2"),
            rules: String::from("no slide tackles"),
            images: vec![],
            status: Status::UPCOMING.to_string(),
            visibility: Visibility::PUBLIC.to_string(),
            password: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn status_follows_the_clock() {
        let game = game();

        assert_eq!(game.status_at(instant("2024-01-01T09:59")), Status::UPCOMING);
        assert_eq!(game.status_at(instant("2024-01-01T10:00")), Status::ONGOING);
        assert_eq!(game.status_at(instant("2024-01-01T11:00")), Status::COMPLETED);
    }

    #[test]
    fn default_duration_when_missing() {
        let mut game = game();
        game.duration_minutes = None;

        let start = game.starts_at();
        assert_eq!(game.ends_at(), start + Duration::hours(2));
        assert_eq!(game.status_at(start + Duration::minutes(90)), Status::ONGOING);
        assert_eq!(game.status_at(start + Duration::minutes(121)), Status::COMPLETED);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut game = game();
        let now = instant("2024-01-01T10:30");

        let change = game.reconcile(now).expect("the game should go ongoing");
        assert_eq!(change.from, Status::UPCOMING);
        assert_eq!(change.to, Status::ONGOING);
        assert_eq!(game.status, Status::ONGOING.to_string());

        assert!(game.reconcile(now).is_none());
    }

    #[test]
    fn reconcile_skips_straight_to_completed() {
        let mut game = game();

        let change = game.reconcile(instant("2024-01-02T00:00")).unwrap();
        assert_eq!(change.from, Status::UPCOMING);
        assert_eq!(change.to, Status::COMPLETED);
    }

    #[test]
    fn canceled_games_stay_canceled() {
        let mut game = game();
        game.status = Status::CANCELED.to_string();

        assert!(game.reconcile(instant("2024-01-02T00:00")).is_none());
        assert_eq!(game.status_at(instant("2024-01-01T10:30")), Status::CANCELED);
    }

    #[test]
    fn completed_games_are_not_rederived() {
        let mut game = game();
        game.status = Status::COMPLETED.to_string();

        assert!(game.reconcile(instant("2024-01-01T09:00")).is_none());
        assert_eq!(game.status_at(instant("2024-01-01T09:00")), Status::COMPLETED);
    }

    fn create_game() -> CreateGame {
        let starts = Utc::now() + Duration::days(1);

        CreateGame {
            title: String::from("sunday five-a-side"),
            organizer_id: 1,
            date: starts.date().naive_utc(),
            start_time: "10:00:00".parse().unwrap(),
            duration_minutes: Some(90),
            capacity: 10,
            fee_cents: 500,
            venue: String::from("Riverside pitch 2"),
            rules: String::from("no slide tackles"),
            images: vec![String::from("https://example.com/pitch.jpg")],
            visibility: Visibility::PUBLIC.to_string(),
            password: None,
        }
    }

    #[test]
    fn valid_create_payload() {
        assert!(Validator::new(create_game()).validate().is_ok());
    }

    #[test]
    fn game_cannot_start_in_the_past() {
        let mut game = create_game();
        game.date = "2020-01-01".parse().unwrap();

        assert!(Validator::new(game).validate().is_err());
    }

    #[test]
    fn capacity_bounds() {
        let mut game = create_game();

        game.capacity = 1;
        assert!(Validator::new(game.clone()).validate().is_err());

        game.capacity = 101;
        assert!(Validator::new(game.clone()).validate().is_err());

        game.capacity = 2;
        assert!(Validator::new(game).validate().is_ok());
    }

    #[test]
    fn invalid_titles() {
        let mut game = create_game();

        game.title = String::from("<html>");
        assert!(Validator::new(game.clone()).validate().is_err());

        game.title = String::from("");
        assert!(Validator::new(game.clone()).validate().is_err());
    }

    #[test]
    fn password_only_on_private_games() {
        let mut game = create_game();
        game.password = Some(String::from("hunter2"));

        assert!(Validator::new(game.clone()).validate().is_err());

        game.visibility = Visibility::PRIVATE.to_string();
        assert!(Validator::new(game.clone()).validate().is_ok());

        game.password = Some(String::from("abc"));
        assert!(Validator::new(game).validate().is_err());
    }

    #[test]
    fn negative_fee_rejected() {
        let mut game = create_game();
        game.fee_cents = -1;

        assert!(Validator::new(game).validate().is_err());
    }

    #[test]
    fn unknown_visibility_rejected() {
        let mut game = create_game();
        game.visibility = String::from("HIDDEN");

        assert_eq!(
            Validator::new(game).validate().err(),
            Some(ServiceError::BadRequest(String::from(
                "visibility has to be PUBLIC or PRIVATE"
            )))
        );
    }

    #[test]
    fn updates_clear_omitted_optional_columns() {
        let changes = UpdateGame {
            title: String::from("sunday five-a-side"),
            date: "2024-01-01".parse().unwrap(),
            start_time: "10:00:00".parse().unwrap(),
            duration_minutes: None,
            capacity: 10,
            fee_cents: 500,
            venue: String::from("Riverside pitch 2"),
            rules: String::from("no slide tackles"),
            images: vec![],
            visibility: Visibility::PUBLIC.to_string(),
            password: None,
        };

        let query = diesel::update(games::table.filter(games::id.eq(1))).set(&changes);
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();

        // None means "clear the column", so both have to show up in the
        // statement instead of being skipped
        assert!(sql.contains("duration_minutes"));
        assert!(sql.contains("password"));
    }
}
