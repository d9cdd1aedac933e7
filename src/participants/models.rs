use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::auth::CurrentAccount;
use crate::db;
use crate::errors::ServiceError;
use crate::games::models::Visibility;
use crate::games::{Game, Status};
use crate::notifications::models::{Kind, Notification};
use crate::schema::{games, participants, users};
use crate::users::AccountSummary;

/// A player's membership in a game.
///
/// **GET /api/games/{id}/participants**
#[derive(Debug, Serialize, Insertable, Queryable, Identifiable)]
#[table_name = "participants"]
#[primary_key(game_id, user_id)]
pub struct Participation {
    pub game_id: i64,
    pub user_id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Join payload; only private games look at the password.
#[derive(Debug, Deserialize, Default)]
pub struct JoinRequest {
    pub password: Option<String>,
}

impl Participation {
    /// Add the player to the game.
    ///
    /// The whole check-and-add runs in one transaction with the game row
    /// locked, so two concurrent joins can't both squeeze past the
    /// capacity check. Each rejection has its own message: the game isn't
    /// open, the player already joined, or the game is full.
    pub fn join(
        game_id: i64,
        player: &CurrentAccount,
        request: JoinRequest,
        now: DateTime<Utc>,
        conn: &db::Conn,
    ) -> Result<Participation, ServiceError> {
        conn.transaction::<Participation, ServiceError, _>(|| {
            let game: Game = games::table
                .filter(games::id.eq(game_id))
                .for_update()
                .first(conn)?;

            let already_member = Participation::is_member(game_id, player.id, conn)?;
            let joined = Game::participant_count(game_id, conn)?;

            admit(
                &game,
                request.password.as_deref(),
                already_member,
                joined,
                now,
            )?;

            let participation: Participation = diesel::insert_into(participants::table)
                .values((
                    participants::game_id.eq(game_id),
                    participants::user_id.eq(player.id),
                ))
                .get_result(conn)?;

            Notification::notify(
                game.organizer_id,
                game.id,
                Kind::GameJoined,
                format!("{} joined \"{}\"", player.username, game.title),
                conn,
            )?;

            Ok(participation)
        })
    }

    /// membership is the only requirement to leave
    pub fn leave(game_id: i64, user_id: i64, conn: &db::Conn) -> Result<(), ServiceError> {
        let deleted = diesel::delete(
            participants::table
                .filter(participants::game_id.eq(game_id))
                .filter(participants::user_id.eq(user_id)),
        )
        .execute(conn)?;

        if deleted == 0 {
            conflict!("you're not a participant of this game");
        }

        Ok(())
    }

    pub fn is_member(game_id: i64, user_id: i64, conn: &db::Conn) -> Result<bool, ServiceError> {
        let found = participants::table
            .filter(participants::game_id.eq(game_id))
            .filter(participants::user_id.eq(user_id))
            .select(participants::user_id)
            .first::<i64>(conn)
            .optional()?;

        Ok(found.is_some())
    }

    pub fn player_ids(game_id: i64, conn: &db::Conn) -> Result<Vec<i64>, ServiceError> {
        let ids = participants::table
            .filter(participants::game_id.eq(game_id))
            .select(participants::user_id)
            .load::<i64>(conn)?;

        Ok(ids)
    }

    /// the roster of a game, in join order
    pub fn roster(game_id: i64, conn: &db::Conn) -> Result<Vec<AccountSummary>, ServiceError> {
        let roster = participants::table
            .inner_join(users::table)
            .filter(participants::game_id.eq(game_id))
            .order(participants::created_at)
            .select((users::id, users::username, users::name))
            .load::<AccountSummary>(conn)?;

        Ok(roster)
    }
}

/// Decide whether a player may join the game right now.
///
/// The checks run in a fixed order: the game has to be open, a private
/// game's password has to match, the player can't already be in, and
/// there has to be room left. Public games never ask for a password,
/// even when the row still carries one from before a visibility change.
fn admit(
    game: &Game,
    supplied_password: Option<&str>,
    already_member: bool,
    joined: i64,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if game.status_at(now) != Status::UPCOMING {
        conflict!("this game is not open for joining");
    }

    if game.visibility == Visibility::PRIVATE.to_string() {
        if let Some(password) = game.password.as_deref() {
            if supplied_password != Some(password) {
                forbidden!("wrong password for this game");
            }
        }
    }

    if already_member {
        conflict!("you already joined this game");
    }

    if joined >= i64::from(game.capacity) {
        conflict!("this game is full");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(value: &str) -> DateTime<Utc> {
        format!("{}:00Z", value).parse().unwrap()
    }

    fn game() -> Game {
        Game {
            id: 1,
            title: String::from("sunday-five-a-side"),
            organizer_id: 1,
            date: "2024-01-01".parse().unwrap(),
            start_time: "10:00:00".parse().unwrap(),
            duration_minutes: Some(60),
            capacity: 2,
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

    // an hour before kickoff, while the game is still upcoming
    fn before_kickoff() -> DateTime<Utc> {
        instant("2024-01-01T09:00")
    }

    #[test]
    fn joining_stops_at_capacity() {
        let game = game();

        assert!(admit(&game, None, false, 0, before_kickoff()).is_ok());
        assert!(admit(&game, None, false, 1, before_kickoff()).is_ok());

        assert_eq!(
            admit(&game, None, false, 2, before_kickoff()),
            Err(ServiceError::Conflict(String::from("this game is full")))
        );
    }

    #[test]
    fn joining_twice_is_rejected() {
        let game = game();

        assert_eq!(
            admit(&game, None, true, 1, before_kickoff()),
            Err(ServiceError::Conflict(String::from(
                "you already joined this game"
            )))
        );
    }

    #[test]
    fn only_upcoming_games_accept_players() {
        let game = game();

        // kicked off
        assert_eq!(
            admit(&game, None, false, 0, instant("2024-01-01T10:00")),
            Err(ServiceError::Conflict(String::from(
                "this game is not open for joining"
            )))
        );

        // over
        assert!(admit(&game, None, false, 0, instant("2024-01-01T12:00")).is_err());

        let mut canceled = game;
        canceled.status = Status::CANCELED.to_string();
        assert!(admit(&canceled, None, false, 0, before_kickoff()).is_err());
    }

    #[test]
    fn private_games_check_the_password() {
        let mut game = game();
        game.visibility = Visibility::PRIVATE.to_string();
        game.password = Some(String::from("hunter2"));

        assert_eq!(
            admit(&game, None, false, 0, before_kickoff()),
            Err(ServiceError::Forbidden(String::from(
                "wrong password for this game"
            )))
        );

        assert!(admit(&game, Some("wrong"), false, 0, before_kickoff()).is_err());
        assert!(admit(&game, Some("hunter2"), false, 0, before_kickoff()).is_ok());
    }

    #[test]
    fn public_games_ignore_a_leftover_password() {
        // a game switched back to public can keep a stale password column
        let mut game = game();
        game.password = Some(String::from("hunter2"));

        assert!(admit(&game, None, false, 0, before_kickoff()).is_ok());
    }

    #[test]
    fn membership_wins_over_capacity_when_the_game_is_full() {
        let game = game();

        // the duplicate-join answer wins over the capacity one
        assert_eq!(
            admit(&game, None, true, 2, before_kickoff()),
            Err(ServiceError::Conflict(String::from(
                "you already joined this game"
            )))
        );
    }
}
