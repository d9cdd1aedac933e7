use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db;
use crate::errors::ServiceError;
use crate::schema::{game_ratings, users};
use crate::users::AccountSummary;

/// How the rating player's game went, self-reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameResult {
    WIN,
    LOSE,
    DRAW,
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Ratings start PENDING and are VERIFIED once by the organizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Verification {
    PENDING,
    VERIFIED,
}

impl std::fmt::Display for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Serialize, Queryable, Identifiable)]
#[table_name = "game_ratings"]
pub struct Rating {
    pub id: i64,
    pub game_id: i64,
    pub player_id: i64,
    pub result: String,
    pub goals: i32,
    pub assists: i32,
    pub verification: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

///
/// **POST /api/games/{id}/ratings**
#[derive(Debug, Deserialize)]
pub struct SubmitRating {
    pub result: GameResult,
    #[serde(default)]
    pub goals: i32,
    #[serde(default)]
    pub assists: i32,
}

#[derive(Debug, Serialize, Queryable)]
pub struct RatingResponse {
    pub id: i64,
    pub game_id: i64,
    pub result: String,
    pub goals: i32,
    pub assists: i32,
    pub verification: String,
    pub player: AccountSummary,
}

impl Rating {
    /// One rating per player per game; the unique index turns a second
    /// submission into a conflict.
    pub fn create(
        game_id: i64,
        player_id: i64,
        rating: &SubmitRating,
        conn: &db::Conn,
    ) -> Result<Rating, ServiceError> {
        let rating = diesel::insert_into(game_ratings::table)
            .values((
                game_ratings::game_id.eq(game_id),
                game_ratings::player_id.eq(player_id),
                game_ratings::result.eq(rating.result.to_string()),
                game_ratings::goals.eq(rating.goals),
                game_ratings::assists.eq(rating.assists),
            ))
            .get_result(conn)
            .map_err(|error| match error {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => ServiceError::Conflict("you already rated this game".to_string()),
                _ => error.into(),
            })?;

        Ok(rating)
    }

    pub fn find_by_id(id: i64, conn: &db::Conn) -> Result<Rating, ServiceError> {
        let rating = game_ratings::table
            .filter(game_ratings::id.eq(id))
            .first(conn)?;

        Ok(rating)
    }

    pub fn find_by_game(game_id: i64, conn: &db::Conn) -> Result<Vec<RatingResponse>, ServiceError> {
        let ratings = game_ratings::table
            .inner_join(users::table)
            .filter(game_ratings::game_id.eq(game_id))
            .order(game_ratings::created_at)
            .select((
                game_ratings::id,
                game_ratings::game_id,
                game_ratings::result,
                game_ratings::goals,
                game_ratings::assists,
                game_ratings::verification,
                (users::id, users::username, users::name),
            ))
            .load::<RatingResponse>(conn)?;

        Ok(ratings)
    }

    pub fn is_verified(&self) -> bool {
        self.verification == Verification::VERIFIED.to_string()
    }

    /// PENDING → VERIFIED, once
    pub fn verify(&self, conn: &db::Conn) -> Result<Rating, ServiceError> {
        if self.is_verified() {
            conflict!("this rating is already verified");
        }

        let rating = diesel::update(self)
            .set(game_ratings::verification.eq(Verification::VERIFIED.to_string()))
            .get_result(conn)?;

        Ok(rating)
    }
}

impl crate::validator::Validate<SubmitRating> for SubmitRating {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.goals < 0 || self.goals > 50 {
            bad_request!("goals have to be between 0 and 50");
        }

        if self.assists < 0 || self.assists > 50 {
            bad_request!("assists have to be between 0 and 50");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;

    #[test]
    fn tally_bounds() {
        let negative = SubmitRating {
            result: GameResult::WIN,
            goals: -1,
            assists: 0,
        };
        assert!(Validator::new(negative).validate().is_err());

        let inflated = SubmitRating {
            result: GameResult::DRAW,
            goals: 3,
            assists: 51,
        };
        assert!(Validator::new(inflated).validate().is_err());

        let valid = SubmitRating {
            result: GameResult::LOSE,
            goals: 2,
            assists: 1,
        };
        assert!(Validator::new(valid).validate().is_ok());
    }

    #[test]
    fn verification_state() {
        let rating = Rating {
            id: 1,
            game_id: 1,
            player_id: 2,
            result: GameResult::WIN.to_string(),
            goals: 2,
            assists: 0,
            verification: Verification::PENDING.to_string(),
            created_at: None,
            updated_at: None,
        };

        assert!(!rating.is_verified());
    }
}
