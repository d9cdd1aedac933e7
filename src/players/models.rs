use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db;
use crate::errors::ServiceError;
use crate::schema::player_details;
use crate::users::Account;

/// A player's football profile; one row per player account, created
/// empty at registration.
#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, AsChangeset, Clone)]
#[table_name = "player_details"]
#[primary_key(user_id)]
pub struct PlayerDetails {
    pub user_id: i64,
    pub age_group: Option<String>,
    pub skill_level: Option<String>,
    pub positions: Vec<String>,
    pub rank_technique: i32,
    pub rank_physical: i32,
    pub rank_defense: i32,
    pub rank_attack: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals: i32,
    pub assists: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

///
/// **PUT /api/players/profile**
#[derive(Debug, Deserialize)]
pub struct UpdatePlayerProfile {
    pub name: String,
    pub image: Option<String>,
    pub age_group: Option<String>,
    pub skill_level: Option<String>,
    #[serde(default)]
    pub positions: Vec<String>,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[table_name = "player_details"]
pub struct DetailsChanges {
    pub age_group: Option<String>,
    pub skill_level: Option<String>,
    pub positions: Vec<String>,
}

///
/// **PUT /api/players/rank-scores**
#[derive(Debug, Deserialize, AsChangeset)]
#[table_name = "player_details"]
pub struct RankScores {
    pub rank_technique: i32,
    pub rank_physical: i32,
    pub rank_defense: i32,
    pub rank_attack: i32,
}

#[derive(Debug, Serialize)]
pub struct PlayerProfile {
    pub account: Account,
    pub details: PlayerDetails,
    pub win_percentage: f64,
}

impl PlayerDetails {
    pub fn find(user_id: i64, conn: &db::Conn) -> Result<PlayerDetails, ServiceError> {
        let details = player_details::table
            .filter(player_details::user_id.eq(user_id))
            .first(conn)?;

        Ok(details)
    }

    pub fn update(
        user_id: i64,
        changes: &DetailsChanges,
        conn: &db::Conn,
    ) -> Result<PlayerDetails, ServiceError> {
        let details = diesel::update(player_details::table.filter(player_details::user_id.eq(user_id)))
            .set(changes)
            .get_result(conn)?;

        Ok(details)
    }

    pub fn update_rank_scores(
        user_id: i64,
        scores: &RankScores,
        conn: &db::Conn,
    ) -> Result<PlayerDetails, ServiceError> {
        let details = diesel::update(player_details::table.filter(player_details::user_id.eq(user_id)))
            .set(scores)
            .get_result(conn)?;

        Ok(details)
    }

    /// share of played games that were wins, 0 when no games played yet
    pub fn win_percentage(&self) -> f64 {
        let total = self.wins + self.draws + self.losses;

        if total == 0 {
            return 0.0;
        }

        f64::from(self.wins) / f64::from(total) * 100.0
    }
}

impl PlayerProfile {
    pub fn assemble(account: Account, details: PlayerDetails) -> PlayerProfile {
        PlayerProfile {
            win_percentage: details.win_percentage(),
            account,
            details,
        }
    }
}

impl crate::validator::Validate<UpdatePlayerProfile> for UpdatePlayerProfile {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            bad_request!("name can't be empty");
        }

        if self.name.trim().len() > 60 {
            bad_request!("name is too long, max 60 characters");
        }

        if let Some(image) = self.image.as_ref() {
            if url::Url::parse(image).is_err() {
                bad_request!("the image url is not a valid url");
            }
        }

        if self.positions.len() > 5 {
            bad_request!("a player can list at most 5 positions");
        }

        Ok(())
    }
}

impl crate::validator::Validate<RankScores> for RankScores {
    fn validate(&self) -> Result<(), ServiceError> {
        let scores = [
            self.rank_technique,
            self.rank_physical,
            self.rank_defense,
            self.rank_attack,
        ];

        if scores.iter().any(|score| *score < 0 || *score > 100) {
            bad_request!("rank scores have to be between 0 and 100");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;

    fn details() -> PlayerDetails {
        PlayerDetails {
            user_id: 1,
            age_group: None,
            skill_level: None,
            positions: vec![],
            rank_technique: 0,
            rank_physical: 0,
            rank_defense: 0,
            rank_attack: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals: 0,
            assists: 0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn win_percentage_with_no_games() {
        assert_eq!(details().win_percentage(), 0.0);
    }

    #[test]
    fn win_percentage_math() {
        let mut details = details();
        details.wins = 3;
        details.draws = 1;
        details.losses = 1;

        assert_eq!(details.win_percentage(), 60.0);
    }

    #[test]
    fn rank_scores_are_bounded() {
        let valid = RankScores {
            rank_technique: 0,
            rank_physical: 55,
            rank_defense: 100,
            rank_attack: 70,
        };
        assert!(Validator::new(valid).validate().is_ok());

        let negative = RankScores {
            rank_technique: -1,
            rank_physical: 55,
            rank_defense: 100,
            rank_attack: 70,
        };
        assert!(Validator::new(negative).validate().is_err());

        let inflated = RankScores {
            rank_technique: 0,
            rank_physical: 101,
            rank_defense: 100,
            rank_attack: 70,
        };
        assert!(Validator::new(inflated).validate().is_err());
    }
}
