use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db;
use crate::errors::ServiceError;
use crate::schema::{game_comments, users};
use crate::users::AccountSummary;

#[derive(Debug, Serialize, Queryable, Identifiable)]
#[table_name = "game_comments"]
pub struct Comment {
    pub id: i64,
    pub game_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

///
/// **POST /api/games/{id}/comments**
#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub content: String,
}

#[derive(Debug, Serialize, Queryable)]
pub struct CommentResponse {
    pub id: i64,
    pub game_id: i64,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub author: AccountSummary,
}

impl Comment {
    pub fn create(
        game_id: i64,
        author_id: i64,
        content: &str,
        conn: &db::Conn,
    ) -> Result<Comment, ServiceError> {
        let comment = diesel::insert_into(game_comments::table)
            .values((
                game_comments::game_id.eq(game_id),
                game_comments::author_id.eq(author_id),
                game_comments::content.eq(content),
            ))
            .get_result(conn)?;

        Ok(comment)
    }

    /// a game's comments, oldest first
    pub fn find_by_game(
        game_id: i64,
        conn: &db::Conn,
    ) -> Result<Vec<CommentResponse>, ServiceError> {
        let comments = game_comments::table
            .inner_join(users::table)
            .filter(game_comments::game_id.eq(game_id))
            .order(game_comments::created_at)
            .select((
                game_comments::id,
                game_comments::game_id,
                game_comments::content,
                game_comments::created_at,
                (users::id, users::username, users::name),
            ))
            .load::<CommentResponse>(conn)?;

        Ok(comments)
    }
}

impl crate::validator::Validate<NewComment> for NewComment {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.content.trim().is_empty() {
            bad_request!("a comment can't be empty");
        }

        if self.content.len() > 1000 {
            bad_request!("a comment can hold at most 1000 characters");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;

    #[test]
    fn comment_content_rules() {
        let empty = NewComment {
            content: String::from("   "),
        };
        assert!(Validator::new(empty).validate().is_err());

        let endless = NewComment {
            content: "a".repeat(1001),
        };
        assert!(Validator::new(endless).validate().is_err());

        let valid = NewComment {
            content: String::from("great game, same time next week?"),
        };
        assert!(Validator::new(valid).validate().is_ok());
    }
}
