use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db;
use crate::errors::ServiceError;
use crate::schema::notifications;

/// What happened; stored alongside a human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    GameJoined,
    GameCanceled,
    NewComment,
    RatingSubmitted,
    RatingVerified,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Kind::GameJoined => "GAME_JOINED",
            Kind::GameCanceled => "GAME_CANCELED",
            Kind::NewComment => "NEW_COMMENT",
            Kind::RatingSubmitted => "RATING_SUBMITTED",
            Kind::RatingVerified => "RATING_VERIFIED",
        };

        write!(f, "{}", kind)
    }
}

#[derive(Debug, Serialize, Queryable, Identifiable)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub game_id: i64,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationFilter {
    /// set to true to only list unread notifications
    pub unread: Option<bool>,
}

impl Notification {
    /// Store a notification for `recipient_id`. Meant to be called inside
    /// the transaction of the action that triggered it, so the recipient
    /// never hears about something that was rolled back.
    pub fn notify(
        recipient_id: i64,
        game_id: i64,
        kind: Kind,
        message: String,
        conn: &db::Conn,
    ) -> Result<Notification, ServiceError> {
        let notification = diesel::insert_into(notifications::table)
            .values((
                notifications::recipient_id.eq(recipient_id),
                notifications::game_id.eq(game_id),
                notifications::kind.eq(kind.to_string()),
                notifications::message.eq(message),
            ))
            .get_result(conn)?;

        Ok(notification)
    }

    /// your notifications, newest first
    pub fn find_for(
        recipient_id: i64,
        filter: NotificationFilter,
        conn: &db::Conn,
    ) -> Result<Vec<Notification>, ServiceError> {
        let mut query = notifications::table
            .filter(notifications::recipient_id.eq(recipient_id))
            .order(notifications::created_at.desc())
            .into_boxed();

        if filter.unread.unwrap_or(false) {
            query = query.filter(notifications::is_read.eq(false));
        }

        let notifications = query.load::<Notification>(conn)?;

        Ok(notifications)
    }

    pub fn mark_read(
        id: i64,
        recipient_id: i64,
        conn: &db::Conn,
    ) -> Result<Notification, ServiceError> {
        let notification: Notification = notifications::table
            .filter(notifications::id.eq(id))
            .first(conn)?;

        if notification.recipient_id != recipient_id {
            forbidden!("this notification isn't yours");
        }

        let notification = diesel::update(&notification)
            .set(notifications::is_read.eq(true))
            .get_result(conn)?;

        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_match_the_wire_format() {
        assert_eq!(Kind::GameJoined.to_string(), "GAME_JOINED");
        assert_eq!(Kind::RatingVerified.to_string(), "RATING_VERIFIED");

        let serialized = serde_json::to_string(&Kind::NewComment).unwrap();
        assert_eq!(serialized, "\"NEW_COMMENT\"");
    }
}
