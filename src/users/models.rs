use argon2::Config;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rand::Rng;
use regex::Regex;
use url::Url;

use crate::db;
use crate::errors::ServiceError;
use crate::schema::{player_details, users};

/// An account is exactly one of these, chosen at registration.
/// Organizers publish games, players join them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Role {
    PLAYER,
    ORGANIZER,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for Role {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PLAYER" => Ok(Role::PLAYER),
            "ORGANIZER" => Ok(Role::ORGANIZER),
            _ => Err(ServiceError::BadRequest(format!(
                "unknown role '{}'",
                value
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Queryable, Identifiable, AsChangeset, Debug, Clone)]
#[table_name = "users"]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, skip_deserializing)]
    pub password: String,
    pub role: String,
    pub name: String,
    pub image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[table_name = "users"]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub name: String,
    pub image: Option<String>,
}

/// The public face of an account, embedded in game and rating responses.
#[derive(Serialize, Queryable, Debug)]
pub struct AccountSummary {
    pub id: i64,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[table_name = "users"]
pub struct UpdateProfile {
    pub name: String,
    pub image: Option<String>,
}

impl Account {
    pub fn find(id: i64, conn: &db::Conn) -> Result<Self, ServiceError> {
        let account = users::table.filter(users::id.eq(id)).first(conn)?;

        Ok(account)
    }

    pub fn find_by_email(email: &str, conn: &db::Conn) -> Result<Self, ServiceError> {
        let account = users::table.filter(users::email.eq(email)).first(conn)?;

        Ok(account)
    }

    /// Persist a new account; players also get an empty details row,
    /// in the same transaction.
    pub fn create(mut account: NewAccount, conn: &db::Conn) -> Result<Self, ServiceError> {
        account.password = hash_password(&account.password)?;

        let account = conn.transaction::<Account, ServiceError, _>(|| {
            let account: Account = diesel::insert_into(users::table)
                .values(&account)
                .get_result(conn)?;

            if account.role() == Role::PLAYER {
                diesel::insert_into(player_details::table)
                    .values(player_details::user_id.eq(account.id))
                    .execute(conn)?;
            }

            Ok(account)
        })?;

        Ok(account)
    }

    pub fn update_profile(
        &self,
        changes: &UpdateProfile,
        conn: &db::Conn,
    ) -> Result<Self, ServiceError> {
        let account = diesel::update(self).set(changes).get_result(conn)?;

        Ok(account)
    }

    pub fn update_password(&mut self, password: &str, conn: &db::Conn) -> Result<(), ServiceError> {
        self.password = hash_password(password)?;
        diesel::update(&*self)
            .set(users::password.eq(&self.password))
            .execute(conn)?;

        Ok(())
    }

    /// Removes the account; player details, participations, ratings,
    /// comments and notifications cascade in the database.
    pub fn delete(id: i64, conn: &db::Conn) -> Result<(), ServiceError> {
        diesel::delete(users::table.filter(users::id.eq(id))).execute(conn)?;

        Ok(())
    }

    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|_| {
            warn!("account {} carries unknown role '{}'", self.id, self.role);
            Role::PLAYER
        })
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
        }
    }

    pub fn verify_password(&self, password: &[u8]) -> Result<(), ServiceError> {
        let is_match = argon2::verify_encoded(&self.password, password)?;

        if !is_match {
            return Err(ServiceError::Unauthorized);
        }

        Ok(())
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt: [u8; 32] = rand::thread_rng().gen();
    let config = Config::default();

    let hash = argon2::hash_encoded(password.as_bytes(), &salt, &config)?;

    Ok(hash)
}

impl crate::validator::Validate<UpdateProfile> for UpdateProfile {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            bad_request!("name can't be empty");
        }

        if self.name.trim().len() > 60 {
            bad_request!("name is too long, max 60 characters");
        }

        if let Some(image) = self.image.as_ref() {
            if Url::parse(image).is_err() {
                bad_request!("the image url is not a valid url");
            }
        }

        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), ServiceError> {
    if username.trim().is_empty() {
        bad_request!("username is too short");
    }

    if username.trim().len() > 20 {
        bad_request!("username is too long, max 20 characters");
    }

    let pattern: Regex = Regex::new(r"^[0-9A-Za-z-_]+$").unwrap();

    if !pattern.is_match(username) {
        bad_request!("username can only contain letters, numbers, '-' and '_'");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: Role) -> Account {
        Account {
            id: 1,
            username: String::from("ricky"),
            email: String::from("ricky@example.com"),
            password: String::from("hunter2boogaloo"),
            role: role.to_string(),
            name: String::from("Ricky Bobby"),
            image: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    /// the account password should never be exposed through the api
    fn password_should_not_leak() {
        let password = "password";
        let mut account = account(Role::PLAYER);
        account.password = password.to_string();

        let serialized = serde_json::to_string(&account).unwrap();

        assert_eq!(serialized.contains(password), false);
    }

    #[test]
    fn role_round_trip() {
        assert_eq!("PLAYER".parse::<Role>().unwrap(), Role::PLAYER);
        assert_eq!("ORGANIZER".parse::<Role>().unwrap(), Role::ORGANIZER);
        assert!("REFEREE".parse::<Role>().is_err());

        assert_eq!(account(Role::ORGANIZER).role(), Role::ORGANIZER);
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("rickybobby").is_ok());
        assert!(validate_username("a-b_c-0123").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("a€$b").is_err());
        assert!(validate_username("way-way-way-too-long-username").is_err());
    }

    #[test]
    fn incorrect_password() {
        let mut account = account(Role::PLAYER);
        account.password = hash_password("hunter2boogaloo").unwrap();

        assert!(account.verify_password(b"hunter2boogaloo").is_ok());
        assert!(account.verify_password(b"not-the-password").is_err());
    }
}
