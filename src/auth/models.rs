use regex::Regex;
use url::Url;

use crate::errors::ServiceError;
use crate::users::models::{validate_username, NewAccount};
use crate::users::{Account, Role};

/// What the identity cookie carries between requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentAccount {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&Account> for CurrentAccount {
    fn from(account: &Account) -> CurrentAccount {
        CurrentAccount {
            id: account.id,
            username: account.username.clone(),
            role: account.role(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
    pub image: Option<String>,
}

impl Registration {
    pub fn into_account(self) -> NewAccount {
        NewAccount {
            username: self.username,
            email: self.email,
            password: self.password,
            role: self.role.to_string(),
            name: self.name,
            image: self.image,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub old: String,
    pub new: String,
}

impl crate::validator::Validate<Registration> for Registration {
    fn validate(&self) -> Result<(), ServiceError> {
        validate_username(&self.username)?;

        let pattern: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

        if !pattern.is_match(&self.email) {
            bad_request!("that doesn't look like an email address");
        }

        if self.password.len() < 8 {
            bad_request!("your password should at least be 8 characters long");
        }

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

impl crate::validator::Validate<PasswordChange> for PasswordChange {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.old == self.new {
            bad_request!("the new password can't be the same as the old password");
        }

        if self.new.len() < 8 {
            bad_request!("your password should be at least 8 characters long");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;

    fn registration() -> Registration {
        Registration {
            username: String::from("rickybobby"),
            email: String::from("ricky@example.com"),
            password: String::from("hunter2boogaloo"),
            role: Role::PLAYER,
            name: String::from("Ricky Bobby"),
            image: None,
        }
    }

    #[test]
    fn valid_registration() {
        assert!(Validator::new(registration()).validate().is_ok());
    }

    #[test]
    fn invalid_email() {
        let mut registration = registration();
        registration.email = String::from("not-an-email");

        assert!(Validator::new(registration).validate().is_err());
    }

    #[test]
    fn short_password() {
        let mut registration = registration();
        registration.password = String::from("short");

        assert!(Validator::new(registration).validate().is_err());
    }

    #[test]
    fn invalid_image_url() {
        let mut registration = registration();
        registration.image = Some(String::from("definitely not a url"));

        assert!(Validator::new(registration).validate().is_err());
    }

    #[test]
    fn password_change_rules() {
        let same = PasswordChange {
            old: String::from("hunter2boogaloo"),
            new: String::from("hunter2boogaloo"),
        };
        assert!(Validator::new(same).validate().is_err());

        let short = PasswordChange {
            old: String::from("hunter2boogaloo"),
            new: String::from("short"),
        };
        assert!(Validator::new(short).validate().is_err());

        let valid = PasswordChange {
            old: String::from("hunter2boogaloo"),
            new: String::from("electric-boogaloo"),
        };
        assert!(Validator::new(valid).validate().is_ok());
    }
}
