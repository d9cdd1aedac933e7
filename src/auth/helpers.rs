use actix_identity::Identity;

use crate::auth::models::CurrentAccount;
use crate::errors::ServiceError;
use crate::users::Role;

/// get the account of the current authenticated session
/// returns Unauthorized when no identity cookie is present
pub fn get_account(id: &Identity) -> Result<CurrentAccount, ServiceError> {
    let raw = id.identity().ok_or(ServiceError::Unauthorized)?;

    serde_json::from_str(&raw).map_err(|error| {
        warn!("unable to deserialize the identity cookie: {}", error);
        ServiceError::Unauthorized
    })
}

/// store the account in the identity cookie
pub fn remember(id: &Identity, account: &CurrentAccount) -> Result<(), ServiceError> {
    let raw = serde_json::to_string(account).map_err(|error| {
        error!("unable to serialize the identity cookie: {}", error);
        ServiceError::InternalServerError
    })?;

    id.remember(raw);

    Ok(())
}

pub fn forget(id: &Identity) {
    id.forget();
}

/// authenticated sessions with the PLAYER role, everyone else is rejected
pub fn verify_player(id: &Identity) -> Result<CurrentAccount, ServiceError> {
    let account = get_account(id)?;

    if account.role != Role::PLAYER {
        forbidden!("only players can do this");
    }

    Ok(account)
}

/// authenticated sessions with the ORGANIZER role, everyone else is rejected
pub fn verify_organizer(id: &Identity) -> Result<CurrentAccount, ServiceError> {
    let account = get_account(id)?;

    if account.role != Role::ORGANIZER {
        forbidden!("only organizers can do this");
    }

    Ok(account)
}
