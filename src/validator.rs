use crate::errors::ServiceError;
use serde::de::DeserializeOwned;

/// Wrapper around client payloads so handlers can deserialize
/// and validate in one step.
#[derive(Deserialize)]
pub struct Validator<T>(T);

pub trait Validate<T> {
    fn validate(&self) -> Result<(), ServiceError>;
}

impl<T> Validator<T> {
    #[allow(dead_code)]
    pub fn new(i: T) -> Validator<T> {
        Validator::<T>(i)
    }
}

impl<T> Validator<T>
where
    T: Validate<T>,
    T: DeserializeOwned,
{
    /// run the payload's checks, handing back the inner value on success
    pub fn validate(self) -> Result<T, ServiceError> {
        self.0.validate()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Capacity(i32);

    impl Validate<Capacity> for Capacity {
        fn validate(&self) -> Result<(), ServiceError> {
            if self.0 > 0 {
                return Ok(());
            }
            Err(ServiceError::BadRequest("capacity must be positive".to_string()))
        }
    }

    #[test]
    fn invalid_value() {
        let invalid = Validator::new(Capacity(0));

        assert!(invalid.validate().is_err());
    }

    #[test]
    fn valid_value() {
        let valid = Validator::new(Capacity(12));

        assert!(valid.validate().is_ok());
    }
}
