use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::Validator;

/// Where a player lives, for localisation purposes.
/// Every part is optional, but a present part must be valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub country_code: Option<String>,
    pub locale: Option<String>,
    pub time_zone: Option<String>,
}

impl Address {
    pub fn new(
        country_code: Option<String>,
        locale: Option<String>,
        time_zone: Option<String>,
    ) -> Result<Self, ValidationError> {
        let address = Self {
            country_code,
            locale,
            time_zone,
        };
        address.validate()?;
        Ok(address)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(code) = &self.country_code {
            Validator::validate_country_code(code)?;
        }
        if let Some(locale) = &self.locale {
            Validator::validate_locale(locale)?;
        }
        if let Some(tz) = &self.time_zone {
            Validator::validate_time_zone(tz)?;
        }
        Ok(())
    }
}
