//! Postal address value object.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Postal address used for shipment origins and destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Recipient or sender name.
    pub name: String,

    /// First address line.
    pub line1: String,

    /// Optional second address line.
    pub line2: Option<String>,

    /// City.
    pub city: String,

    /// Postal code.
    pub postal_code: String,

    /// ISO 3166-1 alpha-2 country code (e.g., "FR").
    pub country: String,
}

impl Address {
    /// Creates a validated address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any required field is empty or the
    /// country code is not two uppercase letters.
    pub fn new(
        name: impl Into<String>,
        line1: impl Into<String>,
        line2: Option<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let line1 = line1.into();
        let city = city.into();
        let postal_code = postal_code.into();
        let country = country.into();

        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if line1.trim().is_empty() {
            return Err(ValidationError::empty_field("line1"));
        }
        if city.trim().is_empty() {
            return Err(ValidationError::empty_field("city"));
        }
        if postal_code.trim().is_empty() {
            return Err(ValidationError::empty_field("postal_code"));
        }
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::invalid_format(
                "country",
                "expected ISO 3166-1 alpha-2 code",
            ));
        }

        Ok(Self {
            name,
            line1,
            line2,
            city,
            postal_code,
            country,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_address() -> Result<Address, ValidationError> {
        Address::new(
            "Marie Dubois",
            "12 rue des Vignes",
            None,
            "Lyon",
            "69002",
            "FR",
        )
    }

    #[test]
    fn new_accepts_valid_address() {
        let address = valid_address().unwrap();
        assert_eq!(address.city, "Lyon");
        assert_eq!(address.country, "FR");
        assert!(address.line2.is_none());
    }

    #[test]
    fn new_accepts_second_line() {
        let address = Address::new(
            "Marie Dubois",
            "12 rue des Vignes",
            Some("Bâtiment B".to_string()),
            "Lyon",
            "69002",
            "FR",
        )
        .unwrap();
        assert_eq!(address.line2.as_deref(), Some("Bâtiment B"));
    }

    #[test]
    fn new_rejects_empty_name() {
        let result = Address::new("", "12 rue des Vignes", None, "Lyon", "69002", "FR");
        assert!(matches!(result, Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn new_rejects_blank_line1() {
        let result = Address::new("Marie Dubois", "   ", None, "Lyon", "69002", "FR");
        assert!(matches!(result, Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn new_rejects_lowercase_country_code() {
        let result = Address::new("Marie Dubois", "12 rue des Vignes", None, "Lyon", "69002", "fr");
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn new_rejects_long_country_code() {
        let result = Address::new(
            "Marie Dubois",
            "12 rue des Vignes",
            None,
            "Lyon",
            "69002",
            "FRA",
        );
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn address_serializes_roundtrip() {
        let address = valid_address().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, address);
    }
}
