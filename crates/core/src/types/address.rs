//! Delivery addresses within the service area.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Barangays of Balungao, Pangasinan served by the refill station.
pub const BARANGAYS: [&str; 20] = [
    "Angayan Norte",
    "Angayan Sur",
    "Capulaan",
    "Esmeralda",
    "Kita-kita",
    "Mabini",
    "Mauban",
    "Poblacion",
    "Pugaro",
    "Rajal",
    "San Andres",
    "San Aurelio 1st",
    "San Aurelio 2nd",
    "San Aurelio 3rd",
    "San Joaquin",
    "San Julian",
    "San Leon",
    "San Marcelino",
    "San Miguel",
    "San Raymundo",
];

const TOWN_SUFFIX: &str = "Balungao, Pangasinan";

/// Errors that can occur when building a [`DeliveryAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("house number cannot be empty")]
    EmptyHouseNumber,
    #[error("unknown barangay: {0}")]
    UnknownBarangay(String),
}

/// One of the twenty [`BARANGAYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Barangay(&'static str);

impl Barangay {
    /// Look up a barangay by name. Matching ignores case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::UnknownBarangay` if the name is not in the service area.
    pub fn parse(name: &str) -> Result<Self, AddressError> {
        let wanted = name.trim();
        BARANGAYS
            .into_iter()
            .find(|b| b.eq_ignore_ascii_case(wanted))
            .map(Self)
            .ok_or_else(|| AddressError::UnknownBarangay(wanted.to_owned()))
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Barangay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A full delivery address: `"{house}, {barangay}, Balungao, Pangasinan"`.
///
/// Stored on the user document as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryAddress(String);

impl DeliveryAddress {
    /// Compose an address from a house number and barangay.
    ///
    /// # Errors
    ///
    /// Returns an error if the house number is blank or the barangay is unknown.
    pub fn compose(house_number: &str, barangay: &str) -> Result<Self, AddressError> {
        let house = house_number.trim();
        if house.is_empty() {
            return Err(AddressError::EmptyHouseNumber);
        }
        let barangay = Barangay::parse(barangay)?;
        Ok(Self(format!("{house}, {barangay}, {TOWN_SUFFIX}")))
    }

    /// Wrap an address already stored in a document.
    #[must_use]
    pub fn from_stored(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compose() {
        let address = DeliveryAddress::compose("12", "San Leon").unwrap();
        assert_eq!(address.as_str(), "12, San Leon, Balungao, Pangasinan");
    }

    #[test]
    fn test_barangay_lookup_is_case_insensitive() {
        assert_eq!(Barangay::parse(" kita-KITA ").unwrap().name(), "Kita-kita");
    }

    #[test]
    fn test_rejects_outside_service_area() {
        assert_eq!(
            DeliveryAddress::compose("4", "Rosales"),
            Err(AddressError::UnknownBarangay("Rosales".into()))
        );
        assert_eq!(
            DeliveryAddress::compose("  ", "Mabini"),
            Err(AddressError::EmptyHouseNumber)
        );
    }
}
