//! Raw request forms and their validation.
//!
//! Forms arrive wrapped in [`Tainted`] and leave either as verified domain
//! values or as a [`ValidationError`] naming every rejected field. No
//! repository or credential store is touched before validation passes.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ValidationError;
use crate::request::PrincipalId;
use crate::sanitizer::{
    Axis, CoordinateSanitizer, EmailSanitizer, SanitizationError, Sanitizer, TextSanitizer,
};
use crate::secret::Secret;
use crate::shipment::{Location, NewShipment};
use crate::tainted::Tainted;
use crate::verified::Verified;

/// A coordinate as sent by a client: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    /// A JSON number
    Number(f64),
    /// A string that should hold a decimal number
    Text(String),
}

impl From<f64> for RawCoordinate {
    fn from(value: f64) -> Self {
        RawCoordinate::Number(value)
    }
}

/// Shipment creation form, flat as on the wire.
///
/// Every field is optional here so that missing fields are reported by
/// name instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ShipmentInput {
    pub pickup_address: Option<String>,
    pub pickup_latitude: Option<RawCoordinate>,
    pub pickup_longitude: Option<RawCoordinate>,
    pub dropoff_address: Option<String>,
    pub dropoff_latitude: Option<RawCoordinate>,
    pub dropoff_longitude: Option<RawCoordinate>,
    /// Free-text cargo category, e.g. "General"
    pub cargo_type: Option<String>,
    /// Weight band as entered, e.g. "1000-5000 kg"
    pub weight: Option<String>,
    pub truck_type: Option<String>,
}

/// Validates [`ShipmentInput`] into a [`NewShipment`].
#[derive(Debug, Clone, Copy)]
pub struct ShipmentValidator {
    text: TextSanitizer,
}

impl ShipmentValidator {
    /// Creates a validator that caps text fields at `max_text_len` characters.
    pub fn new(max_text_len: usize) -> Self {
        Self {
            text: TextSanitizer::new(max_text_len),
        }
    }

    /// Checks every field and builds the record to insert.
    ///
    /// `owner` and `created_at` come from the caller, never from the form.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` listing all missing or invalid fields.
    pub fn validate(
        &self,
        input: Tainted<ShipmentInput>,
        owner: PrincipalId,
        created_at: DateTime<Utc>,
    ) -> Result<NewShipment, ValidationError> {
        let input = input.into_inner();
        let mut errors = ValidationError::new();

        let pickup = self.location(
            "pickup",
            input.pickup_address,
            input.pickup_latitude,
            input.pickup_longitude,
            &mut errors,
        );
        let dropoff = self.location(
            "dropoff",
            input.dropoff_address,
            input.dropoff_latitude,
            input.dropoff_longitude,
            &mut errors,
        );
        let cargo_type = text_field(&self.text, "cargo_type", input.cargo_type, &mut errors);
        let weight = text_field(&self.text, "weight", input.weight, &mut errors);
        let truck_type = text_field(&self.text, "truck_type", input.truck_type, &mut errors);

        match (pickup, dropoff, cargo_type, weight, truck_type) {
            (Some(pickup), Some(dropoff), Some(cargo_type), Some(weight), Some(truck_type))
                if errors.is_empty() =>
            {
                Ok(NewShipment {
                    owner_id: owner,
                    pickup,
                    dropoff,
                    cargo_type,
                    weight,
                    truck_type,
                    created_at,
                })
            }
            _ => Err(errors),
        }
    }

    fn location(
        &self,
        prefix: &str,
        address: Option<String>,
        latitude: Option<RawCoordinate>,
        longitude: Option<RawCoordinate>,
        errors: &mut ValidationError,
    ) -> Option<Location> {
        let address = text_field(&self.text, &format!("{}_address", prefix), address, errors);
        let latitude = coordinate_field(
            Axis::Latitude,
            &format!("{}_latitude", prefix),
            latitude,
            errors,
        );
        let longitude = coordinate_field(
            Axis::Longitude,
            &format!("{}_longitude", prefix),
            longitude,
            errors,
        );

        Some(Location {
            address: address?,
            latitude: latitude?,
            longitude: longitude?,
        })
    }
}

/// Account registration form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct RegistrationInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<Secret<String>>,
    pub password_confirmation: Option<Secret<String>>,
}

/// A registration whose fields passed format checks.
///
/// Uniqueness of email and phone is checked by the credential store.
#[derive(Debug)]
pub struct VerifiedRegistration {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) password: Secret<String>,
}

impl VerifiedRegistration {
    /// Normalized (lowercase) e-mail address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Trimmed phone number.
    pub fn phone(&self) -> &str {
        &self.phone
    }
}

/// Validates [`RegistrationInput`].
#[derive(Debug, Clone, Copy)]
pub struct RegistrationValidator {
    text: TextSanitizer,
    email: EmailSanitizer,
    min_password_len: usize,
}

impl RegistrationValidator {
    /// Creates a validator with the given text and password limits.
    pub fn new(max_text_len: usize, min_password_len: usize) -> Self {
        Self {
            text: TextSanitizer::new(max_text_len),
            email: EmailSanitizer::new(max_text_len),
            min_password_len,
        }
    }

    /// Checks name, e-mail, phone and the password pair.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` listing all rejected fields.
    pub fn validate(
        &self,
        input: Tainted<RegistrationInput>,
    ) -> Result<VerifiedRegistration, ValidationError> {
        let input = input.into_inner();
        let mut errors = ValidationError::new();

        let name = text_field(&self.text, "name", input.name, &mut errors);
        let email = match input.email {
            Some(raw) => record(&mut errors, "email", self.email.sanitize(Tainted::new(raw))),
            None => {
                errors.push("email", "is required");
                None
            }
        };
        let phone = text_field(&self.text, "phone", input.phone, &mut errors);
        let password = self.password(input.password, input.password_confirmation, &mut errors);

        match (name, email, phone, password) {
            (Some(name), Some(email), Some(phone), Some(password)) if errors.is_empty() => {
                Ok(VerifiedRegistration {
                    name,
                    email,
                    phone,
                    password,
                })
            }
            _ => Err(errors),
        }
    }

    fn password(
        &self,
        password: Option<Secret<String>>,
        confirmation: Option<Secret<String>>,
        errors: &mut ValidationError,
    ) -> Option<Secret<String>> {
        let Some(password) = password.filter(|p| !p.expose_secret().is_empty()) else {
            errors.push("password", "is required");
            return None;
        };

        let mut ok = true;
        if password.expose_secret().chars().count() < self.min_password_len {
            errors.push(
                "password",
                format!("must be at least {} characters", self.min_password_len),
            );
            ok = false;
        }

        let confirmed = confirmation
            .as_ref()
            .is_some_and(|c| c.expose_secret() == password.expose_secret());
        if !confirmed {
            errors.push("password", "confirmation does not match");
            ok = false;
        }

        ok.then_some(password)
    }
}

/// Login form: either identifier plus password.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    /// Matched against both e-mail and phone
    pub email_or_phone: Option<String>,
    /// Plain password, redacted in logs
    pub password: Option<Secret<String>>,
}

impl LoginInput {
    /// Checks that both fields are present.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the missing fields.
    pub fn require(self) -> Result<(String, Secret<String>), ValidationError> {
        let mut errors = ValidationError::new();

        let login = self
            .email_or_phone
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if login.is_none() {
            errors.push("email_or_phone", "is required");
        }

        let password = self.password.filter(|p| !p.expose_secret().is_empty());
        if password.is_none() {
            errors.push("password", "is required");
        }

        match (login, password) {
            (Some(login), Some(password)) => Ok((login, password)),
            _ => Err(errors),
        }
    }
}

fn record<T>(
    errors: &mut ValidationError,
    field: &str,
    result: Result<Verified<T>, SanitizationError>,
) -> Option<T> {
    match result {
        Ok(verified) => Some(verified.into_inner()),
        Err(e) => {
            errors.push(field, e.message());
            None
        }
    }
}

fn text_field(
    sanitizer: &TextSanitizer,
    field: &str,
    value: Option<String>,
    errors: &mut ValidationError,
) -> Option<String> {
    match value {
        Some(raw) => record(errors, field, sanitizer.sanitize(Tainted::new(raw))),
        None => {
            errors.push(field, "is required");
            None
        }
    }
}

fn coordinate_field(
    axis: Axis,
    field: &str,
    value: Option<RawCoordinate>,
    errors: &mut ValidationError,
) -> Option<f64> {
    let number = match value {
        None => {
            errors.push(field, "is required");
            return None;
        }
        Some(RawCoordinate::Number(n)) => n,
        Some(RawCoordinate::Text(s)) => match s.trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) => {
                errors.push(field, "must be a number");
                return None;
            }
        },
    };

    record(
        errors,
        field,
        CoordinateSanitizer::new(axis).sanitize(Tainted::new(number)),
    )
}
