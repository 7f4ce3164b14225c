//! Field-level validation shared by the request bodies and the profile forms.
//!
//! Errors are collected per field instead of failing fast, so that a client
//! can show every problem with a submission at once.

use crate::error::{AppError, AppResult};

use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";

/// Field name to error messages, ordered by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<Cow<'static, str>, Vec<Cow<'static, str>>>);

impl FormErrors {
    pub fn single(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Multiple messages for the same field are collected into a list for that field.
    pub fn add(
        &mut self,
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) {
        self.0
            .entry(field.into())
            .or_insert_with(Vec::new)
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[Cow<'static, str>]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub(crate) fn extend(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok` when no errors were collected.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::UnprocessableEntity { errors: self })
        }
    }
}

/// A rule without a message reports its code.
impl From<ValidationErrors> for FormErrors {
    fn from(validation_errors: ValidationErrors) -> Self {
        let mut errors = Self::default();
        for (field, field_errors) in validation_errors.field_errors() {
            for error in field_errors {
                errors.add(
                    field.to_string(),
                    error.message.clone().unwrap_or_else(|| error.code.clone()),
                );
            }
        }
        errors
    }
}

/// Blank submitted values are reported as required and not checked any further.
pub(crate) fn take_blank(
    errors: &mut FormErrors,
    field: &'static str,
    value: &mut Option<String>,
) {
    if value.as_deref().is_some_and(str::is_empty) {
        errors.add(field, REQUIRED);
        *value = None;
    }
}

/// Account fields as submitted. `None` means the field was not submitted.
#[derive(Debug, Default, Validate)]
pub struct AccountFields {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    #[validate(custom(
        function = "username_characters",
        message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
    ))]
    pub username: Option<String>,

    #[validate(email(message = "Enter a valid email address."))]
    #[validate(length(max = 254, message = "Ensure this value has at most 254 characters."))]
    pub email: Option<String>,

    pub password: Option<String>,
}

impl AccountFields {
    pub fn check(mut self) -> FormErrors {
        let mut errors = FormErrors::default();
        take_blank(&mut errors, "username", &mut self.username);
        take_blank(&mut errors, "email", &mut self.email);
        take_blank(&mut errors, "password", &mut self.password);

        if let Err(validation_errors) = self.validate() {
            errors.extend(validation_errors.into());
        }
        errors
    }
}

fn username_characters(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username"))
    }
}
