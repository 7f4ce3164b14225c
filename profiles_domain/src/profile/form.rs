//! The two forms behind the profile page.
//!
//! An unbound form only displays the current values of its instance. A bound
//! form overlays the submitted values on top of them; only submitted fields
//! are validated and only those end up in the changes.

use super::repo::{Profile, ProfileChanges, UserChanges};
use crate::form::{self, AccountFields, FormErrors};
use crate::user::repo::User;

use validator::{Validate, ValidationError};

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Raw, form-encoded profile page submission. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProfileSubmission {
    pub username: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "form")]
pub struct UserUpdateForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub errors: FormErrors,
    #[serde(skip)]
    changes: Option<UserChanges>,
}

impl UserUpdateForm {
    pub fn new(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            errors: FormErrors::default(),
            changes: None,
        }
    }

    pub fn bind(user: &User, submission: &ProfileSubmission) -> Self {
        let changes = UserChanges {
            username: submission.username.as_deref().map(str::trim).map(str::to_string),
            email: submission.email.as_deref().map(str::trim).map(str::to_string),
        };

        Self {
            username: changes.username.clone().unwrap_or_else(|| user.username.clone()),
            email: changes.email.clone().unwrap_or_else(|| user.email.clone()),
            errors: FormErrors::default(),
            changes: Some(changes),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.changes.is_some()
    }

    /// Validate the submitted fields. Always `false` for an unbound form.
    pub fn is_valid(&mut self) -> bool {
        self.errors = FormErrors::default();

        let Some(changes) = &self.changes else {
            return false;
        };

        self.errors = AccountFields {
            username: changes.username.clone(),
            email: changes.email.clone(),
            password: None,
        }
        .check();

        self.errors.is_empty()
    }

    pub fn changes(&self) -> Option<&UserChanges> {
        self.changes.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "form")]
pub struct ProfileUpdateForm {
    pub image: String,
    #[serde(default)]
    pub errors: FormErrors,
    #[serde(skip)]
    changes: Option<ProfileChanges>,
}

impl ProfileUpdateForm {
    pub fn new(profile: &Profile) -> Self {
        Self {
            image: profile.image.clone(),
            errors: FormErrors::default(),
            changes: None,
        }
    }

    pub fn bind(profile: &Profile, submission: &ProfileSubmission) -> Self {
        let changes = ProfileChanges {
            image: submission.image.as_deref().map(str::trim).map(str::to_string),
        };

        Self {
            image: changes.image.clone().unwrap_or_else(|| profile.image.clone()),
            errors: FormErrors::default(),
            changes: Some(changes),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.changes.is_some()
    }

    /// Validate the submitted fields. Always `false` for an unbound form.
    pub fn is_valid(&mut self) -> bool {
        self.errors = FormErrors::default();

        let Some(changes) = &self.changes else {
            return false;
        };

        if let Some(image) = &changes.image {
            self.errors = validate_image(image);
        }

        self.errors.is_empty()
    }

    pub fn changes(&self) -> Option<&ProfileChanges> {
        self.changes.as_ref()
    }
}

#[derive(Debug, Validate)]
struct ImageField {
    #[validate(length(max = 100, message = "Ensure this filename has at most 100 characters."))]
    #[validate(custom(function = "relative_image_path"))]
    image: Option<String>,
}

fn validate_image(image: &str) -> FormErrors {
    let mut errors = FormErrors::default();
    let mut field = ImageField {
        image: Some(image.to_string()),
    };
    form::take_blank(&mut errors, "image", &mut field.image);

    if let Err(validation_errors) = field.validate() {
        errors.extend(validation_errors.into());
    }
    errors
}

fn relative_image_path(image: &str) -> Result<(), ValidationError> {
    if image.starts_with('/') || image.contains('\\') || image.split('/').any(|part| part == "..") {
        return Err(ValidationError::new("absolute_image_path")
            .with_message("Enter a relative image path.".into()));
    }

    let has_image_extension = image
        .rsplit_once('.')
        .map(|(_, extension)| IMAGE_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    if !has_image_extension {
        return Err(ValidationError::new("invalid_image").with_message(
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                .into(),
        ));
    }
    Ok(())
}

/// What the profile page hands to its template.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProfileContext {
    pub u_form: UserUpdateForm,
    pub p_form: ProfileUpdateForm,
}

impl ProfileContext {
    pub fn new(profile: &Profile) -> Self {
        Self {
            u_form: UserUpdateForm::new(&profile.user),
            p_form: ProfileUpdateForm::new(profile),
        }
    }

    pub fn bind(profile: &Profile, submission: &ProfileSubmission) -> Self {
        Self {
            u_form: UserUpdateForm::bind(&profile.user, submission),
            p_form: ProfileUpdateForm::bind(profile, submission),
        }
    }
}
