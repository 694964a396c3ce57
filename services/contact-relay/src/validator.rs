// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form validation.
//!
//! [`validate`] is total: any JSON object yields either a normalized
//! [`Submission`] or a [`FieldErrors`] listing every violated rule.
//! Normalization here is limited to trimming and lowercasing the email;
//! character stripping happens later in [`crate::sanitize`].

use crate::submission::{Budget, Field, FieldErrors, Submission, Timeline};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const EMAIL_MIN: usize = 5;
pub const EMAIL_MAX: usize = 100;
pub const PROJECT_MIN: usize = 10;
pub const PROJECT_MAX: usize = 1000;
pub const MESSAGE_MAX: usize = 2000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("The regex should be valid")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9][0-9]{9,15}$").expect("The regex should be valid"));

/// Raw view of one field in the payload.
enum RawField<'a> {
    Missing,
    Text(&'a str),
    WrongType,
}

fn raw_field<'a>(body: &'a Map<String, Value>, field: Field) -> RawField<'a> {
    match body.get(field.as_str()) {
        None | Some(Value::Null) => RawField::Missing,
        Some(Value::String(s)) => RawField::Text(s),
        Some(_) => RawField::WrongType,
    }
}

/// Blank optional inputs arrive as `""` from HTML forms and count as absent.
fn optional_text<'a>(
    body: &'a Map<String, Value>,
    field: Field,
    errors: &mut FieldErrors,
    label: &str,
) -> Option<&'a str> {
    match raw_field(body, field) {
        RawField::Missing => None,
        RawField::Text(s) if s.trim().is_empty() => None,
        RawField::Text(s) => Some(s.trim()),
        RawField::WrongType => {
            errors.push(field, format!("{label} must be a string"));
            None
        }
    }
}

fn required_text<'a>(
    body: &'a Map<String, Value>,
    field: Field,
    errors: &mut FieldErrors,
    label: &str,
) -> Option<&'a str> {
    match raw_field(body, field) {
        RawField::Missing => {
            errors.push(field, format!("{label} is required"));
            None
        }
        RawField::Text(s) => Some(s.trim()),
        RawField::WrongType => {
            errors.push(field, format!("{label} must be a string"));
            None
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Latin or Cyrillic letter, whitespace or hyphen.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
        || c.is_whitespace()
        || c == '-'
}

fn check_name(name: &str, errors: &mut FieldErrors) {
    let len = char_len(name);
    if len < NAME_MIN {
        errors.push(Field::Name, format!("Name must be at least {NAME_MIN} characters"));
    }
    if len > NAME_MAX {
        errors.push(Field::Name, format!("Name must not exceed {NAME_MAX} characters"));
    }
    if !name.chars().all(is_name_char) {
        errors.push(Field::Name, "Name may only contain letters, spaces and hyphens");
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if !email_shape_ok(email) {
        errors.push(Field::Email, "Enter a valid email address");
    }
    let len = char_len(email);
    if len < EMAIL_MIN {
        errors.push(Field::Email, format!("Email must be at least {EMAIL_MIN} characters"));
    }
    if len > EMAIL_MAX {
        errors.push(Field::Email, format!("Email must not exceed {EMAIL_MAX} characters"));
    }
}

fn email_shape_ok(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && EMAIL_RE.is_match(email)
}

fn check_phone(phone: &str, errors: &mut FieldErrors) {
    if !PHONE_RE.is_match(phone) {
        errors.push(Field::Phone, "Enter a valid phone number (at least 10 digits)");
    }
}

fn check_project(project: &str, errors: &mut FieldErrors) {
    let len = char_len(project);
    if len < PROJECT_MIN {
        errors.push(
            Field::Project,
            format!("Project description must be at least {PROJECT_MIN} characters"),
        );
    }
    if len > PROJECT_MAX {
        errors.push(
            Field::Project,
            format!("Project description must not exceed {PROJECT_MAX} characters"),
        );
    }
}

fn check_message(message: &str, errors: &mut FieldErrors) {
    if char_len(message) > MESSAGE_MAX {
        errors.push(Field::Message, format!("Message must not exceed {MESSAGE_MAX} characters"));
    }
}

fn parse_choice<T: std::str::FromStr>(
    body: &Map<String, Value>,
    field: Field,
    errors: &mut FieldErrors,
    label: &str,
    allowed: &[&str],
) -> Option<T> {
    let choices = allowed.join(", ");
    match raw_field(body, field) {
        RawField::Text(s) => match s.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.push(field, format!("{label} must be one of: {choices}"));
                None
            }
        },
        RawField::Missing => {
            errors.push(field, format!("Select a {}", label.to_lowercase()));
            None
        }
        RawField::WrongType => {
            errors.push(field, format!("{label} must be one of: {choices}"));
            None
        }
    }
}

/// Validate a decoded contact payload.
pub fn validate(body: &Map<String, Value>) -> Result<Submission, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required_text(body, Field::Name, &mut errors, "Name");
    if let Some(name) = name {
        check_name(name, &mut errors);
    }

    let email = required_text(body, Field::Email, &mut errors, "Email").map(str::to_lowercase);
    if let Some(email) = &email {
        check_email(email, &mut errors);
    }

    let phone = optional_text(body, Field::Phone, &mut errors, "Phone");
    if let Some(phone) = phone {
        check_phone(phone, &mut errors);
    }

    let project = required_text(body, Field::Project, &mut errors, "Project description");
    if let Some(project) = project {
        check_project(project, &mut errors);
    }

    let budget: Option<Budget> = parse_choice(
        body,
        Field::Budget,
        &mut errors,
        "Budget",
        &Budget::ALL.map(|b| b.as_str()),
    );
    let timeline: Option<Timeline> = parse_choice(
        body,
        Field::Timeline,
        &mut errors,
        "Timeline",
        &Timeline::ALL.map(|t| t.as_str()),
    );

    let message = optional_text(body, Field::Message, &mut errors, "Message");
    if let Some(message) = message {
        check_message(message, &mut errors);
    }

    match (name, email, project, budget, timeline) {
        (Some(name), Some(email), Some(project), Some(budget), Some(timeline))
            if errors.is_empty() =>
        {
            let submission = Submission {
                name: name.to_string(),
                email,
                phone: phone.map(str::to_string),
                project: project.to_string(),
                budget,
                timeline,
                message: message.map(str::to_string),
            };
            if !submission.has_contact_channel() {
                errors.push(Field::Email, "Provide an email address or a phone number");
                return Err(errors);
            }
            Ok(submission)
        }
        _ => {
            debug!(fields = %errors, "Submission rejected");
            Err(errors)
        }
    }
}

/// Validate an arbitrary JSON value; non-objects are rejected by the caller.
pub fn validate_value(value: &Value) -> Option<Result<Submission, FieldErrors>> {
    value.as_object().map(validate)
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim().to_lowercase();
    let mut errors = FieldErrors::new();
    check_email(&email, &mut errors);
    errors.is_empty()
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}

pub fn is_valid_name(name: &str) -> bool {
    let mut errors = FieldErrors::new();
    check_name(name.trim(), &mut errors);
    errors.is_empty()
}
