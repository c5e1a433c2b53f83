// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side form validation for sign-up, login and contact forms.
//!
//! Each form yields per-field messages plus an optional form-level message.
//! Required checks come before format checks, so a field reports at most one
//! problem.

use crate::models::{ContactDraft, Credentials, Registration};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use validator::ValidateLength;

pub const MIN_PASSWORD_LEN: u64 = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static PHONE_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9+\s\-()]").expect("phone pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Drop every character a phone number cannot contain.
pub fn sanitize_phone(raw: &str) -> String {
    PHONE_STRIP_RE.replace_all(raw, "").into_owned()
}

/// Validation outcome for one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub fields: BTreeMap<&'static str, String>,
    pub message: Option<String>,
}

impl FormErrors {
    pub fn is_valid(&self) -> bool {
        self.fields.is_empty() && self.message.is_none()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn add(&mut self, field: &'static str, message: &str) {
        self.fields.insert(field, message.to_string());
    }
}

/// Sign-up form contents.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_privacy_policy: bool,
}

impl SignupForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(email) {
            errors.add("email", "Please enter a valid email address");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if !self.password.validate_length(Some(MIN_PASSWORD_LEN), None, None) {
            errors.add("password", "Password must be at least 6 characters");
        }

        if self.confirm_password.is_empty() {
            errors.add("confirmPassword", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirmPassword", "Passwords do not match");
            errors.message = Some("Passwords do not match".to_string());
        }

        if !self.accept_privacy_policy {
            errors.message = Some("Please accept the privacy policy".to_string());
        }

        errors
    }

    /// Backend payload; the email is sent trimmed.
    pub fn to_registration(&self) -> Registration {
        Registration {
            email: self.email.trim().to_string(),
            name: self.name.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
            accept_privacy_policy: self.accept_privacy_policy,
        }
    }
}

/// Login form contents.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors
    }

    pub fn to_credentials(&self) -> Credentials {
        Credentials::new(self.email.trim(), self.password.clone())
    }
}

/// Contact form contents. `name` is the full name as typed.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ContactForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(email) {
            errors.add("email", "Please enter a valid email (e.g., user@example.com)");
        }

        if sanitize_phone(&self.phone).trim().is_empty() {
            errors.add("phone", "Phone number is required");
        }

        errors
    }

    /// Backend payload with a sanitized phone number. The whole name goes in
    /// `firstname`, matching how the board renders initials.
    pub fn to_draft(&self) -> ContactDraft {
        ContactDraft {
            email: self.email.trim().to_string(),
            firstname: self.name.trim().to_string(),
            lastname: None,
            phone: sanitize_phone(&self.phone).trim().to_string(),
        }
    }
}
