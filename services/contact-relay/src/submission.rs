// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission model.
//!
//! A [`Submission`] only exists once the raw payload has passed
//! validation; the wire payload itself is handled as an untyped
//! `serde_json::Value` so that every violated rule can be reported.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Budget tier selected on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Small,
    Medium,
    Large,
    Enterprise,
}

/// Urgency of the requested project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeline {
    Urgent,
    Normal,
    Flexible,
}

impl Budget {
    pub const ALL: [Budget; 4] = [Budget::Small, Budget::Medium, Budget::Large, Budget::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Enterprise => "enterprise",
        }
    }
}

impl Timeline {
    pub const ALL: [Timeline; 3] = [Timeline::Urgent, Timeline::Normal, Timeline::Flexible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Normal => "normal",
            Self::Flexible => "flexible",
        }
    }
}

impl FromStr for Budget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|b| b.as_str() == s).ok_or(())
    }
}

impl FromStr for Timeline {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated contact request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub project: String,
    pub budget: Budget,
    pub timeline: Timeline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Submission {
    /// Whether the sender left at least one way to reach them.
    pub fn has_contact_channel(&self) -> bool {
        !self.email.is_empty() || self.phone.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Form fields, in the order they appear on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Phone,
    Project,
    Budget,
    Timeline,
    Message,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Project,
        Field::Budget,
        Field::Timeline,
        Field::Message,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Project => "project",
            Self::Budget => "budget",
            Self::Timeline => "timeline",
            Self::Message => "message",
        }
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|f| f.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every violated rule, grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn get(&self, field: Field) -> &[String] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    /// All messages, flattened in form order.
    pub fn messages(&self) -> Vec<String> {
        self.0.values().flatten().cloned().collect()
    }

    /// First message per field, as rendered inline next to each input.
    pub fn first_per_field(&self) -> BTreeMap<Field, String> {
        self.0
            .iter()
            .filter_map(|(field, messages)| messages.first().map(|m| (*field, m.clone())))
            .collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(Field::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}
