// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Post-validation sanitization of free-text fields.
//!
//! [`sanitize_string`] is deliberately aggressive: it keeps only letters
//! (Latin or Cyrillic), digits, whitespace and hyphens. It must never be
//! applied to the email address, which has its own normalizer.

use crate::submission::Submission;

fn is_cyrillic_letter(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

fn is_kept_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_cyrillic_letter(c) || c.is_whitespace() || c == '-'
}

/// Collapse every run of whitespace into a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Drop disallowed characters (angle brackets included), collapse whitespace, then trim.
pub fn sanitize_string(s: &str) -> String {
    let kept: String = s.chars().filter(|c| is_kept_char(*c)).collect();
    collapse_whitespace(&kept).trim().to_string()
}

pub fn sanitize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Keep digits and the `+` prefix only.
pub fn sanitize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Apply the per-field sanitizers to a validated submission.
pub fn sanitize_submission(submission: Submission) -> Submission {
    Submission {
        name: sanitize_string(&submission.name),
        email: sanitize_email(&submission.email),
        phone: submission.phone.as_deref().map(sanitize_phone),
        project: sanitize_string(&submission.project),
        budget: submission.budget,
        timeline: submission.timeline,
        message: submission
            .message
            .as_deref()
            .map(sanitize_string)
            .filter(|m| !m.is_empty()),
    }
}
