// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Abuse patterns for the contact endpoint.

/// What each request in an attack carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Valid,
    Invalid,
    Malformed,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Number of unique client IPs, assigned round robin
    pub unique_ips: usize,
    /// Whether requests identify their client at all
    pub identified: bool,
    pub payload: PayloadKind,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 50,
            unique_ips: 1,
            identified: true,
            payload: PayloadKind::Valid,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// One client hammering the form.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 60,
            ..Default::default()
        }
    }

    /// Many clients, each sending a handful of requests.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 200,
            unique_ips: 20,
            ..Default::default()
        }
    }

    /// Requests with no way to tell clients apart.
    pub fn anonymous_flood() -> Self {
        Self {
            total_requests: 30,
            identified: false,
            ..Default::default()
        }
    }

    /// Invalid submissions sent to probe the validator.
    pub fn validation_spam() -> Self {
        Self {
            total_requests: 20,
            payload: PayloadKind::Invalid,
            ..Default::default()
        }
    }

    /// Garbage bodies.
    pub fn malformed_spam() -> Self {
        Self {
            total_requests: 20,
            payload: PayloadKind::Malformed,
            ..Default::default()
        }
    }

    /// Requests the limiter should admit under a fixed window of `max_requests`.
    pub fn expected_admitted(&self, max_requests: u32) -> usize {
        let clients = if self.identified { self.unique_ips.max(1) } else { 1 };
        (0..clients)
            .map(|client| {
                let sent = self.total_requests / clients
                    + usize::from(client < self.total_requests % clients);
                sent.min(max_requests as usize)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_admitted() {
        assert_eq!(AttackConfig::single_ip_flood().expected_admitted(5), 5);
        assert_eq!(AttackConfig::distributed_flood().expected_admitted(5), 100);
        assert_eq!(AttackConfig::anonymous_flood().expected_admitted(5), 5);

        let uneven = AttackConfig {
            total_requests: 7,
            unique_ips: 3,
            ..Default::default()
        };
        assert_eq!(uneven.expected_admitted(2), 6);
    }
}
