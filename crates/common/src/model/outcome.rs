// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::time::Duration;
use thiserror::Error;

/// Why a single request against the target service did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Non-success status code: {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// The result of one request attempt by one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// Wall time from just before the request was issued until it completed or failed.
    pub elapsed: Duration,
    /// `None` when the request succeeded.
    pub failure: Option<RequestFailure>,
}

impl RequestOutcome {
    pub fn success(elapsed: Duration) -> Self {
        Self {
            elapsed,
            failure: None,
        }
    }

    pub fn failure(elapsed: Duration, failure: RequestFailure) -> Self {
        Self {
            elapsed,
            failure: Some(failure),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_failure() {
        let outcome = RequestOutcome::success(Duration::from_millis(100));
        assert!(outcome.succeeded());
        assert_eq!(outcome.elapsed, Duration::from_millis(100));
    }

    #[test]
    fn test_failure_keeps_reason() {
        let outcome = RequestOutcome::failure(
            Duration::from_secs(60),
            RequestFailure::TimedOut(Duration::from_secs(60)),
        );
        assert!(!outcome.succeeded());
        assert_eq!(
            outcome.failure.map(|f| f.to_string()),
            Some("Request timed out after 60s".to_string())
        );
    }
}
