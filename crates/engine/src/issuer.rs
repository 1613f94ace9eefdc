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

use loadmatrix_common::RequestFailure;
use std::future::Future;

/// What a successful request returned, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    pub response_bytes: usize,
}

/// Sends one unit of work to the service under test.
///
/// Implementations own the wire format. Timing and the per-request timeout are applied by the
/// caller, so an implementation only has to report whether the request succeeded.
pub trait RequestIssuer: Send + Sync + 'static {
    fn send(
        &self,
        workload_id: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<Completion, RequestFailure>> + Send;
}
