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

use loadmatrix_common::ProbeReading;
use std::future::Future;

/// Point-in-time reader of host utilization. Dimensions which can't be read are left as `None`
/// in the returned reading; the probe itself never fails as a whole.
pub trait ResourceProbe: Send + Sync + 'static {
    fn sample(&self) -> impl Future<Output = ProbeReading> + Send;
}
