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

use loadmatrix_common::{HarnessError, TrialResult};

/// Destination for the results of a run, delivered once, in matrix order.
pub trait ResultSink {
    fn consume(&mut self, results: &[TrialResult]) -> Result<(), HarnessError>;
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn consume(&mut self, results: &[TrialResult]) -> Result<(), HarnessError> {
        (**self).consume(results)
    }
}

/// Fan the same results out to several sinks, stopping at the first failure.
impl<S: ResultSink> ResultSink for Vec<S> {
    fn consume(&mut self, results: &[TrialResult]) -> Result<(), HarnessError> {
        for sink in self.iter_mut() {
            sink.consume(results)?;
        }
        Ok(())
    }
}
