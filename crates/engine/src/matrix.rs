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

use loadmatrix_common::{HarnessError, TrialConfig};

/// The ordered set of trials for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialMatrix {
    cells: Vec<TrialConfig>,
}

impl TrialMatrix {
    /// Cross product of workloads and concurrency levels, workload outer, concurrency inner.
    pub fn cross<S: AsRef<str>>(
        workloads: &[S],
        concurrencies: &[usize],
    ) -> Result<Self, HarnessError> {
        let mut cells = Vec::with_capacity(workloads.len() * concurrencies.len());
        for workload in workloads {
            for &concurrency in concurrencies {
                cells.push(TrialConfig::new(workload.as_ref(), concurrency)?);
            }
        }
        if cells.is_empty() {
            return Err(HarnessError::EmptyMatrix);
        }
        Ok(Self { cells })
    }

    pub fn configs(&self) -> &[TrialConfig] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
