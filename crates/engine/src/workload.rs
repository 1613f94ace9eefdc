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

use loadmatrix_common::HarnessError;
use rand::Rng;
use std::sync::Arc;

/// Prompt variants used when none are configured: a greeting, a short factual question, and a
/// code-generation request, to mix short and long generations.
pub const DEFAULT_PROMPTS: &[&str] = &[
    "你好",
    "三角函数是什么",
    "用HTML写一个简单的webgl 三角型 3D 程序",
];

/// The fixed set of prompt variants a worker picks from on every request.
#[derive(Debug, Clone)]
pub struct WorkloadSet {
    prompts: Arc<[String]>,
}

impl WorkloadSet {
    pub fn new(prompts: Vec<String>) -> Result<Self, HarnessError> {
        if prompts.is_empty() {
            return Err(HarnessError::EmptyWorkloadSet);
        }
        Ok(Self {
            prompts: prompts.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Uniformly random prompt.
    pub fn pick(&self) -> &str {
        let idx = rand::rng().random_range(0..self.prompts.len());
        &self.prompts[idx]
    }
}

impl Default for WorkloadSet {
    fn default() -> Self {
        Self {
            prompts: DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_empty_set_rejected() {
        assert_eq!(
            WorkloadSet::new(vec![]).unwrap_err(),
            HarnessError::EmptyWorkloadSet
        );
    }

    #[test]
    fn test_pick_covers_all_variants() {
        let set = WorkloadSet::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            seen.insert(set.pick().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_default_set() {
        let set = WorkloadSet::default();
        assert_eq!(set.len(), DEFAULT_PROMPTS.len());
        assert!(DEFAULT_PROMPTS.contains(&set.pick()));
    }
}
