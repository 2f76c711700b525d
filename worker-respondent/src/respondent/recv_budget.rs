/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Consecutive receive failure tracking.

/// Counts back-to-back receive failures for one responder.
///
/// The count lives in `[0, max]`. A successful receive resets it to zero;
/// reaching `max` exhausts the budget, which is terminal for the responder.
#[derive(Debug, Clone)]
pub(crate) struct RecvErrorBudget {
    consecutive: u32,
    max: u32,
}

impl RecvErrorBudget {
    /// A budget tolerating `max - 1` consecutive failures.
    ///
    /// A `max` of zero is treated as one so a single failure still stops the
    /// loop instead of letting it spin.
    pub(crate) fn new(max: u32) -> Self {
        Self {
            consecutive: 0,
            max: max.max(1),
        }
    }

    /// Records a failed receive. Returns `true` once the budget is exhausted.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.consecutive = (self.consecutive + 1).min(self.max);
        self.is_exhausted()
    }

    /// Records a successful receive.
    pub(crate) fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Current consecutive failure count.
    pub(crate) const fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub(crate) const fn max(&self) -> u32 {
        self.max
    }

    pub(crate) const fn is_exhausted(&self) -> bool {
        self.consecutive >= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausts_at_max() {
        let mut budget = RecvErrorBudget::new(3);
        assert!(!budget.record_failure());
        assert!(!budget.record_failure());
        assert!(budget.record_failure());
        assert_eq!(budget.consecutive(), 3);
    }

    #[test]
    fn test_reset_restores_full_budget() {
        let mut budget = RecvErrorBudget::new(3);
        budget.record_failure();
        budget.record_failure();
        budget.reset();
        assert_eq!(budget.consecutive(), 0);

        // A full max - 1 run after the reset must still not exhaust it.
        assert!(!budget.record_failure());
        assert!(!budget.record_failure());
        assert!(budget.record_failure());
    }

    #[test]
    fn test_count_never_exceeds_max() {
        let mut budget = RecvErrorBudget::new(2);
        for _ in 0..10 {
            budget.record_failure();
        }
        assert_eq!(budget.consecutive(), budget.max());
    }

    #[test]
    fn test_zero_max_stops_on_first_failure() {
        let mut budget = RecvErrorBudget::new(0);
        assert_eq!(budget.max(), 1);
        assert!(budget.record_failure());
    }
}
