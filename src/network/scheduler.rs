//! Priority-tiered outbound scheduler.
//!
//! Lines wait in one queue per [`Priority`] tier until the send loop calls
//! [`Scheduler::tick`]. Each tick walks the tiers from High to Low and
//! releases at most one line per tier, stopping at the first tier that still
//! has work for this cycle:
//!
//! - High releases one line per tick until empty.
//! - AboveMedium, Medium and BelowMedium release up to 4, 2 and 1 lines per
//!   cycle respectively.
//! - Low releases one line only if every higher tier was empty at the start
//!   of the tick.
//!
//! When a tick walks past every tier the cycle is complete and the per-tier
//! counters reset. These caps match observed server flood limits and are
//! not configurable.

use std::collections::VecDeque;

use slirc_proto::{Outgoing, Priority};

const ABOVE_MEDIUM_CAP: u32 = 4;
const MEDIUM_CAP: u32 = 2;
const BELOW_MEDIUM_CAP: u32 = 1;

/// One released line and the tier it came from.
pub type Released = (Priority, String);

/// The outbound queues and per-cycle counters.
#[derive(Debug, Default)]
pub struct Scheduler {
    queues: [VecDeque<String>; 5],
    above_medium_sent: u32,
    medium_sent: u32,
    below_medium_sent: u32,
}

fn slot(priority: Priority) -> usize {
    match priority {
        Priority::Low => 0,
        Priority::BelowMedium => 1,
        Priority::Medium => 2,
        Priority::AboveMedium => 3,
        Priority::High | Priority::Critical => 4,
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line at the back of its tier. Critical lines never reach the
    /// scheduler; if one does it is treated as High.
    pub fn push(&mut self, out: Outgoing) {
        self.queues[slot(out.priority)].push_back(out.line);
    }

    /// Put a line that failed to send back at the front of its tier.
    pub fn requeue(&mut self, priority: Priority, line: String) {
        self.queues[slot(priority)].push_front(line);
    }

    /// Lines waiting in one tier.
    pub fn pending(&self, priority: Priority) -> usize {
        self.queues[slot(priority)].len()
    }

    /// Lines waiting in every tier.
    pub fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Start a fresh cycle. Queued lines are kept.
    pub fn reset_cycle(&mut self) {
        self.above_medium_sent = 0;
        self.medium_sent = 0;
        self.below_medium_sent = 0;
    }

    fn pop(&mut self, priority: Priority, out: &mut Vec<Released>) {
        if let Some(line) = self.queues[slot(priority)].pop_front() {
            out.push((priority, line));
        }
    }

    /// Release the lines due this tick, in send order.
    pub fn tick(&mut self) -> Vec<Released> {
        let high = self.pending(Priority::High);
        let above = self.pending(Priority::AboveMedium);
        let medium = self.pending(Priority::Medium);
        let below = self.pending(Priority::BelowMedium);
        let low = self.pending(Priority::Low);

        let mut out = Vec::new();

        if high > 0 {
            self.pop(Priority::High, &mut out);
            if high > 1 {
                return out;
            }
        }

        if above > 0 && self.above_medium_sent < ABOVE_MEDIUM_CAP {
            self.pop(Priority::AboveMedium, &mut out);
            self.above_medium_sent += 1;
            if self.above_medium_sent < ABOVE_MEDIUM_CAP && above > 1 {
                return out;
            }
        }

        if medium > 0 && self.medium_sent < MEDIUM_CAP {
            self.pop(Priority::Medium, &mut out);
            self.medium_sent += 1;
            if self.medium_sent < MEDIUM_CAP && medium > 1 {
                return out;
            }
        }

        if below > 0 && self.below_medium_sent < BELOW_MEDIUM_CAP {
            self.pop(Priority::BelowMedium, &mut out);
            self.below_medium_sent += 1;
        }

        let higher_waiting = high + above + medium + below > 0;
        if low > 0 && !higher_waiting {
            self.pop(Priority::Low, &mut out);
            if low > 1 {
                return out;
            }
        }

        self.reset_cycle();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, priority: Priority) -> Outgoing {
        Outgoing::raw(text).with_priority(priority)
    }

    fn lines(batch: Vec<Released>) -> Vec<String> {
        batch.into_iter().map(|(_, l)| l).collect()
    }

    #[test]
    fn test_high_drains_before_low() {
        let mut s = Scheduler::new();
        for i in 0..3 {
            s.push(line(&format!("H{i}"), Priority::High));
        }
        s.push(line("L0", Priority::Low));

        assert_eq!(lines(s.tick()), vec!["H0"]);
        assert_eq!(lines(s.tick()), vec!["H1"]);
        // Last High line goes out; Low still saw High waiting this tick.
        assert_eq!(lines(s.tick()), vec!["H2"]);
        assert_eq!(lines(s.tick()), vec!["L0"]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_low_alone_sends_one_per_tick() {
        let mut s = Scheduler::new();
        for i in 0..3 {
            s.push(line(&format!("L{i}"), Priority::Low));
        }
        for i in 0..3 {
            assert_eq!(lines(s.tick()), vec![format!("L{i}")]);
        }
        assert!(s.tick().is_empty());
    }

    #[test]
    fn test_low_starves_while_high_refills() {
        let mut s = Scheduler::new();
        s.push(line("L0", Priority::Low));
        for i in 0..5 {
            s.push(line(&format!("H{i}"), Priority::High));
            s.push(line(&format!("H{i}b"), Priority::High));
            let sent = lines(s.tick());
            assert!(sent.iter().all(|l| l.starts_with('H')), "{sent:?}");
        }
        assert_eq!(s.pending(Priority::Low), 1);
    }

    #[test]
    fn test_burst_caps_per_cycle() {
        let mut s = Scheduler::new();
        for i in 0..6 {
            s.push(line(&format!("A{i}"), Priority::AboveMedium));
        }
        s.push(line("M0", Priority::Medium));

        // Three ticks of AboveMedium alone, then the fourth falls through.
        assert_eq!(lines(s.tick()), vec!["A0"]);
        assert_eq!(lines(s.tick()), vec!["A1"]);
        assert_eq!(lines(s.tick()), vec!["A2"]);
        assert_eq!(lines(s.tick()), vec!["A3", "M0"]);
        // Cycle completed and counters reset.
        assert_eq!(lines(s.tick()), vec!["A4"]);
        assert_eq!(lines(s.tick()), vec!["A5"]);
    }

    #[test]
    fn test_capped_tiers_do_not_deadlock() {
        let mut s = Scheduler::new();
        for i in 0..4 {
            s.push(line(&format!("B{i}"), Priority::BelowMedium));
        }
        let mut sent = Vec::new();
        for _ in 0..4 {
            sent.extend(lines(s.tick()));
        }
        assert_eq!(sent, vec!["B0", "B1", "B2", "B3"]);
    }

    #[test]
    fn test_requeue_goes_to_front() {
        let mut s = Scheduler::new();
        s.push(line("M1", Priority::Medium));
        s.requeue(Priority::Medium, "M0".to_string());
        assert_eq!(lines(s.tick()), vec!["M0"]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_critical_is_treated_as_high() {
        let mut s = Scheduler::new();
        s.push(line("x", Priority::Medium));
        s.push(line("y", Priority::Critical));
        assert_eq!(s.pending(Priority::High), 1);
        assert_eq!(lines(s.tick()), vec!["y", "x"]);
    }
}
