//! Periodic game tasks owned by the engine.
//!
//! Each task is an explicit entry with a period and a next-due instant taken
//! from the injected clock. Nothing runs on its own: the runtime calls
//! [`Scheduler::due`] from its main loop and the engine executes whatever is
//! returned. A task that is overdue by several periods fires once and is then
//! realigned to `now + period`.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    /// 1 s tick for the active timed quest. Ordered first so a deadline is
    /// judged before anything else in the same tick.
    QuestCountdown,
    /// Removes world events that ran out.
    ExpiredEventSweep,
    /// Rolls for a new world event.
    WorldEventSpawn,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    period: Duration,
    next_due: DateTime<Utc>,
}

/// Periods for the built-in tasks.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub spawn_interval: Duration,
    pub sweep_interval: Duration,
    pub countdown_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            spawn_interval: Duration::seconds(180),
            sweep_interval: Duration::seconds(30),
            countdown_interval: Duration::seconds(1),
        }
    }
}

impl SchedulerConfig {
    pub fn period_of(&self, kind: TaskKind) -> Duration {
        match kind {
            TaskKind::QuestCountdown => self.countdown_interval,
            TaskKind::ExpiredEventSweep => self.sweep_interval,
            TaskKind::WorldEventSpawn => self.spawn_interval,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: BTreeMap<TaskKind, ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) a task. First fire is one period from `now`.
    pub fn start(&mut self, kind: TaskKind, period: Duration, now: DateTime<Utc>) {
        debug!("scheduler: arming {:?} every {}s", kind, period.num_seconds());
        self.tasks.insert(
            kind,
            ScheduledTask {
                period,
                next_due: now + period,
            },
        );
    }

    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        let removed = self.tasks.remove(&kind).is_some();
        if removed {
            debug!("scheduler: cancelled {:?}", kind);
        }
        removed
    }

    pub fn is_armed(&self, kind: TaskKind) -> bool {
        self.tasks.contains_key(&kind)
    }

    pub fn next_due(&self, kind: TaskKind) -> Option<DateTime<Utc>> {
        self.tasks.get(&kind).map(|task| task.next_due)
    }

    /// Tasks whose time has come, in [`TaskKind`] order. Each returned task is
    /// rescheduled one period after `now`.
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<TaskKind> {
        let mut fired = Vec::new();
        for (kind, task) in self.tasks.iter_mut() {
            if now >= task.next_due {
                task.next_due = now + task.period;
                fired.push(*kind);
            }
        }
        fired
    }
}
