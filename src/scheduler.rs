use std::{thread, time::Duration};

use crate::prelude::*;

/// One named unit of periodic work.
pub struct Task<'a> {
    pub name: &'static str,
    pub run: Box<dyn FnMut() -> Result + 'a>,
}

/// Minute-style dispatcher: runs every task once per tick, sequentially.
///
/// Each task runs inside its own error boundary. A failing task is logged and
/// never aborts the remaining tasks or later ticks.
#[derive(Default)]
#[must_use]
pub struct Scheduler<'a> {
    tasks: Vec<Task<'a>>,
}

impl<'a> Scheduler<'a> {
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_task(mut self, name: &'static str, run: impl FnMut() -> Result + 'a) -> Self {
        self.tasks.push(Task { name, run: Box::new(run) });
        self
    }

    /// Run every task once.
    pub fn tick(&mut self) {
        for task in &mut self.tasks {
            if let Err(error) = (task.run)() {
                error!(task = task.name, error = format!("{error:#}"), "task failed");
            }
        }
    }

    /// Loop forever with the given tick interval.
    pub fn run(mut self, interval: Duration) -> ! {
        loop {
            self.tick();
            trace!(?interval, "sleeping…");
            thread::sleep(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_failing_task_does_not_stop_the_others() {
        let n_runs = Cell::new(0);
        let mut scheduler = Scheduler::new()
            .with_task("failing", || bail!("boom"))
            .with_task("counting", || {
                n_runs.set(n_runs.get() + 1);
                Ok(())
            });

        scheduler.tick();
        scheduler.tick();

        assert_eq!(n_runs.get(), 2);
    }
}
