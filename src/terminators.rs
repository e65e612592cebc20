//! Terminators for cooperatively stopping a long-running `IpSolver::solve` call.
//!
//! This module provides several implementations of the [`Terminator`] trait:
//! - [`InterruptTerminator`]: Responds to Ctrl-C (SIGINT) or a programmatic interrupt.
//! - [`TimeOutTerminator`]: Terminates after a specified wall-clock time limit.
//! - [`MultipleTerminators`]: Combines multiple terminators.
//!
//! Terminators are polled once per outer iteration, at the same boundary where
//! `iterMax` and the tolerance checks are evaluated; they never preempt an
//! in-flight KKT solve.
//!
//! # Note
//! [`InterruptTerminator`] installs a global signal handler and **can only be
//! constructed once** per process. Attempting to create more than one will panic.

use std::sync::{Arc, atomic::AtomicBool};

/// Why a [`Terminator`] asked the solve loop to stop early.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TerminationReason {
    Interrupted,
    TimeLimit,
}

pub trait Terminator {
    fn initialize(&mut self) {}

    fn terminate(&mut self) -> Option<TerminationReason>;
}

/// Terminator that responds to Ctrl-C (SIGINT) or a programmatic interrupt.
///
/// # Note
/// Only one instance of `InterruptTerminator` can be constructed per process,
/// as it installs a global signal handler. Creating more than one will panic.
pub struct InterruptTerminator {
    interrupted: Arc<AtomicBool>,
}

impl InterruptTerminator {
    pub fn new() -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        ctrlc::set_handler({
            let interrupted_clone = interrupted.clone();
            move || {
                interrupted_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        })
        .expect("Error setting Ctrl-C handler");
        Self { interrupted }
    }

    pub fn interrupt(&mut self) {
        self.interrupted
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Default for InterruptTerminator {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminator for InterruptTerminator {
    fn terminate(&mut self) -> Option<TerminationReason> {
        if self.interrupted.load(std::sync::atomic::Ordering::SeqCst) {
            Some(TerminationReason::Interrupted)
        } else {
            None
        }
    }
}

/// Terminator that triggers after a specified number of seconds have elapsed
/// since `initialize` was called.
pub struct TimeOutTerminator {
    max_time_secs: u64,
    start_time: std::time::Instant,
}

impl TimeOutTerminator {
    pub fn new(max_time_secs: u64) -> Self {
        Self {
            max_time_secs,
            start_time: std::time::Instant::now(),
        }
    }
}

impl Terminator for TimeOutTerminator {
    fn initialize(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    fn terminate(&mut self) -> Option<TerminationReason> {
        if self.start_time.elapsed().as_secs() >= self.max_time_secs {
            Some(TerminationReason::TimeLimit)
        } else {
            None
        }
    }
}

/// Terminator that combines multiple terminators and triggers if any of them do.
pub struct MultipleTerminators {
    terminators: Vec<Box<dyn Terminator>>,
}

impl MultipleTerminators {
    pub fn new(terminators: Vec<Box<dyn Terminator>>) -> Self {
        Self { terminators }
    }
}

impl Terminator for MultipleTerminators {
    fn initialize(&mut self) {
        for terminator in &mut self.terminators {
            terminator.initialize();
        }
    }

    fn terminate(&mut self) -> Option<TerminationReason> {
        for terminator in &mut self.terminators {
            if let Some(reason) = terminator.as_mut().terminate() {
                return Some(reason);
            }
        }
        None
    }
}

/// A terminator that never fires; the default when no cooperative stop is needed.
pub struct NoOpTerminator {}

impl Terminator for NoOpTerminator {
    fn terminate(&mut self) -> Option<TerminationReason> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    mod platform {
        pub fn send_sigint() {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            let pid = std::process::id() as i32;
            signal::kill(Pid::from_raw(pid), Signal::SIGINT).expect("Failed to send SIGINT");
        }
    }

    #[cfg(windows)]
    mod platform {
        pub fn send_sigint() {
            use windows_sys::Win32::System::Console::{CTRL_C_EVENT, GenerateConsoleCtrlEvent};

            unsafe {
                GenerateConsoleCtrlEvent(CTRL_C_EVENT, 0);
            }
        }
    }

    #[test]
    fn interrupt_terminator_fires_on_sigint() {
        let mut terminator = InterruptTerminator::new();

        std::thread::spawn(|| {
            std::thread::sleep(std::time::Duration::from_millis(200));
            platform::send_sigint();
        });

        loop {
            if let Some(reason) = terminator.terminate() {
                assert_eq!(reason, TerminationReason::Interrupted);
                break;
            }
        }
    }

    #[test]
    fn timeout_terminator_fires_after_duration() {
        let mut terminator = TimeOutTerminator::new(0);
        terminator.initialize();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(terminator.terminate(), Some(TerminationReason::TimeLimit));
    }

    #[test]
    fn multiple_terminators_fires_if_any_fires() {
        let mut combo = MultipleTerminators::new(vec![
            Box::new(NoOpTerminator {}),
            Box::new(TimeOutTerminator::new(0)),
        ]);
        combo.initialize();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(combo.terminate(), Some(TerminationReason::TimeLimit));
    }
}
