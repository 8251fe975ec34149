use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::engine::TypingEngine;
use crate::scheduler::Clock;

const SLEEP_SLICE_MS: u64 = 50;

/// Drive `engine` against its own clock until it completes.
///
/// Sleeps in short slices so `stop` is noticed quickly; when it is set the engine
/// is stopped and an error is returned.
pub fn run_realtime<C: Clock>(engine: &mut TypingEngine<C>, stop: &AtomicBool) -> Result<()> {
    engine.start();

    loop {
        if stop.load(Ordering::SeqCst) {
            engine.stop();
            return Err(anyhow!("aborted"));
        }

        engine.poll();
        if engine.is_completed() {
            return Ok(());
        }

        let Some(due) = engine.next_deadline() else {
            return Err(anyhow!(
                "nothing scheduled while {:?}; run cannot finish",
                engine.state()
            ));
        };
        let wait = due.saturating_sub(engine.clock().now_ms());
        sleep_interruptible(stop, wait);
    }
}

/// Sleep for `ms` in slices, giving up early once `stop` is set. Returns whether
/// the whole duration elapsed.
pub fn sleep_interruptible(stop: &AtomicBool, ms: u64) -> bool {
    let mut remaining = ms;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        if remaining == 0 {
            return true;
        }
        let slice = remaining.min(SLEEP_SLICE_MS);
        std::thread::sleep(Duration::from_millis(slice));
        remaining -= slice;
    }
}

/// A console trace line with its leading verb colored for a terminal.
pub fn styled_trace_line(line: &str) -> String {
    const RESET: &str = "\x1b[0m";
    const VERBS: [(&str, &str); 3] = [
        ("Typing", "\x1b[34m"),
        ("Replace", "\x1b[33m"),
        ("Skip", "\x1b[35m"),
    ];

    VERBS
        .iter()
        .find_map(|&(verb, color)| {
            line.strip_prefix(verb)
                .map(|rest| format!("{color}{verb}{RESET}{rest}"))
        })
        .unwrap_or_else(|| line.to_string())
}

pub fn print_trace_line(line: &str) {
    eprintln!("{}", styled_trace_line(line));
}
