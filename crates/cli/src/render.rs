// Terminal rendering of tracker notifications

use chrono::Local;
use colored::{ColoredString, Colorize};

use ticketwatch_core::application::tracker::constants::NEAR_THRESHOLD;
use ticketwatch_core::application::TrackerCallbacks;
use ticketwatch_core::domain::{TicketNumber, TrackerState, PLACEHOLDER};
use ticketwatch_core::port::FetchError;

pub fn started_message(target: TicketNumber) -> String {
    format!("Watching ticket {}", target)
}

pub fn update_message(current: TicketNumber, target: TicketNumber, remaining: i64) -> String {
    format!(
        "Now serving {}, your ticket {}: {} to go",
        current, target, remaining
    )
}

pub fn invalid_number_message(target: TicketNumber) -> String {
    format!(
        "Now serving {}, your ticket {}: gap unknown",
        PLACEHOLDER, target
    )
}

pub fn complete_message(target: TicketNumber) -> String {
    format!("Your ticket {} has been reached or passed!", target)
}

pub fn fetch_error_message(err: &FetchError) -> String {
    format!("Could not fetch queue status: {}", err)
}

pub fn stopped_message(target: TicketNumber, state: TrackerState) -> String {
    match state {
        TrackerState::Completed => format!("Finished watching ticket {}", target),
        _ => format!("Stopped watching ticket {}", target),
    }
}

/// Print one notification line, timestamped
pub fn emit(line: ColoredString) {
    println!("[{}] {}", Local::now().format("%H:%M:%S"), line);
}

/// Callbacks printing every notification except `on_stop`, which the
/// caller wires to its own cleanup
pub fn terminal_callbacks(target: TicketNumber) -> TrackerCallbacks {
    TrackerCallbacks::new()
        .on_start(|target| emit(started_message(target).cyan().bold()))
        .on_update(move |current, remaining| {
            let line = update_message(current, target, remaining);
            if remaining < NEAR_THRESHOLD {
                emit(line.yellow().bold());
            } else {
                emit(line.normal());
            }
        })
        .on_invalid_number(move || emit(invalid_number_message(target).dimmed()))
        .on_fetch_error(|err| emit(fetch_error_message(err).red()))
        .on_complete(move || emit(format!("✓ {}", complete_message(target)).green().bold()))
}
