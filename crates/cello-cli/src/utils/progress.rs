use celloapi::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_millis(80);
const STATUS_WIDTH: usize = 72;
const SPINNER_FRAMES: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];

/// Renders library progress events on stderr.
///
/// Each phase gets a spinner labelled with the phase name; the latest line
/// of container output is shown next to it. With `echo_output` every line is
/// also printed above the spinner. Scans switch to a bar counting finished
/// combinations.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: ProgressBar,
    echo_output: bool,
}

impl CliProgressHandler {
    pub fn new(echo_output: bool) -> Self {
        let bar = ProgressBar::new(0).with_style(phase_style());
        bar.finish_and_clear();
        Self { bar, echo_output }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |event| handler.handle(event))
    }

    fn handle(&self, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(phase_style());
                self.bar.set_prefix(name);
                self.bar.set_message("");
                self.bar.enable_steady_tick(TICK_INTERVAL);
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                self.bar.finish_with_message("done");
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_style(scan_style());
                self.bar.set_prefix("Scanning");
                self.bar.set_length(total_steps);
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                if let Some(total) = self.bar.length() {
                    self.bar.set_position(total);
                }
                self.bar.finish();
            }
            Progress::Message(line) => {
                if self.echo_output && !self.bar.is_finished() {
                    self.bar.println(format!("  │ {line}"));
                }
                self.bar.set_message(truncate_status(&line));
            }
        }
    }
}

fn phase_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {elapsed:>4} {wide_msg:.dim}")
        .expect("Failed to create phase style template")
        .tick_strings(&SPINNER_FRAMES)
}

fn scan_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} combinations ({eta})")
        .expect("Failed to create scan style template")
        .progress_chars("##-")
}

fn truncate_status(line: &str) -> String {
    match line.char_indices().nth(STATUS_WIDTH) {
        Some((idx, _)) => format!("{}…", &line[..idx]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn new_handler_starts_idle() {
        let handler = CliProgressHandler::new(false);
        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.length(), Some(0));
    }

    #[test]
    fn phase_shows_name_and_latest_container_line() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Cello" });
        assert_eq!(handler.bar.prefix(), "Cello");
        assert!(!handler.bar.is_finished());

        callback(Progress::Message("INFO Loading UCF".into()));
        callback(Progress::Message("INFO SimulatedAnnealing - Score: 12.0".into()));
        assert_eq!(handler.bar.message(), "INFO SimulatedAnnealing - Score: 12.0");

        callback(Progress::PhaseFinish);
        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.message(), "done");
    }

    #[test]
    fn scan_bar_counts_combinations() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.get_callback();

        callback(Progress::TaskStart { total_steps: 6 });
        assert_eq!(handler.bar.prefix(), "Scanning");
        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        assert_eq!(handler.bar.position(), 2);
        assert_eq!(handler.bar.length(), Some(6));

        callback(Progress::TaskFinish);
        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.position(), 6);
    }

    #[test]
    fn long_container_lines_are_truncated_in_the_status() {
        let line = "x".repeat(STATUS_WIDTH + 10);
        let status = truncate_status(&line);
        assert_eq!(status.chars().count(), STATUS_WIDTH + 1);
        assert!(status.ends_with('…'));
        assert_eq!(truncate_status("short"), "short");
    }

    #[test]
    fn callback_can_run_on_a_reader_thread() {
        let handler = CliProgressHandler::new(true);
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Cello" });
            callback(Progress::Message("container line".into()));
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.message(), "done");
    }
}
