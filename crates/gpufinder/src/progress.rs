use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;

/// Spinner shown while a long step runs with no output of its own
///
/// Info-level logs share stderr with the spinner and already narrate the
/// step, so the spinner is only drawn when they are filtered out.
pub struct StepProgress {
    progress_bar: Option<ProgressBar>,
}

/// Whether a spinner can be drawn without interleaving with log lines
fn spinner_enabled() -> bool {
    !tracing::enabled!(Level::INFO)
}

impl StepProgress {
    pub fn new(message: &str) -> Self {
        if !spinner_enabled() {
            println!("{}", message.blue());
            return Self { progress_bar: None };
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        Self {
            progress_bar: Some(pb),
        }
    }

    pub fn finish_success(&self, message: &str) {
        let line = format!("{} ✓", message);
        match &self.progress_bar {
            Some(pb) => pb.finish_with_message(line),
            None => println!("{}", line.green()),
        }
    }

    pub fn finish_error(&self, error: &str) {
        let line = format!("Failed: {}", error);
        match &self.progress_bar {
            Some(pb) => pb.finish_with_message(line),
            None => eprintln!("{}", line.red()),
        }
    }
}
