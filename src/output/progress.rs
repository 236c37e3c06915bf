use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress tracking for multi-phase operations
pub struct PhaseProgress {
    pb: ProgressBar,
    phase: usize,
    total: usize,
}

impl PhaseProgress {
    pub fn start(total: usize, message: &str) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let phase = 1;
        let pb = create_spinner(bright_yellow(phase_label(phase, total, message)).to_string());
        Self { pb, phase, total }
    }

    pub fn advance(self, done: &str, next: &str) -> Self {
        self.finish_current(done);
        let phase = self.phase + 1;
        let pb = create_spinner(bright_yellow(phase_label(phase, self.total, next)).to_string());
        Self {
            pb,
            phase,
            total: self.total,
        }
    }

    pub fn finish(self, done: &str) {
        self.finish_current(done);
        eprintln!();
    }

    fn finish_current(&self, done: &str) {
        self.pb.finish_with_message(
            bright_green(format!("{} ✓", phase_label(self.phase, self.total, done))).to_string(),
        );
    }
}

fn phase_label(phase: usize, total: usize, message: &str) -> String {
    format!("Phase {phase}/{total}: {message}")
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    let style = ProgressStyle::default_spinner()
        .template("  {msg} {spinner}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
