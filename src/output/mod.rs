mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{print_comparison, print_rendering};

/// Prints the `cidiff` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔀 cidiff"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI/CD Pipeline Graph Differ")
    );
}
