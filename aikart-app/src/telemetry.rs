use tracing::Level;

/// Installs the process-wide fmt subscriber. Output goes to stderr so CLI results stay on stdout.
pub fn init(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
