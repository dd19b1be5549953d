use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

/// Where log lines go. `exec` keeps stdout for replies, so it logs to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogTarget {
    Stdout,
    Stderr,
}

impl<'a> MakeWriter<'a> for LogTarget {
    type Writer = Box<dyn std::io::Write>;

    fn make_writer(&'a self) -> Self::Writer {
        match self {
            LogTarget::Stdout => Box::new(std::io::stdout()),
            LogTarget::Stderr => Box::new(std::io::stderr()),
        }
    }
}

pub(crate) fn init(level: Level, target: LogTarget) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(target)
        .finish();
    // a second init (tests, restarts) keeps the first subscriber
    tracing::subscriber::set_global_default(subscriber).ok();
}
