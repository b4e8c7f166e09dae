use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_tree::HierarchicalLayer;
use tracing_tree::time::Uptime;

/// Logs go to stderr so stdout stays free for the request stream.
/// `RUST_LOG` picks the level; the default is `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let tree = HierarchicalLayer::default()
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_targets(true)
        .with_deferred_spans(true)
        .with_timer(Uptime::default());
    tracing_subscriber::registry().with(filter).with(tree).init();
}
