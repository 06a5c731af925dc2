use std::io::Write;

/// Sets up `env_logger`. `RUST_LOG` takes over completely when set.
pub fn init_logger(verbose: bool, quiet: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }

    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format(|buf, record| {
        if record.level() <= log::Level::Warn {
            writeln!(buf, "[{}] {}", record.level(), record.args())
        } else {
            writeln!(buf, "{}", record.args())
        }
    });

    // Keep HTTP client chatter out of verbose output
    if verbose {
        builder.filter_module("ureq", log::LevelFilter::Warn);
        builder.filter_module("rustls", log::LevelFilter::Warn);
    }

    builder.init();
}
