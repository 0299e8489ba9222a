//! kbmacro entrypoint: record a scenario's steps as a keyboard macro and
//! replay it at other cursor positions.
use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

mod scenario;

const LOG_FILE_NAME: &str = "kbmacro.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "kbmacro", version, about = "Keyboard macro recorder")]
struct Args {
    /// Scenario file (TOML) describing the document, steps and replay positions.
    pub scenario: PathBuf,
    /// Optional configuration file path (overrides discovery of `kbmacro.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn run(&mut self) -> Result<Args> {
        self.configure_logging()?;
        Self::install_panic_hook();
        let args = Args::parse();
        info!(
            target: "runtime",
            scenario = %args.scenario.display(),
            config_override = args.config.is_some(),
            "startup"
        );
        Ok(args)
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE_NAME);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

// Single-threaded: the in-memory host's `settle` relies on the event pump
// running whenever the driver yields.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    let args = startup.run()?;
    let config = core_config::load_from(args.config.clone())?;
    let scenario = scenario::load(&args.scenario)?;
    let report = scenario::run(&scenario, config).await?;
    print!("{report}");
    info!(
        target: "runtime",
        recorded = report.recorded.len(),
        replays = report.replays.len(),
        "shutdown"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::scenario::{Scenario, run};
    use core_config::Config;
    use std::fmt;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::Registry;

    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    #[derive(Clone, Debug)]
    struct CapturedEvent {
        target: String,
        fields: Vec<(String, String)>,
    }

    #[derive(Default)]
    struct FieldCollector {
        fields: Vec<(String, String)>,
    }

    impl Visit for FieldCollector {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S> Layer<S> for Capture
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut collector = FieldCollector::default();
            event.record(&mut collector);
            let meta = event.metadata();
            self.events.lock().unwrap().push(CapturedEvent {
                target: meta.target().to_string(),
                fields: collector.fields,
            });
        }
    }

    #[tokio::test]
    async fn typed_text_is_not_logged_verbatim() {
        let capture = Capture::default();
        let events = capture.events.clone();
        let _default = tracing::subscriber::set_default(Registry::default().with(capture));

        let src = "lines = [\"\"]\nsteps = [{ type = \"secret-token\" }]\nreplay_at = [[[0, 0]]]\n";
        let scenario = Scenario::from_toml_str(Path::new("inline.toml"), src).unwrap();
        let config = Config::from_toml_str("[sync]\ntimeout_ms = 50\n").unwrap();
        run(&scenario, config).await.unwrap();

        let events = events.lock().unwrap();
        assert!(
            events
                .iter()
                .any(|e| e.target == "macro.replay"
                    && e.fields.iter().any(|(_, v)| v.contains("replay_done"))),
            "expected a replay_done event"
        );
        for event in events.iter().filter(|e| e.target.starts_with("macro")) {
            assert!(
                event.fields.iter().all(|(_, v)| !v.contains("secret-token")),
                "typed text leaked into {}: {:?}",
                event.target,
                event.fields
            );
        }
    }
}
