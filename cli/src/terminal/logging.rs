use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// One symbol per level, message only. Targets stay out of the line except
/// at debug and below, where knowing the module matters.
pub struct HopmapFormatter;

impl<S, N> FormatEvent<S, N> for HopmapFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();

        let symbol = match level {
            Level::TRACE => "( )".dimmed(),
            Level::DEBUG => "(?)".cyan(),
            Level::INFO => "(>)".green().bold(),
            Level::WARN => "(!)".yellow().bold(),
            Level::ERROR => "(x)".red().bold(),
        };
        write!(writer, "{symbol} ")?;

        if level >= Level::DEBUG {
            write!(writer, "{} ", meta.target().dimmed())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init(verbose: u8) {
    let default_directive = match verbose {
        0 => "hopmap_cli=info,hopmap_core=info,hopmap_common=info",
        1 => "hopmap_cli=debug,hopmap_core=debug,hopmap_common=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(HopmapFormatter)
        .init();
}
