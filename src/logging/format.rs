use super::CRATE_TARGET;
use colored::Colorize;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

const TRACE_FIELD: &str = "trace_id=";

/// Event fields naming the entity a line is about, with the tag they render as.
const ENTITY_FIELDS: [(&str, &str); 4] = [
    ("user_id", "user"),
    ("device_id", "device"),
    ("permission_id", "permission"),
    ("id", "id"),
];

/// Renders one line per event:
///
/// ```text
/// 14:02:11.532 WRN gateways::platform::devices [#5f0c device:d7] Failed to publish sensor states: boom
/// ```
///
/// The request trace id and entity fields go in the bracket, any other field trails the message.
pub(super) struct Formatter {
    use_colors: bool,
}

impl Formatter {
    pub(super) fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut line = EventLine::default();
        for span in ctx
            .event_scope()
            .into_iter()
            .flat_map(tracing_subscriber::registry::Scope::from_root)
        {
            let exts = span.extensions();
            let Some(fields) = exts.get::<FormattedFields<N>>() else {
                continue;
            };
            match trace_of(fields) {
                Some(trace) => line.trace = Some(trace.to_string()),
                None if !fields.is_empty() => line.extras.push(fields.to_string()),
                None => {}
            }
        }
        event.record(&mut line);

        let target = short_target(meta.target());
        let context = line.context();
        if self.use_colors {
            let now = chrono::Local::now().format("%X%.3f").to_string();
            write!(
                writer,
                "{} {} {}",
                now.bright_black(),
                level_tag(meta.level()),
                target.bright_black()
            )?;
            if !context.is_empty() {
                write!(writer, " {}", context.cyan())?;
            }
            write!(writer, " {}", line.message)?;
            for extra in &line.extras {
                write!(writer, " {}", extra.bright_black())?;
            }
        } else {
            let now = chrono::Local::now().format("%F %X%.3f");
            write!(writer, "{now} {} {target}", level_char(meta.level()))?;
            if !context.is_empty() {
                write!(writer, " {context}")?;
            }
            write!(writer, " {}", line.message)?;
            for extra in &line.extras {
                write!(writer, " {extra}")?;
            }
        }
        writeln!(writer)
    }
}

/// Own modules lose the crate prefix, foreign targets collapse to their crate.
fn short_target(target: &str) -> &str {
    match target.strip_prefix(CRATE_TARGET) {
        Some(rest) => rest.trim_start_matches("::"),
        None => target.split("::").next().unwrap_or(target),
    }
}

fn trace_of(span_fields: &str) -> Option<&str> {
    span_fields
        .split(' ')
        .find_map(|it| it.strip_prefix(TRACE_FIELD))
        .map(|it| it.trim_matches('"'))
}

fn level_tag(level: &Level) -> colored::ColoredString {
    match *level {
        Level::ERROR => "ERR".bright_red(),
        Level::WARN => "WRN".bright_yellow(),
        Level::INFO => "INF".bright_blue(),
        Level::DEBUG => "DBG".bright_magenta(),
        Level::TRACE => "TRC".bright_white(),
    }
}

fn level_char(level: &Level) -> char {
    match *level {
        Level::ERROR => 'E',
        Level::WARN => 'W',
        Level::INFO => 'I',
        Level::DEBUG => 'D',
        Level::TRACE => 'T',
    }
}

#[derive(Default)]
struct EventLine {
    message: String,
    trace: Option<String>,
    entities: Vec<String>,
    extras: Vec<String>,
}

impl EventLine {
    fn push(&mut self, name: &str, value: String) {
        if name == "message" {
            self.message = value;
        } else if let Some((_, tag)) = ENTITY_FIELDS.iter().find(|(field, _)| *field == name) {
            self.entities.push(format!("{tag}:{value}"));
        } else {
            self.extras.push(format!("{name}={value}"));
        }
    }

    /// `[#trace entity:id ...]`, empty when the event carries neither.
    fn context(&self) -> String {
        let mut parts = Vec::with_capacity(self.entities.len() + 1);
        if let Some(trace) = &self.trace {
            parts.push(format!("#{trace}"));
        }
        parts.extend(self.entities.iter().cloned());
        if parts.is_empty() {
            return String::new();
        }
        format!("[{}]", parts.join(" "))
    }
}

impl Visit for EventLine {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        let mut rendered = String::new();
        write!(rendered, "{value:?}").ok();
        self.push(field.name(), rendered);
    }
}
