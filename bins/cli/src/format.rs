//! `--output` handling shared by every `qevac` command.

use clap::{Args, ValueEnum};
use serde_json::Value;

/// How command results are printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `key: value` lines, plus the status card for `check`.
    #[default]
    Text,
    /// One pretty-printed JSON document.
    Json,
    /// One compact JSON line tagged with `type` and `kind`.
    Ndjson,
}

/// Global output flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Stdout format.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Keep stderr free of `info:` progress lines.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Resolved output settings passed to command handlers.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub no_progress: bool,
}

impl OutputMode {
    #[must_use]
    pub fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: args.output.unwrap_or_default(),
            no_progress: args.no_progress,
        }
    }

    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    #[must_use]
    pub const fn is_ndjson(self) -> bool {
        matches!(self.format, OutputFormat::Ndjson)
    }

    /// Serialize a command payload for the machine formats.
    ///
    /// Returns `None` in text mode so the caller renders its own lines.
    /// NDJSON lines gain `"type": "summary"` and `"kind": <kind>`.
    pub fn render_payload(
        self,
        kind: &str,
        mut payload: Value,
    ) -> Result<Option<String>, serde_json::Error> {
        let mut out = match self.format {
            OutputFormat::Text => return Ok(None),
            OutputFormat::Json => serde_json::to_string_pretty(&payload)?,
            OutputFormat::Ndjson => {
                if let Value::Object(map) = &mut payload {
                    map.insert("type".to_owned(), Value::from("summary"));
                    map.insert("kind".to_owned(), Value::from(kind));
                }
                serde_json::to_string(&payload)?
            },
        };
        out.push('\n');
        Ok(Some(out))
    }
}
