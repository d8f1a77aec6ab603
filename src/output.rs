use serde::Serialize;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress banners and decorations (`TICKETDB_QUIET=1`)
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("TICKETDB_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputMode::Json } else { OutputMode::Human }
    }

    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    command: &'a str,
    data: T,
}

/// Render the JSON envelope for a successful command
pub fn json_envelope<T: Serialize>(command: &str, data: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope {
        ok: true,
        command,
        data,
    })
}

/// Print the JSON envelope for a successful command to stdout
pub fn emit_success<T: Serialize>(command: &str, data: &T) -> serde_json::Result<()> {
    println!("{}", json_envelope(command, data)?);
    Ok(())
}
