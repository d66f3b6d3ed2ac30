mod convert_text;
mod error_text;
mod format;
mod json;
mod mode;

use std::io;

use transactify_client::{ClientError, CommandData, SuccessEnvelope};

use crate::stdout_io::write_stdout_line;

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success),
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(
    command: Option<&str>,
    error: &ClientError,
    mode: OutputMode,
) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(command, error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> String {
    match &success.data {
        CommandData::Convert(data) => convert_text::render_convert(data),
        CommandData::Hash(data) => data.id.to_string(),
    }
}
