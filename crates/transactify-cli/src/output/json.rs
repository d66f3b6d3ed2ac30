use std::io;

use serde::Serialize;
use transactify_client::contracts::envelope::failure;
use transactify_client::{ClientError, SuccessEnvelope};

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    serialize_json_pretty(success)
}

pub fn render_error_json(command: Option<&str>, error: &ClientError) -> io::Result<String> {
    serialize_json_pretty(&failure(command, error))
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
