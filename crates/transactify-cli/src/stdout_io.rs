use std::io::{self, Write};

/// Writes `text` as-is. A closed pipe (`transactify convert | head`) is not an error.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    write_chunks(&mut io::stdout().lock(), &[text.as_bytes()])
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    write_chunks(&mut io::stdout().lock(), &[text.as_bytes(), b"\n"])
}

fn write_chunks(writer: &mut dyn Write, chunks: &[&[u8]]) -> io::Result<()> {
    for chunk in chunks {
        tolerate_broken_pipe(writer.write_all(chunk))?;
    }
    tolerate_broken_pipe(writer.flush())
}

fn tolerate_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
