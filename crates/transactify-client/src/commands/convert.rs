use std::path::Path;

use tracing::info;

use crate::ClientResult;
use crate::config::resolve_source_dir;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ConvertData, SourceFormat};
use crate::status::{ConsoleReporter, StatusReporter};
use crate::{excel, qfx};

/// Which pipelines a conversion runs. Excel always runs before QFX.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum FormatSelection {
    #[default]
    All,
    Excel,
    Qfx,
}

impl FormatSelection {
    pub fn formats(self) -> &'static [SourceFormat] {
        match self {
            Self::All => &[SourceFormat::Excel, SourceFormat::Qfx],
            Self::Excel => &[SourceFormat::Excel],
            Self::Qfx => &[SourceFormat::Qfx],
        }
    }
}

#[derive(Default)]
pub struct ConvertOptions<'a> {
    pub source_dir: Option<&'a Path>,
    pub formats: FormatSelection,
    /// Defaults to printing status lines on stdout.
    pub reporter: Option<&'a dyn StatusReporter>,
}

pub fn run(path: Option<String>) -> ClientResult<SuccessEnvelope> {
    run_with_options(ConvertOptions {
        source_dir: path.as_deref().map(Path::new),
        ..ConvertOptions::default()
    })
}

pub fn run_with_options(options: ConvertOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let source_dir = resolve_source_dir(options.source_dir)?;
    let console = ConsoleReporter;
    let reporter: &dyn StatusReporter = match options.reporter {
        Some(reporter) => reporter,
        None => &console,
    };
    info!(source_dir = %source_dir.display(), "starting conversion");

    let mut pipelines = Vec::new();
    for format in options.formats.formats() {
        let report = match format {
            SourceFormat::Excel => excel::convert_directory(&source_dir, reporter)?,
            SourceFormat::Qfx => qfx::convert_directory(&source_dir, reporter)?,
        };
        pipelines.push(report);
    }

    let data = ConvertData {
        source_dir: source_dir.display().to_string(),
        pipelines,
    };
    Ok(success(data))
}
