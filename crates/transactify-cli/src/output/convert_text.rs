use transactify_client::contracts::types::{
    ConvertData, PipelineReport, PipelineStatus, SourceFormat,
};

use super::format::{self, Align, Column};

pub fn render_convert(data: &ConvertData) -> String {
    let converted = data
        .pipelines
        .iter()
        .filter(|pipeline| pipeline.status == PipelineStatus::Converted)
        .count();

    let mut lines = Vec::new();
    if converted == 0 {
        lines.push("Nothing to convert.".to_string());
    } else {
        lines.push("Conversion completed successfully.".to_string());
    }
    lines.push(String::new());
    lines.extend(format::key_value_rows(
        &[("Folder:", data.source_dir.clone())],
        2,
    ));
    lines.push(String::new());

    let columns = [
        Column {
            name: "Format",
            align: Align::Left,
        },
        Column {
            name: "Files",
            align: Align::Right,
        },
        Column {
            name: "Accounts",
            align: Align::Right,
        },
        Column {
            name: "Transactions",
            align: Align::Right,
        },
        Column {
            name: "Output",
            align: Align::Left,
        },
    ];
    let rows = data
        .pipelines
        .iter()
        .map(pipeline_row)
        .collect::<Vec<Vec<String>>>();
    lines.extend(format::render_table(&columns, &rows));

    if converted == 0 {
        lines.push(String::new());
        lines.push("What to do next:".to_string());
        lines.push(
            "  1. Download .xlsx or .QFX/.qfx exports into the folder, or pass `--path <dir>`."
                .to_string(),
        );
    }

    lines.join("\n")
}

fn pipeline_row(pipeline: &PipelineReport) -> Vec<String> {
    let label = match pipeline.format {
        SourceFormat::Excel => "Excel",
        SourceFormat::Qfx => "QFX",
    };
    let output = match (&pipeline.status, &pipeline.output_path) {
        (PipelineStatus::Converted, Some(path)) => path.clone(),
        (PipelineStatus::Converted, None) => String::new(),
        (PipelineStatus::NoInputFound, _) => "no input files found".to_string(),
    };

    vec![
        label.to_string(),
        pipeline.files.len().to_string(),
        pipeline.accounts.to_string(),
        pipeline.transactions.to_string(),
        output,
    ]
}

#[cfg(test)]
mod tests {
    use transactify_client::contracts::types::{
        ConvertData, PipelineReport, PipelineStatus, SourceFormat,
    };

    use super::render_convert;

    fn empty_qfx() -> PipelineReport {
        PipelineReport {
            format: SourceFormat::Qfx,
            status: PipelineStatus::NoInputFound,
            files: Vec::new(),
            accounts: 0,
            transactions: 0,
            output_path: None,
        }
    }

    #[test]
    fn renders_one_row_per_pipeline() {
        let data = ConvertData {
            source_dir: "/home/me/Downloads".to_string(),
            pipelines: vec![
                PipelineReport {
                    format: SourceFormat::Excel,
                    status: PipelineStatus::Converted,
                    files: vec!["/home/me/Downloads/a.xlsx".to_string()],
                    accounts: 1,
                    transactions: 12,
                    output_path: Some(
                        "/home/me/Downloads/transactions_excel/all_transactions.json".to_string(),
                    ),
                },
                empty_qfx(),
            ],
        };

        let text = render_convert(&data);
        assert!(text.starts_with("Conversion completed successfully."));
        assert!(text.contains("  Folder:  /home/me/Downloads"));
        assert!(text.contains(
            "  Excel       1         1            12  /home/me/Downloads/transactions_excel/all_transactions.json"
        ));
        assert!(text.contains("  QFX         0         0             0  no input files found"));
        assert!(!text.contains("What to do next:"));
    }

    #[test]
    fn empty_run_suggests_next_step() {
        let data = ConvertData {
            source_dir: "/tmp/empty".to_string(),
            pipelines: vec![empty_qfx()],
        };
        let text = render_convert(&data);
        assert!(text.starts_with("Nothing to convert."));
        assert!(text.contains("What to do next:"));
    }
}
