use serde::{Serialize, Serializer};

/// One normalized transaction, as written to `all_transactions.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTransaction {
    pub id: u64,
    pub date: String,
    pub amount: f64,
    pub name: String,
    pub account_id: i64,
    pub balance: Balance,
}

/// Spreadsheet exports carry no balance and serialize it as the integer `0`;
/// OFX statements carry a ledger balance serialized as a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Balance {
    Unreported,
    Statement(f64),
}

impl Serialize for Balance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Unreported => serializer.serialize_u8(0),
            Self::Statement(value) => serializer.serialize_f64(*value),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Excel,
    Qfx,
}

impl SourceFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Qfx => "qfx",
        }
    }

    pub const fn output_dir_name(self) -> &'static str {
        match self {
            Self::Excel => "transactions_excel",
            Self::Qfx => "qfx_transactions",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Converted,
    NoInputFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub format: SourceFormat,
    pub status: PipelineStatus,
    pub files: Vec<String>,
    pub accounts: usize,
    pub transactions: usize,
    pub output_path: Option<String>,
}

impl PipelineReport {
    pub(crate) fn no_input(format: SourceFormat) -> Self {
        Self {
            format,
            status: PipelineStatus::NoInputFound,
            files: Vec::new(),
            accounts: 0,
            transactions: 0,
            output_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertData {
    pub source_dir: String,
    pub pipelines: Vec<PipelineReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HashData {
    pub input: String,
    pub id: u64,
}
