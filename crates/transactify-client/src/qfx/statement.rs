use std::num::IntErrorKind;
use std::path::Path;

use chrono::NaiveDate;

use super::document::OfxElement;
use super::values::{normalize_payee, parse_ofx_amount, parse_ofx_datetime};
use crate::{ClientError, ClientResult};

/// One statement found in an OFX file: the account it belongs to, the
/// statement balance, and its transactions in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct OfxAccount {
    /// Account ID exactly as written in the file; used for the natural key.
    pub account_id: String,
    pub account_number: i64,
    pub balance: f64,
    pub transactions: Vec<OfxTransaction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfxTransaction {
    pub fitid: String,
    pub posted: NaiveDate,
    pub amount: f64,
    pub payee: String,
}

#[derive(Debug, Clone, Copy)]
struct StatementKind {
    aggregate: &'static str,
    account_from: &'static str,
    balance_path: [&'static str; 2],
    transaction_list: &'static str,
    /// Wrapper around each `STMTTRN`, for lists that also hold non-cash entries.
    transaction_wrapper: Option<&'static str>,
}

const STATEMENT_KINDS: [StatementKind; 3] = [
    StatementKind {
        aggregate: "STMTRS",
        account_from: "BANKACCTFROM",
        balance_path: ["LEDGERBAL", "BALAMT"],
        transaction_list: "BANKTRANLIST",
        transaction_wrapper: None,
    },
    StatementKind {
        aggregate: "CCSTMTRS",
        account_from: "CCACCTFROM",
        balance_path: ["LEDGERBAL", "BALAMT"],
        transaction_list: "BANKTRANLIST",
        transaction_wrapper: None,
    },
    StatementKind {
        aggregate: "INVSTMTRS",
        account_from: "INVACCTFROM",
        balance_path: ["INVBAL", "AVAILCASH"],
        transaction_list: "INVTRANLIST",
        transaction_wrapper: Some("INVBANKTRAN"),
    },
];

/// Reads every statement under `root`, so single- and multi-account files
/// look the same to callers. Bank statements come first, then credit card,
/// then investment; document order holds within each kind.
pub fn read_accounts(file: &Path, root: &OfxElement) -> ClientResult<Vec<OfxAccount>> {
    let mut accounts = Vec::new();
    for kind in STATEMENT_KINDS {
        for statement in root.find_all(&[kind.aggregate]) {
            accounts.push(read_statement(file, statement, kind)?);
        }
    }
    if accounts.is_empty() {
        return Err(ClientError::parse_failure(
            file,
            "the file contains no bank, credit card, or investment statement",
        ));
    }
    Ok(accounts)
}

fn read_statement(
    file: &Path,
    statement: &OfxElement,
    kind: StatementKind,
) -> ClientResult<OfxAccount> {
    let account_id = statement
        .text_at(&[kind.account_from, "ACCTID"])
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ClientError::parse_failure(
                file,
                &format!("<{}> has no <{}><ACCTID>", kind.aggregate, kind.account_from),
            )
        })?
        .to_string();
    let account_number = account_id.parse::<i64>().map_err(|error| {
        let detail = match error.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                format!("account ID `{account_id}` is out of range for a 64-bit account number")
            }
            _ => format!("account ID `{account_id}` is not a whole number"),
        };
        ClientError::parse_failure(file, &detail)
    })?;

    let balance_text = statement.text_at(&kind.balance_path).ok_or_else(|| {
        ClientError::parse_failure(
            file,
            &format!(
                "statement for account {account_id} has no <{}><{}> balance",
                kind.balance_path[0], kind.balance_path[1]
            ),
        )
    })?;
    let balance = parse_ofx_amount(balance_text).ok_or_else(|| {
        ClientError::parse_failure(
            file,
            &format!("statement balance `{balance_text}` for account {account_id} is not a number"),
        )
    })?;

    let mut transactions = Vec::new();
    if let Some(list) = statement.child(kind.transaction_list) {
        let entries: Vec<&OfxElement> = match kind.transaction_wrapper {
            Some(wrapper) => list
                .children_named(wrapper)
                .filter_map(|wrapped| wrapped.child("STMTTRN"))
                .collect(),
            None => list.children_named("STMTTRN").collect(),
        };
        for entry in entries {
            transactions.push(read_transaction(file, &account_id, entry)?);
        }
    }

    Ok(OfxAccount {
        account_id,
        account_number,
        balance,
        transactions,
    })
}

fn read_transaction(
    file: &Path,
    account_id: &str,
    entry: &OfxElement,
) -> ClientResult<OfxTransaction> {
    let fitid = required_text(file, account_id, entry, "FITID")?.to_string();

    let posted_text = required_text(file, account_id, entry, "DTPOSTED")?;
    let posted = parse_ofx_datetime(posted_text)
        .map(|timestamp| timestamp.date())
        .ok_or_else(|| {
            ClientError::parse_failure(
                file,
                &format!(
                    "transaction {fitid} in account {account_id} has an invalid <DTPOSTED> `{posted_text}`"
                ),
            )
        })?;

    let amount_text = required_text(file, account_id, entry, "TRNAMT")?;
    let amount = parse_ofx_amount(amount_text).ok_or_else(|| {
        ClientError::parse_failure(
            file,
            &format!(
                "transaction {fitid} in account {account_id} has an invalid <TRNAMT> `{amount_text}`"
            ),
        )
    })?;

    let payee = entry
        .text_at(&["NAME"])
        .or_else(|| entry.text_at(&["PAYEE", "NAME"]))
        .map(normalize_payee)
        .unwrap_or_default();

    Ok(OfxTransaction {
        fitid,
        posted,
        amount,
        payee,
    })
}

fn required_text<'a>(
    file: &Path,
    account_id: &str,
    entry: &'a OfxElement,
    field: &str,
) -> ClientResult<&'a str> {
    entry
        .text_at(&[field])
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ClientError::parse_failure(
                file,
                &format!("a transaction in account {account_id} is missing required <{field}>"),
            )
        })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::NaiveDate;

    use super::{OfxAccount, read_accounts};
    use crate::ClientResult;
    use crate::qfx::document::parse_document;

    fn accounts(content: &str) -> ClientResult<Vec<OfxAccount>> {
        let file = Path::new("statement.qfx");
        let root = parse_document(file, content)?;
        read_accounts(file, &root)
    }

    const BANK_SGML: &str = "OFXHEADER:100\nDATA:OFXSGML\nVERSION:102\n\n<OFX>\n<BANKMSGSRSV1><STMTTRNRS><TRNUID>1\n<STMTRS><CURDEF>USD\n<BANKACCTFROM><BANKID>121000358<ACCTID>1234567890<ACCTTYPE>CHECKING</BANKACCTFROM>\n<BANKTRANLIST><DTSTART>20230101<DTEND>20230131\n<STMTTRN><TRNTYPE>DEBIT<DTPOSTED>20230115120000[-5:EST]<TRNAMT>-42.15<FITID>TXN0001<NAME>COFFEE  SHOP &amp; CO</STMTTRN>\n<STMTTRN><TRNTYPE>CREDIT<DTPOSTED>20230120<TRNAMT>1500,00<FITID>TXN0002<PAYEE><NAME>ACME PAYROLL<ADDR1>1 MAIN ST</PAYEE></STMTTRN>\n</BANKTRANLIST>\n<LEDGERBAL><BALAMT>2500.75<DTASOF>20230131</LEDGERBAL>\n</STMTRS></STMTTRNRS></BANKMSGSRSV1>\n</OFX>\n";

    #[test]
    fn reads_bank_statement_transactions_in_order() {
        let parsed = accounts(BANK_SGML);
        assert!(parsed.is_ok(), "{parsed:?}");
        if let Ok(parsed) = parsed {
            assert_eq!(parsed.len(), 1);
            let account = &parsed[0];
            assert_eq!(account.account_id, "1234567890");
            assert_eq!(account.account_number, 1_234_567_890);
            assert_eq!(account.balance, 2500.75);
            assert_eq!(account.transactions.len(), 2);

            let first = &account.transactions[0];
            assert_eq!(first.fitid, "TXN0001");
            assert_eq!(Some(first.posted), NaiveDate::from_ymd_opt(2023, 1, 15));
            assert_eq!(first.amount, -42.15);
            assert_eq!(first.payee, "COFFEE SHOP & CO");

            let second = &account.transactions[1];
            assert_eq!(second.amount, 1500.0);
            assert_eq!(second.payee, "ACME PAYROLL");
        }
    }

    #[test]
    fn reads_every_statement_of_a_multi_account_xml_file() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<?OFX OFXHEADER="200" VERSION="220" SECURITY="NONE"?>
<OFX>
  <BANKMSGSRSV1>
    <STMTTRNRS><STMTRS>
      <BANKACCTFROM><ACCTID>111</ACCTID></BANKACCTFROM>
      <BANKTRANLIST></BANKTRANLIST>
      <LEDGERBAL><BALAMT>0.00</BALAMT></LEDGERBAL>
    </STMTRS></STMTTRNRS>
  </BANKMSGSRSV1>
  <CREDITCARDMSGSRSV1>
    <CCSTMTTRNRS><CCSTMTRS>
      <CCACCTFROM><ACCTID>5555000011112222</ACCTID></CCACCTFROM>
      <BANKTRANLIST>
        <STMTTRN><DTPOSTED>20230301</DTPOSTED><TRNAMT>-9.99</TRNAMT><FITID>CC-001</FITID><NAME></NAME></STMTTRN>
      </BANKTRANLIST>
      <LEDGERBAL><BALAMT>-120.40</BALAMT></LEDGERBAL>
    </CCSTMTRS></CCSTMTTRNRS>
  </CREDITCARDMSGSRSV1>
</OFX>"#;
        let parsed = accounts(content);
        assert!(parsed.is_ok(), "{parsed:?}");
        if let Ok(parsed) = parsed {
            let ids = parsed
                .iter()
                .map(|account| account.account_id.as_str())
                .collect::<Vec<&str>>();
            assert_eq!(ids, vec!["111", "5555000011112222"]);
            assert!(parsed[0].transactions.is_empty());
            assert_eq!(parsed[1].balance, -120.4);
            assert_eq!(parsed[1].transactions[0].payee, "");
        }
    }

    #[test]
    fn investment_statements_use_cash_bank_transactions() {
        let content = "<OFX><INVSTMTMSGSRSV1><INVSTMTTRNRS><INVSTMTRS>\
<INVACCTFROM><BROKERID>broker.example<ACCTID>777</INVACCTFROM>\
<INVTRANLIST>\
<BUYSTOCK><INVBUY><INVTRAN><FITID>BUY-1<DTTRADE>20230105</INVTRAN><TOTAL>-100</INVBUY></BUYSTOCK>\
<INVBANKTRAN><STMTTRN><DTPOSTED>20230106<TRNAMT>250<FITID>DEP-1<NAME>DEPOSIT</STMTTRN><SUBACCTFUND>CASH</INVBANKTRAN>\
</INVTRANLIST>\
<INVBAL><AVAILCASH>150.25<MARGINBALANCE>0</INVBAL>\
</INVSTMTRS></INVSTMTTRNRS></INVSTMTMSGSRSV1></OFX>";
        let parsed = accounts(content);
        assert!(parsed.is_ok(), "{parsed:?}");
        if let Ok(parsed) = parsed {
            assert_eq!(parsed[0].balance, 150.25);
            assert_eq!(parsed[0].transactions.len(), 1);
            assert_eq!(parsed[0].transactions[0].fitid, "DEP-1");
        }
    }

    #[test]
    fn missing_fitid_is_fatal() {
        let content = BANK_SGML.replace("<FITID>TXN0002", "");
        let parsed = accounts(&content);
        assert!(matches!(parsed, Err(error) if error.message.contains("<FITID>")));
    }

    #[test]
    fn missing_balance_is_fatal() {
        let content =
            BANK_SGML.replace("<LEDGERBAL><BALAMT>2500.75<DTASOF>20230131</LEDGERBAL>", "");
        let parsed = accounts(&content);
        assert!(matches!(parsed, Err(error) if error.message.contains("balance")));
    }

    #[test]
    fn non_numeric_account_id_is_fatal() {
        let content = BANK_SGML.replace("<ACCTID>1234567890", "<ACCTID>XXXX-7890");
        let parsed = accounts(&content);
        assert!(matches!(parsed, Err(error) if error.message.contains("XXXX-7890")));
    }

    #[test]
    fn oversized_account_id_is_reported_as_out_of_range() {
        let content = BANK_SGML.replace("<ACCTID>1234567890", "<ACCTID>12345678901234567890");
        let parsed = accounts(&content);
        assert!(parsed.is_err());
        if let Err(error) = parsed {
            assert!(error.message.contains("`12345678901234567890` is out of range"));
        }
    }

    #[test]
    fn statements_are_grouped_by_kind_before_document_order() {
        let content = "<OFX>\
<CREDITCARDMSGSRSV1><CCSTMTTRNRS><CCSTMTRS><CCACCTFROM><ACCTID>2</CCACCTFROM>\
<BANKTRANLIST></BANKTRANLIST><LEDGERBAL><BALAMT>-5</LEDGERBAL></CCSTMTRS></CCSTMTTRNRS>\
</CREDITCARDMSGSRSV1>\
<BANKMSGSRSV1><STMTTRNRS><STMTRS><BANKACCTFROM><ACCTID>1</BANKACCTFROM>\
<BANKTRANLIST></BANKTRANLIST><LEDGERBAL><BALAMT>10</LEDGERBAL></STMTRS></STMTTRNRS>\
<STMTTRNRS><STMTRS><BANKACCTFROM><ACCTID>3</BANKACCTFROM>\
<BANKTRANLIST></BANKTRANLIST><LEDGERBAL><BALAMT>0</LEDGERBAL></STMTRS></STMTTRNRS>\
</BANKMSGSRSV1></OFX>";
        let parsed = accounts(content);
        assert!(parsed.is_ok(), "{parsed:?}");
        if let Ok(accounts) = parsed {
            let ids = accounts
                .iter()
                .map(|account| account.account_id.as_str())
                .collect::<Vec<&str>>();
            assert_eq!(ids, vec!["1", "3", "2"]);
        }
    }

    #[test]
    fn file_without_statements_is_fatal() {
        let parsed = accounts(
            "<OFX><SIGNONMSGSRSV1><SONRS><STATUS><CODE>0</STATUS></SONRS></SIGNONMSGSRSV1></OFX>",
        );
        assert!(matches!(parsed, Err(error) if error.code == "parse_failure"));
    }
}
