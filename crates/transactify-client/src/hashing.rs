//! Deterministic transaction identifiers.
//!
//! An identifier is the MD5 digest of the natural key read as an unsigned
//! big-endian integer, printed in decimal and cut to its leading digits.
//! Collisions are possible and are not detected.

use md5::{Digest, Md5};

pub const ID_DIGITS: usize = 14;

pub fn identity_hash(input: &str) -> u64 {
    let digest = Md5::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);

    let decimal = u128::from_be_bytes(bytes).to_string();
    let end = decimal.len().min(ID_DIGITS);
    // At most 14 ASCII digits always fit in a u64.
    decimal[..end].parse::<u64>().unwrap_or(0)
}

/// Natural key of a spreadsheet row: amount, price, trade date, account.
pub fn excel_natural_key(
    net_amount: &str,
    price: &str,
    transaction_date: &str,
    account: &str,
) -> String {
    format!("{net_amount}{price}{transaction_date}{account}")
}

/// Natural key of an OFX transaction: account id followed by the FITID.
pub fn qfx_natural_key(account_id: &str, transaction_id: &str) -> String {
    format!("{account_id}{transaction_id}")
}
