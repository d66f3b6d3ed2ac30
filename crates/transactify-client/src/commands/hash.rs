use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::HashData;
use crate::hashing::identity_hash;

pub fn run(input: &str) -> SuccessEnvelope {
    let data = HashData {
        input: input.to_string(),
        id: identity_hash(input),
    };
    success(data)
}
