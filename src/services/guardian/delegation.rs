// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::{APP_NAME, APP_VERSION, CERTIFICATE_CHAIN_ID, CERTIFICATE_SALT};
use alloy::primitives::{Address, B256, U256, keccak256};
use alloy::sol;
use alloy::sol_types::SolStruct;
use serde_json::{Value, json};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Delegate {
        address delegate;
    }
}

/// The salt is typed `string`, which `Eip712Domain` cannot express, so the
/// domain is encoded by hand.
const DOMAIN_TYPE: &str = "EIP712Domain(string name,string version,uint256 chainId,string salt)";

pub fn domain_separator() -> B256 {
    let mut buf = Vec::with_capacity(5 * 32);
    buf.extend_from_slice(keccak256(DOMAIN_TYPE).as_slice());
    buf.extend_from_slice(keccak256(APP_NAME).as_slice());
    buf.extend_from_slice(keccak256(APP_VERSION).as_slice());
    buf.extend_from_slice(&U256::from(CERTIFICATE_CHAIN_ID).to_be_bytes::<32>());
    buf.extend_from_slice(keccak256(CERTIFICATE_SALT).as_slice());
    keccak256(buf)
}

/// EIP-712 `Delegate(address delegate)` message naming the guardian.
///
/// Built once at startup; the borrower signs [`DelegationCertificate::hash`]
/// to authorize repayments by `delegate`.
#[derive(Debug, Clone)]
pub struct DelegationCertificate {
    delegate: Address,
    domain_separator: B256,
    hash: B256,
}

impl DelegationCertificate {
    pub fn new(delegate: Address) -> Self {
        let domain_separator = domain_separator();
        let struct_hash = Delegate { delegate }.eip712_hash_struct();

        let mut buf = [0u8; 66];
        buf[0] = 0x19;
        buf[1] = 0x01;
        buf[2..34].copy_from_slice(domain_separator.as_slice());
        buf[34..66].copy_from_slice(struct_hash.as_slice());

        Self {
            delegate,
            domain_separator,
            hash: keccak256(buf),
        }
    }

    pub fn delegate(&self) -> Address {
        self.delegate
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain_separator
    }

    /// Digest the borrower signs.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Typed data document for `eth_signTypedData_v4`.
    pub fn typed_data(&self) -> Value {
        json!({
            "types": {
                "EIP712Domain": [
                    {"name": "name", "type": "string"},
                    {"name": "version", "type": "string"},
                    {"name": "chainId", "type": "uint256"},
                    {"name": "salt", "type": "string"}
                ],
                "Delegate": [
                    {"name": "delegate", "type": "address"}
                ]
            },
            "primaryType": "Delegate",
            "domain": {
                "name": APP_NAME,
                "version": APP_VERSION,
                "chainId": CERTIFICATE_CHAIN_ID,
                "salt": CERTIFICATE_SALT
            },
            "message": {
                "delegate": self.delegate.to_checksum(None)
            }
        })
    }
}
