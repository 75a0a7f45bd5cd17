// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use regex::Regex;
use std::fs;
use std::path::Path;

/// Fail CI if shipped config files carry a 64-hex guardian key.
#[test]
fn no_committed_hex_keys_in_configs() {
    let re = Regex::new(r"0x?[a-fA-F0-9]{64}").unwrap();
    let candidates = ["config.toml", "config.example.toml", ".env.example"];
    for file in candidates {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read config");
        for (idx, line) in body.lines().enumerate() {
            if re.is_match(line) {
                panic!("Secret-looking hex in {} at line {}", file, idx + 1);
            }
        }
    }
}

#[test]
fn example_config_documents_required_settings() {
    let body = fs::read_to_string("config.example.toml").expect("read example config");
    for key in ["guardian_key", "repayment_contract_address", "rpc_url", "poll_interval_ms"] {
        assert!(body.contains(key), "config.example.toml is missing {key}");
    }
}
