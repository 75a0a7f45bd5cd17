// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::BPS_DENOMINATOR;
use crate::common::error::AppError;
use crate::common::parsing::{parse_address, parse_hex_bytes};
use crate::domain::position::format_bps;
use crate::network::chain::ChainClient;
use crate::network::lending::load_loan;
use alloy::primitives::{Address, B256, Bytes, Signature, U256};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

/// Body of `POST /api/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub user: String,
    pub signature: String,
    pub threshold: String,
}

/// A verified request to guard `user` at `threshold_bps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user: Address,
    /// Signature over the delegation certificate, as submitted.
    pub signature: Bytes,
    pub threshold_bps: u16,
}

/// Recovers the address that signed `hash`.
///
/// Accepts a 65-byte `r || s || v` signature with `v` in `{0, 1}` or `{27, 28}`.
pub fn recover_signer(hash: B256, raw: &[u8]) -> Result<Address, AppError> {
    if raw.len() != 65 {
        return Err(AppError::Authentication(format!(
            "signature must be 65 bytes, got {}",
            raw.len()
        )));
    }
    let parity = match raw[64] {
        0 | 27 => false,
        1 | 28 => true,
        v => {
            return Err(AppError::Authentication(format!(
                "unsupported recovery id {v}"
            )));
        }
    };
    let r = U256::from_be_slice(&raw[..32]);
    let s = U256::from_be_slice(&raw[32..64]);
    Signature::new(r, s, parity)
        .recover_address_from_prehash(&hash)
        .map_err(|e| AppError::Authentication(format!("signer recovery failed: {e}")))
}

/// Decimal fraction such as `"0.75"` to basis points, truncating below 1 bp.
pub fn parse_threshold_bps(raw: &str) -> Result<u16, AppError> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|e| AppError::validation("threshold", format!("'{raw}' is not a decimal: {e}")))?;
    if value <= Decimal::ZERO {
        return Err(AppError::validation("threshold", "must be positive"));
    }
    let bps = value
        .checked_mul(Decimal::from(BPS_DENOMINATOR))
        .map(|scaled| scaled.trunc())
        .and_then(|scaled| scaled.to_u16())
        .ok_or_else(|| AppError::validation("threshold", format!("'{raw}' is out of range")))?;
    if bps == 0 {
        return Err(AppError::validation("threshold", "smaller than one basis point"));
    }
    Ok(bps)
}

pub struct RegistrationVerifier {
    chain: Arc<dyn ChainClient>,
    certificate_hash: B256,
}

impl RegistrationVerifier {
    pub fn new(chain: Arc<dyn ChainClient>, certificate_hash: B256) -> Self {
        Self {
            chain,
            certificate_hash,
        }
    }

    /// Checks, in order: address, signature, threshold, protocol policy.
    pub async fn verify(&self, request: &RegistrationRequest) -> Result<Registration, AppError> {
        let user = parse_address("user", &request.user)?;

        let signature = parse_hex_bytes(&request.signature)
            .ok_or_else(|| AppError::Authentication("signature is not hex".into()))?;
        let signer = recover_signer(self.certificate_hash, &signature)?;
        if signer != user {
            return Err(AppError::Authentication(format!(
                "recovered signer {signer} does not match user {user}"
            )));
        }

        let threshold_bps = parse_threshold_bps(&request.threshold)?;
        let loan = load_loan(self.chain.as_ref(), user).await?;
        if threshold_bps >= loan.liquidation_threshold_bps {
            return Err(AppError::Policy(format!(
                "threshold {} is not below the liquidation threshold {}",
                format_bps(threshold_bps),
                loan.liquidation_threshold_display()
            )));
        }

        tracing::debug!(
            target: "verifier",
            account = %user,
            threshold_bps,
            liquidation_bps = loan.liquidation_threshold_bps,
            "Registration verified"
        );
        Ok(Registration {
            user,
            signature: Bytes::from(signature),
            threshold_bps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardian::DelegationCertificate;
    use crate::guardian::testing::{GUARDIAN, MockChain, dai_price, eth};
    use alloy::signers::SignerSync;
    use alloy::signers::local::PrivateKeySigner;

    fn signed(signer: &PrivateKeySigner, hash: B256, legacy_v: bool) -> String {
        let mut raw = signer.sign_hash_sync(&hash).unwrap().as_bytes();
        if !legacy_v {
            raw[64] -= 27;
        }
        format!("0x{}", hex::encode(raw))
    }

    fn setup() -> (Arc<MockChain>, RegistrationVerifier, PrivateKeySigner) {
        let chain = Arc::new(MockChain::new());
        let cert = DelegationCertificate::new(GUARDIAN);
        let verifier = RegistrationVerifier::new(chain.clone(), cert.hash());
        let borrower = PrivateKeySigner::random();
        chain.open_loan(borrower.address(), eth(10), eth(10_000), dai_price(2_000));
        (chain, verifier, borrower)
    }

    fn request(signer: &PrivateKeySigner, signature: String, threshold: &str) -> RegistrationRequest {
        RegistrationRequest {
            user: signer.address().to_string(),
            signature,
            threshold: threshold.to_string(),
        }
    }

    #[test]
    fn recovery_accepts_both_v_encodings() {
        let signer = PrivateKeySigner::random();
        let hash = DelegationCertificate::new(GUARDIAN).hash();
        for legacy in [true, false] {
            let sig = parse_hex_bytes(&signed(&signer, hash, legacy)).unwrap();
            assert_eq!(recover_signer(hash, &sig).unwrap(), signer.address());
        }
    }

    #[test]
    fn recovery_rejects_bad_shapes() {
        let hash = B256::repeat_byte(0x01);
        assert!(matches!(
            recover_signer(hash, &[0u8; 64]),
            Err(AppError::Authentication(_))
        ));
        let mut raw = [0x11u8; 65];
        raw[64] = 29;
        assert!(matches!(
            recover_signer(hash, &raw),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn threshold_parsing() {
        assert_eq!(parse_threshold_bps("0.75").unwrap(), 7_500);
        assert_eq!(parse_threshold_bps(" 0.82495 ").unwrap(), 8_249);
        assert_eq!(parse_threshold_bps("0.0001").unwrap(), 1);
        for bad in ["", "abc", "0", "-0.5", "0.00001", "7"] {
            assert!(
                matches!(parse_threshold_bps(bad), Err(AppError::Validation { .. })),
                "{bad}"
            );
        }
    }

    #[tokio::test]
    async fn accepts_signed_registration_below_liquidation_threshold() {
        let (_chain, verifier, borrower) = setup();
        let hash = DelegationCertificate::new(GUARDIAN).hash();
        let reg = verifier
            .verify(&request(&borrower, signed(&borrower, hash, true), "0.8249"))
            .await
            .unwrap();
        assert_eq!(reg.user, borrower.address());
        assert_eq!(reg.threshold_bps, 8_249);
        assert_eq!(reg.signature.len(), 65);
    }

    #[tokio::test]
    async fn threshold_equal_to_liquidation_threshold_is_rejected() {
        let (_chain, verifier, borrower) = setup();
        let hash = DelegationCertificate::new(GUARDIAN).hash();
        let err = verifier
            .verify(&request(&borrower, signed(&borrower, hash, false), "0.825"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Policy(_)), "{err:?}");
    }

    #[tokio::test]
    async fn signature_from_someone_else_is_rejected() {
        let (chain, verifier, borrower) = setup();
        let hash = DelegationCertificate::new(GUARDIAN).hash();
        let intruder = PrivateKeySigner::random();
        let err = verifier
            .verify(&request(&borrower, signed(&intruder, hash, true), "0.5"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        // Rejected before touching the chain.
        assert_eq!(chain.reads(), 0);
    }

    #[tokio::test]
    async fn signature_over_another_delegate_is_rejected() {
        let (_chain, verifier, borrower) = setup();
        let other = DelegationCertificate::new(Address::from([0x77; 20])).hash();
        let err = verifier
            .verify(&request(&borrower, signed(&borrower, other, true), "0.5"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn malformed_inputs_are_rejected() {
        let (_chain, verifier, borrower) = setup();
        let hash = DelegationCertificate::new(GUARDIAN).hash();

        let mut bad_user = request(&borrower, signed(&borrower, hash, true), "0.5");
        bad_user.user = "0x1234".into();
        assert!(matches!(
            verifier.verify(&bad_user).await,
            Err(AppError::Validation { .. })
        ));

        let not_hex = request(&borrower, "0xzz".into(), "0.5");
        assert!(matches!(
            verifier.verify(&not_hex).await,
            Err(AppError::Authentication(_))
        ));

        let bad_threshold = request(&borrower, signed(&borrower, hash, true), "lots");
        assert!(matches!(
            verifier.verify(&bad_threshold).await,
            Err(AppError::Validation { .. })
        ));
    }
}
