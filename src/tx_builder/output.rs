//! Signed transaction ready for broadcast

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::errors::TxResult;
use super::transaction::SignedTransaction;
use crate::types::CryptoHash;

/// Signed transaction together with its hash and wire bytes.
///
/// The bytes are computed once at signing time; `to_base64` is the payload
/// `send_tx` expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBuildOutput {
    pub signed: SignedTransaction,

    /// Transaction id, `sha256(borsh(tx))`
    pub hash: CryptoHash,

    /// `borsh(tx) ‖ borsh(signature)`
    pub bytes: Vec<u8>,
}

impl TxBuildOutput {
    pub fn new(signed: SignedTransaction) -> TxResult<Self> {
        let hash = signed.get_hash()?;
        let bytes = signed.to_bytes()?;
        Ok(Self {
            signed,
            hash,
            bytes,
        })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn nonce(&self) -> u64 {
        self.signed.transaction.nonce
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_signed(self) -> SignedTransaction {
        self.signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    use crate::tx_builder::actions::Action;
    use crate::tx_builder::transaction::Transaction;
    use crate::types::NearToken;

    #[test]
    fn test_output_matches_signed_transaction() {
        let key = KeyPair::from_ed25519_seed(&[2; 32]);
        let tx = Transaction::new(
            "alice.near".parse().unwrap(),
            key.public_key().clone(),
            1,
            "bob.near".parse().unwrap(),
            CryptoHash::default(),
            vec![Action::transfer(NearToken::from_yocto(1))],
        );
        let tx_len = tx.to_bytes().unwrap().len();
        let expected_hash = tx.get_hash().unwrap();
        let output = TxBuildOutput::new(tx.sign(&key).unwrap()).unwrap();

        assert_eq!(output.hash, expected_hash);
        assert_eq!(output.len(), tx_len + 1 + 64);
        assert_eq!(output.to_base64(), output.signed.to_base64().unwrap());
        assert_eq!(output.nonce(), 1);
    }
}
