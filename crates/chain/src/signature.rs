use crate::error::ChainError;

/// Marshals a standard 65-byte compact signature (`r || s || v`) into the
/// 96-byte layout the on-chain verifier expects: `r || s || 31 zero bytes
/// || v`. Bit-exact with the verifier's calldata decoding, so the padding
/// bytes must stay zero and `v` must land at the final byte.
pub fn pad_signature(sig: &[u8]) -> Result<[u8; 96], ChainError> {
    if sig.len() != 65 {
        return Err(ChainError::BadSignatureLength(sig.len()));
    }
    let mut out = [0u8; 96];
    out[..64].copy_from_slice(&sig[..64]);
    out[95] = sig[64];
    Ok(out)
}

/// Pads and concatenates a batch of compact signatures in order.
pub fn pad_signatures(sigs: &[Vec<u8>]) -> Result<Vec<u8>, ChainError> {
    let mut out = Vec::with_capacity(sigs.len() * 96);
    for sig in sigs {
        out.extend_from_slice(&pad_signature(sig)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_a_compact_signature_to_96_bytes() {
        let mut sig = vec![0xaa; 32];
        sig.extend(vec![0xbb; 32]);
        sig.push(0x1b);
        let padded = pad_signature(&sig).unwrap();
        assert_eq!(padded.len(), 96);
        assert_eq!(&padded[0..32], &[0xaa; 32]);
        assert_eq!(&padded[32..64], &[0xbb; 32]);
        assert_eq!(&padded[64..95], &[0u8; 31]);
        assert_eq!(padded[95], 0x1b);
    }

    #[test]
    fn rejects_wrong_length_input() {
        assert!(pad_signature(&[0u8; 64]).is_err());
    }
}
