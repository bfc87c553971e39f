use rand::RngCore;

/// Length in octets of a state token, fixed by the wire protocols this table
/// serves (RADIUS/TACACS+ State attributes).
pub const TOKEN_LEN: usize = 16;

/// An opaque session-continuation token.
///
/// Not a security boundary: see [`Token::generate`] for the byte-offset
/// formula, which intentionally trades entropy for attempt/version
/// diagnostics baked into fixed offsets.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token([u8; TOKEN_LEN]);

impl Token {
    pub(crate) fn zeroed() -> Self {
        Token([0u8; TOKEN_LEN])
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_LEN] {
        &self.0
    }

    /// Build a token from wire bytes of arbitrary length. Truncates with a
    /// warning if longer than [`TOKEN_LEN`]; rejects (`None`) if shorter.
    pub fn from_attribute_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < TOKEN_LEN {
            tracing::warn!(len = bytes.len(), "state attribute shorter than a token, rejecting");
            return None;
        }
        if bytes.len() > TOKEN_LEN {
            tracing::warn!(
                len = bytes.len(),
                truncated_to = TOKEN_LEN,
                "state attribute longer than a token, truncating"
            );
        }
        let mut buf = [0u8; TOKEN_LEN];
        buf.copy_from_slice(&bytes[..TOKEN_LEN]);
        Some(Token(buf))
    }

    /// Generate a new token: fill with randomness, then overwrite the
    /// attempt/version-derived bytes at their fixed offsets, then apply an
    /// optional operator-configured seed byte.
    ///
    /// `attempt` is the round counter (0 for a cold session); `version_tag`
    /// is a 24-bit build-identifying value folded into bytes 8, 10, 12.
    pub fn generate(attempt: u32, version_tag: u32, seed: Option<u8>, rng: &mut dyn RngCore) -> Self {
        let mut buf = [0u8; TOKEN_LEN];
        rng.fill_bytes(&mut buf);

        let attempt_byte = attempt as u8;
        buf[0] = attempt_byte;
        buf[1] = buf[0] ^ attempt_byte;
        buf[8] = buf[2] ^ (((version_tag >> 16) & 0xff) as u8);
        buf[10] = buf[2] ^ (((version_tag >> 8) & 0xff) as u8);
        buf[12] = buf[2] ^ ((version_tag & 0xff) as u8);

        if let Some(seed) = seed {
            buf[3] = seed;
        }

        Token(buf)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        f.write_str(")")
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generate_overwrites_fixed_offsets() {
        let mut rng = StdRng::seed_from_u64(42);
        let token = Token::generate(3, 0x01_02_03, None, &mut rng);
        let bytes = token.as_bytes();
        assert_eq!(bytes[0], 3);
        assert_eq!(bytes[1], bytes[0] ^ 3);
        assert_eq!(bytes[8], bytes[2] ^ 0x01);
        assert_eq!(bytes[10], bytes[2] ^ 0x02);
        assert_eq!(bytes[12], bytes[2] ^ 0x03);
    }

    #[test]
    fn generate_applies_seed_byte() {
        let mut rng = StdRng::seed_from_u64(7);
        let token = Token::generate(0, 0, Some(0xAB), &mut rng);
        assert_eq!(token.as_bytes()[3], 0xAB);
    }

    #[test]
    fn from_attribute_bytes_rejects_short() {
        assert!(Token::from_attribute_bytes(&[0u8; 8]).is_none());
    }

    #[test]
    fn from_attribute_bytes_truncates_long() {
        let bytes = [7u8; 20];
        let token = Token::from_attribute_bytes(&bytes).unwrap();
        assert_eq!(token.as_bytes(), &[7u8; TOKEN_LEN]);
    }

    #[test]
    fn from_attribute_bytes_exact_len() {
        let bytes = [1u8; TOKEN_LEN];
        let token = Token::from_attribute_bytes(&bytes).unwrap();
        assert_eq!(token.as_bytes(), &bytes);
    }
}
