use crate::token::Token;

/// The minimal wire-packet surface the state table needs: reading and
/// writing the opaque State attribute. Real packet types, defined by
/// whatever protocol crate embeds this table, implement this; `state-table`
/// itself has no knowledge of wire formats.
pub trait StatefulPacket {
    /// The token carried by this packet's State attribute, if any and
    /// well-formed per [`Token::from_attribute_bytes`].
    fn state_token(&self) -> Option<Token>;

    /// Attach a State attribute carrying `token`, so the peer echoes it on
    /// the next round.
    fn set_state_token(&mut self, token: Token);
}
