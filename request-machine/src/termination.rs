use state_table::{StateTable, StatefulPacket, Token};

use crate::error::Error;
use crate::packet::SequencedPacket;
use crate::request::{AuthStatus, Request};

/// Build the protocol-specific continuation token: a 12-byte listener
/// identity prefix and a 4-byte session-id suffix, c.f. `state_add` in
/// `proto_tacacs.c`.
fn synthesize_continuation_token<P>(req: &Request<P>) -> Token {
    let mut bytes = [0u8; 16];
    bytes[..12].copy_from_slice(&req.listener_id);
    bytes[12..].copy_from_slice(&req.session_id.to_be_bytes());
    Token::from_attribute_bytes(&bytes).expect("exactly 16 bytes by construction")
}

/// Apply §4.6's termination disposition once `SEND`'s section has run.
/// Authentication-only; callers must not invoke this for other
/// sub-protocols.
pub(crate) fn dispose<P: StatefulPacket + SequencedPacket>(
    table: &StateTable,
    req: &mut Request<P>,
) -> Result<(), Error> {
    let Some(status) = req.status else {
        table.discard(&req.inbound, &mut req.conv);
        return Ok(());
    };

    if status.is_terminal() {
        table.discard(&req.inbound, &mut req.conv);
        return Ok(());
    }

    debug_assert!(matches!(
        status,
        AuthStatus::GetUser | AuthStatus::GetPass | AuthStatus::GetData
    ));

    let Some(seq) = req.inbound.sequence() else {
        tracing::warn!(request_id = req.id, "continuation with no inbound sequence number, aborting");
        return Ok(());
    };

    if seq == 253 {
        tracing::warn!(
            request_id = req.id,
            "sequence number would wrap past the wire limit, restarting session"
        );
        table.discard(&req.inbound, &mut req.conv);
        req.reply.clear();
        req.status = Some(AuthStatus::Restart);
        return Ok(());
    }

    let token = synthesize_continuation_token(req);
    req.outbound.set_state_token(token);
    table.save_to_state(Some(&req.inbound), &mut req.outbound, &mut req.conv)?;
    Ok(())
}
