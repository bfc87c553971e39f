use crate::arena::Arena;
use crate::attribute::{Attribute, SideData};
use crate::error::Result;
use crate::packet::StatefulPacket;
use crate::table::{create_locked, StateTable};

/// The trio of fields that move, as a unit, between a conversation (request)
/// and a table entry: an [`Arena`] plus the [`Attribute`]s and [`SideData`]
/// parented to it. Owned by whatever type represents "the current request"
/// in a caller crate; `state-table` itself only ever sees this bundle.
#[derive(Debug, Default)]
pub struct ConversationState {
    pub arena: Option<Arena>,
    pub attributes: Vec<Attribute>,
    pub side_data: SideData,
}

impl ConversationState {
    pub fn is_empty(&self) -> bool {
        self.arena.is_none() && self.attributes.is_empty() && self.side_data.is_empty()
    }
}

impl StateTable {
    /// Move a matching entry's arena/attributes/side-data into `conv`,
    /// leaving the entry table-resident with those fields nulled out. A
    /// packet with no (or unrecognized) state token is a silent no-op.
    pub fn restore_from_state<P: StatefulPacket>(&self, inbound: &P, conv: &mut ConversationState) {
        let Some(token) = inbound.state_token() else {
            tracing::trace!("no state token on inbound packet, nothing to restore");
            return;
        };

        let displaced;
        {
            let mut inner = self.inner.lock();
            if let Some(&key) = inner.by_token.get(&token) {
                let entry = &mut inner.slab[key];
                displaced = conv.arena.take();
                conv.arena = entry.arena.take();
                conv.attributes = std::mem::take(&mut entry.attributes);
                conv.side_data = std::mem::take(&mut entry.side_data);
                tracing::debug!(%token, "restored session state");
            } else {
                displaced = None;
                tracing::trace!(%token, "no matching state entry");
            }
        }
        drop(displaced);
    }

    /// Extract the persistable subset of `conv`'s side-data and hand the
    /// arena/attributes/persistable side-data off to a (possibly new)
    /// entry, synthesizing a State attribute on `outbound` if one doesn't
    /// already carry one. Non-persistable side-data stays attached to
    /// `conv`.
    ///
    /// Reproduces the original's short-circuit: if `conv.attributes` is
    /// non-empty but nothing in `conv.side_data` was persistable, this
    /// returns `Ok(())` without touching the table at all, silently
    /// dropping the attributes. See the design document for why this is
    /// kept rather than "fixed".
    pub fn save_to_state<P: StatefulPacket>(
        &self,
        inbound: Option<&P>,
        outbound: &mut P,
        conv: &mut ConversationState,
    ) -> Result<()> {
        let persistable = conv.side_data.take_persistable();
        let has_state_attrs = !conv.attributes.is_empty();

        if has_state_attrs && persistable.is_empty() {
            tracing::warn!(
                "session-state attributes present with no persistable side data; discarding them"
            );
            return Ok(());
        }

        let prior_token = inbound.and_then(|p| p.state_token());

        let mut inner = self.inner.lock();
        let prior_key = prior_token.and_then(|t| inner.by_token.get(&t).copied());
        let key = create_locked(
            &mut inner,
            &self.config,
            self.clock.as_ref(),
            &mut *self.rng.lock(),
            &self.metrics,
            outbound,
            prior_key,
        )?;

        let entry = &mut inner.slab[key];
        entry.arena = conv.arena.take();
        entry.attributes = std::mem::take(&mut conv.attributes);
        entry.side_data = persistable;

        #[cfg(debug_assertions)]
        entry.verify_ownership();

        Ok(())
    }

    /// Forget the session named by `inbound`'s state token (if any) and
    /// null out `conv`'s transferable fields. Idempotent: a packet with no
    /// state token, or one naming an already-discarded session, is a no-op.
    pub fn discard<P: StatefulPacket>(&self, inbound: &P, conv: &mut ConversationState) {
        if let Some(token) = inbound.state_token() {
            self.discard_by(&token);
        }
        conv.arena = None;
        conv.attributes.clear();
        conv.side_data = SideData::default();
    }
}
