use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use slab::Slab;

use crate::clock::{Clock, SystemClock};
use crate::config::StateTableConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::metrics::{TableMetrics, TableMetricsSnapshot};
use crate::packet::StatefulPacket;
use crate::token::Token;

/// A 24-bit build-version tag folded into the attempt-derived token bytes.
/// Stands in for `RADIUSD_VERSION` in the original; any stable 24-bit value
/// works, it exists purely so a captured token can be attributed to a
/// deployment generation.
pub const BUILD_VERSION_TAG: u32 = 0x01_00_00;

pub(crate) struct Inner {
    pub(crate) slab: Slab<Entry>,
    pub(crate) by_token: BTreeMap<Token, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    next_id: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            slab: Slab::new(),
            by_token: BTreeMap::new(),
            head: None,
            tail: None,
            next_id: 0,
        }
    }
}

/// Unlink `key` from the expiry list and the token index. Idempotent against
/// missing list links (a single-entry list collapses head/tail to `None`
/// cleanly) but not against being called twice on the same still-resident
/// entry — callers always pair it with an immediate `slab.remove`.
fn unlink(inner: &mut Inner, key: usize) {
    let (prev, next, token) = {
        let e = &inner.slab[key];
        (e.prev, e.next, e.token)
    };
    match prev {
        Some(p) => inner.slab[p].next = next,
        None => inner.head = next,
    }
    match next {
        Some(n) => inner.slab[n].prev = prev,
        None => inner.tail = prev,
    }
    inner.by_token.remove(&token);
}

fn link_tail(inner: &mut Inner, key: usize) {
    match inner.tail {
        Some(t) => {
            inner.slab[t].next = Some(key);
            let entry = &mut inner.slab[key];
            entry.prev = Some(t);
            entry.next = None;
            inner.tail = Some(key);
        }
        None => {
            let entry = &mut inner.slab[key];
            entry.prev = None;
            entry.next = None;
            inner.head = Some(key);
            inner.tail = Some(key);
        }
    }
}

/// Reap every entry at the head of the expiry list whose expiry has passed,
/// returning them so the caller can drop them outside the lock.
fn reap_expired(inner: &mut Inner, now: std::time::Instant) -> Vec<Entry> {
    let mut reaped = Vec::new();
    while let Some(head) = inner.head {
        if inner.slab[head].expiry > now {
            break;
        }
        unlink(inner, head);
        reaped.push(inner.slab.remove(head));
    }
    reaped
}

/// The three-phase creation protocol of the original `state_entry_create`,
/// expressed with `parking_lot::MutexGuard::unlocked` standing in for the
/// source's explicit unlock/relock pair: phase one (reap + admit check +
/// prior snapshot) and phase three (re-check + insert + link) run under the
/// lock; phase two (destructor run + entry-shell allocation + token
/// derivation) runs with the lock released.
pub(crate) fn create_locked<P: StatefulPacket>(
    inner: &mut MutexGuard<'_, Inner>,
    config: &StateTableConfig,
    clock: &dyn Clock,
    rng: &mut dyn RngCore,
    metrics: &TableMetrics,
    outbound: &mut P,
    prior_key: Option<usize>,
) -> Result<usize> {
    let now = clock.now();

    let mut to_free = reap_expired(inner, now);
    metrics.record_reaped(to_free.len() as u64);

    if inner.by_token.len() as u32 >= config.max_sessions {
        MutexGuard::unlocked(inner, || drop(to_free));
        metrics.record_rejected();
        return Err(Error::TableFull {
            max_sessions: config.max_sessions,
        });
    }

    let prior_snapshot = prior_key.map(|key| {
        let e = &inner.slab[key];
        (e.token, e.attempt)
    });

    if let Some(key) = prior_key {
        if inner.slab[key].side_data.is_empty() && inner.slab[key].attributes.is_empty() {
            unlink(inner, key);
            to_free.push(inner.slab.remove(key));
        }
    }

    let attempt = prior_snapshot.map(|(_, a)| a + 1).unwrap_or(0);
    let expiry = now + config.timeout;

    let mut shell = None;
    MutexGuard::unlocked(inner, || {
        drop(to_free);
        shell = Some(Entry::fresh(expiry, attempt));
    });
    let mut entry = shell.expect("entry shell allocated while unlocked");

    entry.token = derive_token(
        outbound,
        prior_snapshot.map(|(t, _)| t),
        attempt,
        config.state_seed,
        rng,
    );

    if inner.by_token.len() as u32 >= config.max_sessions {
        metrics.record_rejected();
        return Err(Error::TableFull {
            max_sessions: config.max_sessions,
        });
    }
    if inner.by_token.contains_key(&entry.token) {
        return Err(Error::DuplicateToken);
    }

    entry.id = inner.next_id;
    inner.next_id += 1;

    let key = inner.slab.insert(entry);
    let token = inner.slab[key].token;
    inner.by_token.insert(token, key);
    link_tail(inner, key);

    metrics.record_created();
    metrics.record_size(inner.by_token.len());

    tracing::debug!(%token, attempt, "created state entry");

    Ok(key)
}

fn derive_token<P: StatefulPacket>(
    outbound: &mut P,
    prior_token: Option<Token>,
    attempt: u32,
    seed: Option<u8>,
    rng: &mut dyn RngCore,
) -> Token {
    if let Some(token) = outbound.state_token() {
        return token;
    }
    let _ = prior_token; // fully overwritten by the random refill in Token::generate
    let token = Token::generate(attempt, BUILD_VERSION_TAG, seed, rng);
    outbound.set_state_token(token);
    token
}

/// Concurrent, bounded, time-expiring table of in-flight authentication
/// conversations, keyed by [`Token`].
pub struct StateTable {
    pub(crate) inner: Mutex<Inner>,
    pub(crate) config: StateTableConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) rng: Mutex<StdRng>,
    pub(crate) metrics: TableMetrics,
}

impl StateTable {
    pub fn new(config: StateTableConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: StateTableConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
            config,
            clock,
            rng: Mutex::new(StdRng::from_os_rng()),
            metrics: TableMetrics::default(),
        }
    }

    /// Test/advanced-caller constructor taking an explicit rng seed, so
    /// token generation is reproducible without touching OS entropy.
    pub fn with_clock_and_seed(config: StateTableConfig, clock: Arc<dyn Clock>, rng_seed: u64) -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
            config,
            clock,
            rng: Mutex::new(StdRng::seed_from_u64(rng_seed)),
            metrics: TableMetrics::default(),
        }
    }

    pub fn config(&self) -> &StateTableConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.inner.lock().by_token.contains_key(token)
    }

    pub fn metrics(&self) -> TableMetricsSnapshot {
        self.metrics.snapshot(self.len(), self.config.max_sessions)
    }

    /// Insert a new, empty entry and mint (or adopt) its token. Mirrors
    /// `state_entry_create` directly, with no conversation payload attached
    /// yet — [`crate::handoff::StateTable::save_to_state`] is the one that
    /// moves attributes/side-data in.
    pub fn create<P: StatefulPacket>(&self, outbound: &mut P, prior: Option<Token>) -> Result<Token> {
        let mut inner = self.inner.lock();
        let prior_key = prior.and_then(|t| inner.by_token.get(&t).copied());
        let key = create_locked(
            &mut inner,
            &self.config,
            self.clock.as_ref(),
            &mut *self.rng.lock(),
            &self.metrics,
            outbound,
            prior_key,
        )?;
        Ok(inner.slab[key].token)
    }

    /// Look up and forget a session by token, unconditionally. Idempotent:
    /// discarding an already-absent token is a silent no-op.
    pub fn discard_by(&self, token: &Token) {
        let removed = {
            let mut inner = self.inner.lock();
            inner.by_token.get(token).copied().map(|key| {
                unlink(&mut inner, key);
                inner.slab.remove(key)
            })
        };
        if removed.is_some() {
            tracing::debug!(%token, "discarded state entry");
        }
        drop(removed);
    }

}
