use std::sync::Arc;
use std::time::Duration;

use state_table::testing::FakeClock;
use state_table::{
    Attribute, ConversationState, Error, SideDatum, StateTable, StateTableConfig, StatefulPacket,
    Token,
};

#[derive(Default)]
struct FakePacket {
    token: Option<Token>,
}

impl StatefulPacket for FakePacket {
    fn state_token(&self) -> Option<Token> {
        self.token
    }

    fn set_state_token(&mut self, token: Token) {
        self.token = Some(token);
    }
}

fn table_with(max_sessions: u32, timeout: Duration) -> (StateTable, Arc<FakeClock>) {
    let clock = Arc::new(FakeClock::new());
    let config = StateTableConfig {
        max_sessions,
        timeout,
        state_seed: None,
    };
    (
        StateTable::with_clock_and_seed(config, clock.clone(), 1),
        clock,
    )
}

#[test]
fn create_mints_a_token_and_tracks_the_session() {
    let (table, _clock) = table_with(10, Duration::from_secs(30));
    let mut outbound = FakePacket::default();

    let token = table.create(&mut outbound, None).unwrap();

    assert_eq!(outbound.state_token(), Some(token));
    assert!(table.contains(&token));
    assert_eq!(table.len(), 1);
}

#[test]
fn admission_rejects_once_capacity_is_reached() {
    let (table, _clock) = table_with(2, Duration::from_secs(30));

    for _ in 0..2 {
        let mut outbound = FakePacket::default();
        table.create(&mut outbound, None).unwrap();
    }

    let mut outbound = FakePacket::default();
    let err = table.create(&mut outbound, None).unwrap_err();
    assert_eq!(err, Error::TableFull { max_sessions: 2 });
    assert_eq!(table.len(), 2);
}

#[test]
fn reap_frees_space_for_new_sessions_once_timeout_elapses() {
    let (table, clock) = table_with(1, Duration::from_secs(10));

    let mut first = FakePacket::default();
    table.create(&mut first, None).unwrap();

    let mut blocked = FakePacket::default();
    assert!(table.create(&mut blocked, None).is_err());

    clock.advance(Duration::from_secs(11));

    let mut second = FakePacket::default();
    let token = table.create(&mut second, None).unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.contains(&token));
}

#[test]
fn discard_by_is_idempotent() {
    let (table, _clock) = table_with(10, Duration::from_secs(30));
    let mut outbound = FakePacket::default();
    let token = table.create(&mut outbound, None).unwrap();

    table.discard_by(&token);
    assert!(!table.contains(&token));
    assert_eq!(table.len(), 0);

    // second discard of the same (now-absent) token must not panic or
    // change anything
    table.discard_by(&token);
    assert_eq!(table.len(), 0);
}

#[test]
fn save_and_restore_round_trip_conversation_state() {
    let (table, _clock) = table_with(10, Duration::from_secs(30));

    let mut conv = ConversationState::default();
    let arena = state_table::Arena::new();
    conv.attributes.push(Attribute::new("reply-message", b"hi".to_vec(), arena.id()));
    conv.side_data.push(SideDatum::new("module-scratch", 42u32, true, arena.id()));
    conv.arena = Some(arena);

    let mut outbound = FakePacket::default();
    table.save_to_state(None::<&FakePacket>, &mut outbound, &mut conv).unwrap();
    let token = outbound.state_token().expect("token synthesized");

    assert!(conv.is_empty());

    let inbound = FakePacket { token: Some(token) };
    let mut restored = ConversationState::default();
    table.restore_from_state(&inbound, &mut restored);

    assert_eq!(restored.attributes.len(), 1);
    assert_eq!(restored.attributes[0].name, "reply-message");
    assert_eq!(restored.side_data.len(), 1);
    assert!(table.contains(&token), "entry stays table-resident after restore");

    // the entry is still there but nulled out
    let mut restored_again = ConversationState::default();
    table.restore_from_state(&inbound, &mut restored_again);
    assert!(restored_again.is_empty());
}

#[test]
fn save_to_state_short_circuits_when_attributes_have_no_persistable_side_data() {
    let (table, _clock) = table_with(10, Duration::from_secs(30));

    let mut conv = ConversationState::default();
    let arena = state_table::Arena::new();
    conv.attributes.push(Attribute::new("session-state", b"x".to_vec(), arena.id()));
    conv.arena = Some(arena);

    let mut outbound = FakePacket::default();
    table.save_to_state(None::<&FakePacket>, &mut outbound, &mut conv).unwrap();

    // nothing was created: the short-circuit fires and the table stays empty
    assert_eq!(table.len(), 0);
    assert!(outbound.state_token().is_none());
}

#[test]
fn save_to_state_proceeds_with_no_attributes_and_no_side_data() {
    let (table, _clock) = table_with(10, Duration::from_secs(30));
    let mut conv = ConversationState::default();

    let mut outbound = FakePacket::default();
    table.save_to_state(None::<&FakePacket>, &mut outbound, &mut conv).unwrap();

    assert_eq!(table.len(), 1);
    assert!(outbound.state_token().is_some());
}

#[test]
fn two_round_exchange_carries_attempt_counter_forward() {
    let (table, _clock) = table_with(10, Duration::from_secs(30));

    let mut round1_out = FakePacket::default();
    let token1 = table.create(&mut round1_out, None).unwrap();

    let mut round2_out = FakePacket::default();
    let token2 = table.create(&mut round2_out, Some(token1)).unwrap();

    assert_ne!(token1, token2);
    assert_eq!(table.len(), 1, "prior entry with no payload is retired on continuation");
}

#[test]
fn discard_via_packet_nulls_conversation_state() {
    let (table, _clock) = table_with(10, Duration::from_secs(30));
    let mut outbound = FakePacket::default();
    let token = table.create(&mut outbound, None).unwrap();

    let mut conv = ConversationState::default();
    conv.attributes.push(Attribute::new("x", vec![1], state_table::Arena::new().id()));

    let inbound = FakePacket { token: Some(token) };
    table.discard(&inbound, &mut conv);

    assert!(conv.is_empty());
    assert!(!table.contains(&token));
}

#[test]
fn metrics_reflect_created_and_reaped_counts() {
    let (table, clock) = table_with(1, Duration::from_secs(5));

    let mut first = FakePacket::default();
    table.create(&mut first, None).unwrap();

    clock.advance(Duration::from_secs(6));

    let mut second = FakePacket::default();
    table.create(&mut second, None).unwrap();

    let snapshot = table.metrics();
    assert_eq!(snapshot.created_total, 2);
    assert_eq!(snapshot.reaped_total, 1);
    assert_eq!(snapshot.len, 1);
}
