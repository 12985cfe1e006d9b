mod common;

use common::{LengthPrefixedCodec, GET_REQUEST, RESPONSE, SNMPV2_TRAP};
use snmp_core::{CacheError, EngineId, SecurityError, SnmpError};
use snmp_security::usm::{ExchangeState, LocalEngine, PduClass, SecurityLevel, UsmSecurityModel};
use snmp_security::{AuthProtocol, KeyExtension, PrivProtocol, UsmConfig, UsmUserEntry};

const MANAGER: &[u8] = b"\x80\x00\x1f\x88\x80manager";
const AGENT: &[u8] = b"\x80\x00\x1f\x88\x80agent";

type Model = UsmSecurityModel<LengthPrefixedCodec>;

fn scoped(tag: u8) -> Vec<u8> {
    let mut pdu = vec![tag];
    pdu.extend_from_slice(b"scoped-pdu-body");
    pdu
}

fn admin() -> UsmUserEntry {
    UsmUserEntry::builder(b"admin")
        .set_auth(AuthProtocol::HmacSha256, b"admin-auth-passphrase")
        .set_privacy(PrivProtocol::Aes128, b"admin-priv-passphrase")
        .build()
        .unwrap()
}

fn engine_with(config: UsmConfig, engine_id: &[u8], users: Vec<UsmUserEntry>) -> Model {
    let local = LocalEngine::new(EngineId::from_slice(engine_id).unwrap(), 1);
    let mut model = UsmSecurityModel::new(config, local, LengthPrefixedCodec).unwrap();
    for user in users {
        model.add_user(user).unwrap();
    }
    model
}

fn engine(engine_id: &[u8], users: Vec<UsmUserEntry>) -> Model {
    let config = UsmConfig::builder()
        .set_cache_ttl(10)
        .set_key_extension(KeyExtension::Blumenthal)
        .build()
        .unwrap();
    engine_with(config, engine_id, users)
}

/// The manager learns the agent's clock from an authenticated trap
fn learn_agent_clock(manager: &mut Model, agent: &mut Model) {
    agent.local_engine_mut().advance_ms(5_000);
    let (trap, msg_id) = agent
        .generate_request(b"admin", AGENT, SecurityLevel::AuthPriv, &scoped(SNMPV2_TRAP), 1000)
        .unwrap();
    agent.release(msg_id).unwrap();
    let processed = manager.process_incoming(&trap).unwrap();
    assert_eq!(processed.pdu_class, PduClass::Unconfirmed);
    assert_eq!(processed.state_reference, None);
    assert_eq!(manager.timeline().estimate(AGENT), Some((1, 5)));
}

#[test]
fn test_auth_priv_request_response() {
    let mut manager = engine(MANAGER, vec![admin()]);
    let mut agent = engine(AGENT, vec![admin()]);
    learn_agent_clock(&mut manager, &mut agent);

    let request = scoped(GET_REQUEST);
    let (wire, msg_id) = manager
        .generate_request(b"admin", AGENT, SecurityLevel::AuthPriv, &request, 1)
        .unwrap();
    assert!(!wire.windows(request.len()).any(|window| window == request.as_slice()));

    let incoming = agent.process_incoming(&wire).unwrap();
    assert_eq!(incoming.scoped_pdu, request);
    assert_eq!(incoming.security_level, SecurityLevel::AuthPriv);
    assert_eq!(incoming.security_name, b"admin");
    assert_eq!(incoming.pdu_class, PduClass::Confirmed);
    assert_eq!(incoming.msg_id, msg_id);
    let state_reference = incoming.state_reference.unwrap();
    assert_eq!(agent.pending_responses(), 1);

    let response = scoped(RESPONSE);
    let wire = agent.generate_response(state_reference, &response).unwrap();
    assert_eq!(agent.pending_responses(), 0);

    let processed = manager.process_incoming(&wire).unwrap();
    assert_eq!(processed.scoped_pdu, response);
    assert_eq!(processed.pdu_class, PduClass::Response);
    assert_eq!(processed.msg_id, msg_id);

    let matched = manager.match_response(processed.msg_id).unwrap();
    assert_eq!(matched.send_pdu_handle, 1);
    assert_eq!(matched.request.state, ExchangeState::Matched);
    assert_eq!(matched.request.engine_id, AGENT);
    assert_eq!(manager.outstanding_requests(), 0);
    assert_eq!(manager.statistics().total_discarded(), 0);
    assert_eq!(agent.statistics().total_discarded(), 0);
}

#[test]
fn test_unauthenticated_exchange() {
    let mut manager = engine(MANAGER, vec![]);
    let mut agent = engine(AGENT, vec![]);

    let (wire, msg_id) = manager
        .generate_request(b"", AGENT, SecurityLevel::NoAuthNoPriv, &scoped(GET_REQUEST), 5)
        .unwrap();
    let incoming = agent.process_incoming(&wire).unwrap();
    assert!(incoming.security_name.is_empty());
    assert!(incoming.security_parameters.auth_parameters.is_empty());

    let wire = agent
        .generate_response(incoming.state_reference.unwrap(), &scoped(RESPONSE))
        .unwrap();
    let processed = manager.process_incoming(&wire).unwrap();
    assert_eq!(processed.msg_id, msg_id);
    assert_eq!(manager.match_response(msg_id).unwrap().send_pdu_handle, 5);
}

#[test]
fn test_tampered_message_is_counted() {
    let mut manager = engine(MANAGER, vec![admin()]);
    let mut agent = engine(AGENT, vec![admin()]);
    learn_agent_clock(&mut manager, &mut agent);

    let (mut wire, _) = manager
        .generate_request(b"admin", AGENT, SecurityLevel::AuthPriv, &scoped(GET_REQUEST), 1)
        .unwrap();
    if let Some(last) = wire.last_mut() {
        *last ^= 0x01;
    }
    assert!(matches!(
        agent.process_incoming(&wire),
        Err(SnmpError::Security(SecurityError::AuthenticationFailure))
    ));
    assert_eq!(agent.statistics().wrong_digests, 1);
    assert_eq!(agent.pending_responses(), 0);
}

#[test]
fn test_request_outside_time_window() {
    let mut manager = engine(MANAGER, vec![admin()]);
    let mut agent = engine(AGENT, vec![admin()]);
    learn_agent_clock(&mut manager, &mut agent);

    agent.local_engine_mut().advance_ms(400_000);
    let (wire, _) = manager
        .generate_request(b"admin", AGENT, SecurityLevel::AuthNoPriv, &scoped(GET_REQUEST), 1)
        .unwrap();
    assert!(matches!(
        agent.process_incoming(&wire),
        Err(SnmpError::Security(SecurityError::NotInTimeWindow))
    ));

    agent.local_engine_mut().reboot();
    let (wire, _) = manager
        .generate_request(b"admin", AGENT, SecurityLevel::AuthNoPriv, &scoped(GET_REQUEST), 2)
        .unwrap();
    assert!(agent.process_incoming(&wire).is_err());
    assert_eq!(agent.statistics().not_in_time_windows, 2);
}

#[test]
fn test_replayed_trap_outside_window() {
    let mut manager = engine(MANAGER, vec![admin()]);
    let mut agent = engine(AGENT, vec![admin()]);
    agent.local_engine_mut().advance_ms(5_000);
    let (trap, _) = agent
        .generate_request(b"admin", AGENT, SecurityLevel::AuthNoPriv, &scoped(SNMPV2_TRAP), 1)
        .unwrap();

    manager.process_incoming(&trap).unwrap();
    // still accepted while the estimate stays inside the window
    manager.process_incoming(&trap).unwrap();

    // 200 seconds at the default 500 ms resolution
    for _ in 0..400 {
        manager.receive_timer_tick();
    }
    assert!(matches!(
        manager.process_incoming(&trap),
        Err(SnmpError::Security(SecurityError::NotInTimeWindow))
    ));
    assert_eq!(manager.statistics().not_in_time_windows, 1);
}

#[test]
fn test_unknown_user_and_unsupported_level() {
    let guest_with_auth = UsmUserEntry::builder(b"guest")
        .set_auth(AuthProtocol::HmacMd5, b"guest-passphrase")
        .build()
        .unwrap();
    let stranger = UsmUserEntry::builder(b"stranger")
        .set_auth(AuthProtocol::HmacSha, b"stranger-passphrase")
        .build()
        .unwrap();
    let mut manager = engine(MANAGER, vec![guest_with_auth, stranger]);
    let mut agent = engine(AGENT, vec![UsmUserEntry::builder(b"guest").build().unwrap()]);

    let (wire, _) = manager
        .generate_request(b"stranger", AGENT, SecurityLevel::AuthNoPriv, &scoped(GET_REQUEST), 1)
        .unwrap();
    assert!(matches!(
        agent.process_incoming(&wire),
        Err(SnmpError::Security(SecurityError::UnknownSecurityName))
    ));
    assert_eq!(agent.statistics().unknown_user_names, 1);

    let (wire, _) = manager
        .generate_request(b"guest", AGENT, SecurityLevel::AuthNoPriv, &scoped(GET_REQUEST), 2)
        .unwrap();
    assert!(matches!(
        agent.process_incoming(&wire),
        Err(SnmpError::Security(SecurityError::UnsupportedSecurityLevel(_)))
    ));
    assert_eq!(agent.statistics().unsupported_sec_levels, 1);
    assert_eq!(agent.statistics().total_discarded(), 2);
}

#[test]
fn test_protocol_combinations() {
    let combinations = [
        (AuthProtocol::HmacMd5, PrivProtocol::Des),
        (AuthProtocol::HmacSha, PrivProtocol::TripleDes),
        (AuthProtocol::HmacSha224, PrivProtocol::Aes128),
        (AuthProtocol::HmacSha384, PrivProtocol::Aes192),
        (AuthProtocol::HmacSha512, PrivProtocol::Aes256),
    ];
    for (auth, privacy) in combinations {
        let user = || {
            UsmUserEntry::builder(b"admin")
                .set_auth(auth, b"combined-auth-pass")
                .set_privacy(privacy, b"combined-priv-pass")
                .build()
                .unwrap()
        };
        let mut manager = engine(MANAGER, vec![user()]);
        let mut agent = engine(AGENT, vec![user()]);

        let trap = scoped(SNMPV2_TRAP);
        let (wire, _) = agent
            .generate_request(b"admin", AGENT, SecurityLevel::AuthPriv, &trap, 1)
            .unwrap();
        let processed = manager.process_incoming(&wire).unwrap();
        assert_eq!(processed.scoped_pdu, trap, "{} with {}", auth, privacy);
        assert_eq!(
            processed.security_parameters.auth_parameters.len(),
            auth.digest_length()
        );
    }
}

#[test]
fn test_pending_response_expires() {
    let mut manager = engine(MANAGER, vec![]);
    let mut agent = engine(AGENT, vec![]);
    let (wire, msg_id) = manager
        .generate_request(b"", AGENT, SecurityLevel::NoAuthNoPriv, &scoped(GET_REQUEST), 1)
        .unwrap();
    let state_reference = agent.process_incoming(&wire).unwrap().state_reference.unwrap();

    for _ in 0..9 {
        let tick = agent.receive_timer_tick();
        assert!(tick.expired_state_references.is_empty());
        manager.receive_timer_tick();
    }
    assert_eq!(agent.receive_timer_tick().expired_state_references, vec![state_reference]);
    assert_eq!(manager.receive_timer_tick().expired_requests, vec![msg_id]);

    assert!(matches!(
        agent.generate_response(state_reference, &scoped(RESPONSE)),
        Err(SnmpError::Cache(CacheError::CacheMiss(handle))) if handle == state_reference
    ));
    assert!(matches!(
        manager.release(msg_id),
        Err(SnmpError::Cache(CacheError::CacheMiss(_)))
    ));
}

#[test]
fn test_config_from_json_with_reeder_extension() {
    let config: UsmConfig =
        serde_json::from_str(r#"{"cache_ttl": 4, "key_extension": "legacy-reeder"}"#).unwrap();
    let user = || {
        UsmUserEntry::builder(b"ops")
            .set_auth(AuthProtocol::HmacSha, b"ops-auth-passphrase")
            .set_privacy(PrivProtocol::Aes256, b"ops-priv-passphrase")
            .build()
            .unwrap()
    };
    let mut manager = engine_with(config.clone(), MANAGER, vec![user()]);
    let mut agent = engine_with(config, AGENT, vec![user()]);

    let trap = scoped(SNMPV2_TRAP);
    let (wire, _) = agent
        .generate_request(b"ops", AGENT, SecurityLevel::AuthPriv, &trap, 1)
        .unwrap();
    assert_eq!(manager.process_incoming(&wire).unwrap().scoped_pdu, trap);
    assert_eq!(manager.config().cache_ttl, 4);
}

#[test]
fn test_aes256_without_extension_is_rejected() {
    let config = UsmConfig::default();
    let local = LocalEngine::new(EngineId::from_slice(MANAGER).unwrap(), 1);
    let mut model = UsmSecurityModel::new(config, local, LengthPrefixedCodec).unwrap();
    let user = UsmUserEntry::builder(b"ops")
        .set_auth(AuthProtocol::HmacSha, b"ops-auth-passphrase")
        .set_privacy(PrivProtocol::Aes256, b"ops-priv-passphrase")
        .build()
        .unwrap();
    assert!(matches!(
        model.add_user(user),
        Err(SnmpError::Security(SecurityError::UnsupportedPrivProtocol(_)))
    ));
}
