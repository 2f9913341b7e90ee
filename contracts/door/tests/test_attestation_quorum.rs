//! Attestation aggregation tests: idempotence, vote overrides, witness set
//! changes, quorum policies and account creation.

use cosmwasm_std::{coins, to_json_binary, Addr, Uint128};
use cw_multi_test::{App, AppResponse, ContractWrapper, Executor};

use door::msg::{
    AdminMsg, BridgeClaimResponse, BridgeCreateAccountResponse, ClaimAttestationsResponse,
    CreateAccountAttestationsResponse, EscrowResponse, ExecuteMsg, InstantiateMsg, OperationKind,
    QueryMsg, WitnessesResponse,
};
use door::state::QuorumPolicy;
use door::{BridgeConfig, BridgeParams, Issue};

// ============================================================================
// Test Setup
// ============================================================================

const OWNER: &str = "terra1owner";
const SAFE: &str = "terra1safe";
const USER: &str = "terra1user";
const DEST: &str = "terra1dest";

fn contract_door() -> Box<dyn cw_multi_test::Contract<cosmwasm_std::Empty>> {
    let contract = ContractWrapper::new(
        door::contract::execute,
        door::contract::instantiate,
        door::contract::query,
    );
    Box::new(contract)
}

fn witness(i: usize) -> Addr {
    Addr::unchecked(format!("terra1witness{}", i))
}

/// Single door acting as the issuing side of a native bridge, escrow funded.
fn setup() -> (App, Addr, BridgeConfig) {
    let mut app = App::default();
    app.init_modules(|router, _, storage| {
        for account in [OWNER, USER] {
            router
                .bank
                .init_balance(storage, &Addr::unchecked(account), coins(10_000_000, "uluna"))
                .unwrap();
        }
    });

    let code_id = app.store_code(contract_door());
    let door = app
        .instantiate_contract(
            code_id,
            Addr::unchecked(OWNER),
            &InstantiateMsg {
                owner: OWNER.to_string(),
                safe: SAFE.to_string(),
                native_denom: "uluna".to_string(),
                min_signature_reward: Uint128::zero(),
                min_create_bridge_reward: Uint128::zero(),
                witnesses: (0..5).map(|i| witness(i).to_string()).collect(),
                quorum: None,
            },
            &[],
            "door",
            None,
        )
        .unwrap();

    let config = BridgeConfig {
        locking_chain_door: "terra1lockingdoor".to_string(),
        locking_chain_issue: Issue::native("uluna"),
        issuing_chain_door: door.to_string(),
        issuing_chain_issue: Issue::native("uluna"),
    };
    app.execute_contract(
        Addr::unchecked(OWNER),
        door.clone(),
        &ExecuteMsg::CreateBridge {
            config: config.clone(),
            params: BridgeParams {
                min_create_amount: Uint128::from(1_000u128),
                signature_reward: Uint128::from(100u128),
            },
        },
        &[],
    )
    .unwrap();
    app.execute_contract(
        Addr::unchecked(OWNER),
        door.clone(),
        &ExecuteMsg::FundEscrow {
            bridge_config: config.clone(),
        },
        &coins(1_000_000, "uluna"),
    )
    .unwrap();

    app.execute_contract(
        Addr::unchecked(USER),
        door.clone(),
        &ExecuteMsg::CreateClaimId {
            bridge_config: config.clone(),
            sender: "terra1remote".to_string(),
        },
        &coins(100, "uluna"),
    )
    .unwrap();

    (app, door, config)
}

fn attest(
    app: &mut App,
    door: &Addr,
    config: &BridgeConfig,
    witness: Addr,
    amount: u128,
) -> anyhow::Result<AppResponse> {
    app.execute_contract(
        witness,
        door.clone(),
        &ExecuteMsg::AddClaimAttestation {
            bridge_config: config.clone(),
            claim_id: 1,
            amount: Uint128::from(amount),
            sender: "terra1remote".to_string(),
            destination: Some(DEST.to_string()),
        },
        &[],
    )
}

fn query_claim(app: &App, door: &Addr, config: &BridgeConfig) -> BridgeClaimResponse {
    app.wrap()
        .query_wasm_smart(
            door,
            &QueryMsg::BridgeClaim {
                bridge_config: config.clone(),
                claim_id: 1,
            },
        )
        .unwrap()
}

fn safe_admin(app: &mut App, door: &Addr, msg: &AdminMsg) -> anyhow::Result<AppResponse> {
    app.execute_contract(
        Addr::unchecked(SAFE),
        door.clone(),
        &ExecuteMsg::Execute {
            target: door.to_string(),
            value: vec![],
            data: to_json_binary(msg).unwrap(),
            operation: OperationKind::SelfCall,
        },
        &[],
    )
}

fn status_of(res: &AppResponse) -> String {
    res.events
        .iter()
        .flat_map(|e| e.attributes.iter())
        .find(|a| a.key == "status")
        .map(|a| a.value.clone())
        .unwrap_or_default()
}

// ============================================================================
// Claim Attestations
// ============================================================================

#[test]
fn test_identical_resubmission_is_noop() {
    let (mut app, door, config) = setup();

    let res = attest(&mut app, &door, &config, witness(0), 7).unwrap();
    assert_eq!(status_of(&res), "recorded");
    let res = attest(&mut app, &door, &config, witness(0), 7).unwrap();
    assert_eq!(status_of(&res), "duplicate");
    attest(&mut app, &door, &config, witness(0), 7).unwrap();

    let votes: ClaimAttestationsResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::ClaimAttestations {
                bridge_config: config.clone(),
                claim_id: 1,
            },
        )
        .unwrap();
    assert_eq!(votes.attestations.len(), 1);
    assert!(!query_claim(&app, &door, &config).ready);
}

#[test]
fn test_second_vote_overrides_first() {
    let (mut app, door, config) = setup();

    attest(&mut app, &door, &config, witness(0), 7).unwrap();
    attest(&mut app, &door, &config, witness(1), 7).unwrap();
    attest(&mut app, &door, &config, witness(2), 7).unwrap();
    assert!(query_claim(&app, &door, &config).ready);

    // Witness 2 changes its mind; quorum on 7 is lost
    let res = attest(&mut app, &door, &config, witness(2), 8).unwrap();
    assert_eq!(status_of(&res), "replaced");
    let claim = query_claim(&app, &door, &config);
    assert!(!claim.ready);
    assert!(claim.attested.is_none());

    let votes: ClaimAttestationsResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::ClaimAttestations {
                bridge_config: config.clone(),
                claim_id: 1,
            },
        )
        .unwrap();
    assert_eq!(votes.attestations.len(), 3);
    let w2 = votes
        .attestations
        .iter()
        .find(|a| a.witness == witness(2))
        .unwrap();
    assert_eq!(w2.vote.amount, Uint128::from(8u128));
}

#[test]
fn test_attestation_authorization_and_consistency() {
    let (mut app, door, config) = setup();

    let err = attest(&mut app, &door, &config, Addr::unchecked("terra1stranger"), 7).unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized witness"));

    let err = app
        .execute_contract(
            witness(0),
            door.clone(),
            &ExecuteMsg::AddClaimAttestation {
                bridge_config: config.clone(),
                claim_id: 99,
                amount: Uint128::from(7u128),
                sender: "terra1remote".to_string(),
                destination: None,
            },
            &[],
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Claim not found"));

    let err = app
        .execute_contract(
            witness(0),
            door.clone(),
            &ExecuteMsg::AddClaimAttestation {
                bridge_config: config.clone(),
                claim_id: 1,
                amount: Uint128::from(7u128),
                sender: "terra1impostor".to_string(),
                destination: None,
            },
            &[],
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Attestation mismatch"));
}

#[test]
fn test_removed_witness_votes_stop_counting() {
    let (mut app, door, config) = setup();

    attest(&mut app, &door, &config, witness(0), 7).unwrap();
    attest(&mut app, &door, &config, witness(1), 7).unwrap();
    attest(&mut app, &door, &config, witness(2), 7).unwrap();
    assert!(query_claim(&app, &door, &config).ready);

    safe_admin(
        &mut app,
        &door,
        &AdminMsg::UpdateWitnesses {
            bridge_config: None,
            add: vec![],
            remove: vec![witness(2).to_string()],
            quorum: None,
        },
    )
    .unwrap();

    let witnesses: WitnessesResponse = app
        .wrap()
        .query_wasm_smart(&door, &QueryMsg::Witnesses { bridge_config: None })
        .unwrap();
    assert_eq!(witnesses.version, 2);
    assert_eq!(witnesses.witnesses.len(), 4);
    assert_eq!(witnesses.required, 3);

    // Only two current votes remain
    assert!(!query_claim(&app, &door, &config).ready);
    let err = app
        .execute_contract(
            Addr::unchecked(USER),
            door.clone(),
            &ExecuteMsg::Claim {
                bridge_config: config.clone(),
                claim_id: 1,
                amount: Uint128::from(7u128),
                destination: DEST.to_string(),
            },
            &[],
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Claim not ready"));

    // The removed witness can no longer vote
    let err = attest(&mut app, &door, &config, witness(2), 7).unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized witness"));

    attest(&mut app, &door, &config, witness(3), 7).unwrap();
    assert!(query_claim(&app, &door, &config).ready);
}

#[test]
fn test_attested_value_follows_witness_set_changes() {
    let (mut app, door, config) = setup();

    attest(&mut app, &door, &config, witness(0), 7).unwrap();
    attest(&mut app, &door, &config, witness(1), 7).unwrap();
    let res = attest(&mut app, &door, &config, witness(2), 7).unwrap();
    assert!(res.events.iter().any(|e| e.ty == "wasm-credit"));
    let claim = query_claim(&app, &door, &config);
    assert!(claim.ready);
    assert_eq!(claim.attested.unwrap().amount, Uint128::from(7u128));

    // Two of the three voters leave; one current vote out of two required
    safe_admin(
        &mut app,
        &door,
        &AdminMsg::UpdateWitnesses {
            bridge_config: None,
            add: vec![],
            remove: vec![witness(1).to_string(), witness(2).to_string()],
            quorum: None,
        },
    )
    .unwrap();
    let claim = query_claim(&app, &door, &config);
    assert!(!claim.ready);
    assert!(claim.attested.is_none());
}

#[test]
fn test_quorum_reached_by_shrinking_witness_set() {
    let (mut app, door, config) = setup();

    attest(&mut app, &door, &config, witness(0), 7).unwrap();
    attest(&mut app, &door, &config, witness(1), 7).unwrap();
    let claim = query_claim(&app, &door, &config);
    assert!(!claim.ready);
    assert!(claim.attested.is_none());

    // Dropping two silent witnesses leaves 2 of 3 in agreement
    safe_admin(
        &mut app,
        &door,
        &AdminMsg::UpdateWitnesses {
            bridge_config: None,
            add: vec![],
            remove: vec![witness(3).to_string(), witness(4).to_string()],
            quorum: None,
        },
    )
    .unwrap();
    let claim = query_claim(&app, &door, &config);
    assert!(claim.ready);
    let attested = claim.attested.unwrap();
    assert_eq!(attested.amount, Uint128::from(7u128));
    assert_eq!(attested.sender, "terra1remote");
    assert_eq!(attested.destination.as_deref(), Some(DEST));

    // The next attestation records the credit
    let res = attest(&mut app, &door, &config, witness(0), 7).unwrap();
    assert_eq!(status_of(&res), "duplicate");
    assert!(res.events.iter().any(|e| e.ty == "wasm-credit"));

    app.execute_contract(
        Addr::unchecked(USER),
        door.clone(),
        &ExecuteMsg::Claim {
            bridge_config: config.clone(),
            claim_id: 1,
            amount: Uint128::from(7u128),
            destination: DEST.to_string(),
        },
        &[],
    )
    .unwrap();
    let claim = query_claim(&app, &door, &config);
    assert!(claim.resolved);
    assert!(!claim.ready);
    assert_eq!(claim.attested.unwrap().amount, Uint128::from(7u128));
}

#[test]
fn test_bridge_override_with_threshold() {
    let (mut app, door, config) = setup();

    let err = safe_admin(
        &mut app,
        &door,
        &AdminMsg::UpdateWitnesses {
            bridge_config: Some(config.clone()),
            add: vec![],
            remove: vec![],
            quorum: Some(QuorumPolicy::Threshold { count: 2 }),
        },
    )
    .unwrap_err();
    assert!(err.root_cause().to_string().contains("Invalid witness set"));

    safe_admin(
        &mut app,
        &door,
        &AdminMsg::UpdateWitnesses {
            bridge_config: Some(config.clone()),
            add: vec![],
            remove: vec![],
            quorum: Some(QuorumPolicy::Threshold { count: 4 }),
        },
    )
    .unwrap();

    let witnesses: WitnessesResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::Witnesses {
                bridge_config: Some(config.clone()),
            },
        )
        .unwrap();
    assert!(witnesses.bridge_override);
    assert_eq!(witnesses.required, 4);

    // The global set is untouched
    let global: WitnessesResponse = app
        .wrap()
        .query_wasm_smart(&door, &QueryMsg::Witnesses { bridge_config: None })
        .unwrap();
    assert!(!global.bridge_override);
    assert_eq!(global.required, 3);

    for i in 0..3 {
        attest(&mut app, &door, &config, witness(i), 7).unwrap();
    }
    assert!(!query_claim(&app, &door, &config).ready);
    attest(&mut app, &door, &config, witness(3), 7).unwrap();
    assert!(query_claim(&app, &door, &config).ready);
}

#[test]
fn test_update_witnesses_requires_safe_self_call() {
    let (mut app, door, _config) = setup();
    let msg = AdminMsg::UpdateWitnesses {
        bridge_config: None,
        add: vec!["terra1newwitness".to_string()],
        remove: vec![],
        quorum: None,
    };

    let err = app
        .execute_contract(
            Addr::unchecked(OWNER),
            door.clone(),
            &ExecuteMsg::Execute {
                target: door.to_string(),
                value: vec![],
                data: to_json_binary(&msg).unwrap(),
                operation: OperationKind::SelfCall,
            },
            &[],
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));

    let err = app
        .execute_contract(
            Addr::unchecked(SAFE),
            door.clone(),
            &ExecuteMsg::Execute {
                target: "terra1elsewhere".to_string(),
                value: vec![],
                data: to_json_binary(&msg).unwrap(),
                operation: OperationKind::SelfCall,
            },
            &[],
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Invalid operation"));

    let res = safe_admin(&mut app, &door, &msg).unwrap();
    let methods: Vec<&str> = res
        .events
        .iter()
        .flat_map(|e| e.attributes.iter())
        .filter(|a| a.key == "method")
        .map(|a| a.value.as_str())
        .collect();
    assert_eq!(methods, vec!["update_witnesses"]);
    assert!(res
        .events
        .iter()
        .flat_map(|e| e.attributes.iter())
        .all(|a| a.key != "action"));

    let witnesses: WitnessesResponse = app
        .wrap()
        .query_wasm_smart(&door, &QueryMsg::Witnesses { bridge_config: None })
        .unwrap();
    assert_eq!(witnesses.witnesses.len(), 6);
    assert_eq!(witnesses.required, 4);
}

// ============================================================================
// Account Creation
// ============================================================================

fn attest_create_account(
    app: &mut App,
    door: &Addr,
    config: &BridgeConfig,
    witness: Addr,
    amount: u128,
) -> anyhow::Result<AppResponse> {
    app.execute_contract(
        witness,
        door.clone(),
        &ExecuteMsg::AddCreateAccountAttestation {
            bridge_config: config.clone(),
            destination: "terra1newaccount".to_string(),
            amount: Uint128::from(amount),
            signature_reward: Uint128::from(100u128),
        },
        &[],
    )
}

#[test]
fn test_create_account_settles_at_quorum() {
    let (mut app, door, config) = setup();

    let err = attest_create_account(&mut app, &door, &config, witness(0), 999).unwrap_err();
    assert!(err.root_cause().to_string().contains("below minimum"));

    attest_create_account(&mut app, &door, &config, witness(0), 5_000).unwrap();
    attest_create_account(&mut app, &door, &config, witness(1), 5_000).unwrap();
    let record: BridgeCreateAccountResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::BridgeCreateAccount {
                bridge_config: config.clone(),
                account: "terra1newaccount".to_string(),
            },
        )
        .unwrap();
    assert!(record.exists);
    assert!(!record.created);

    let votes: CreateAccountAttestationsResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::CreateAccountAttestations {
                bridge_config: config.clone(),
                account: "terra1newaccount".to_string(),
            },
        )
        .unwrap();
    assert_eq!(votes.attestations.len(), 2);
    assert!(votes.attestations.iter().all(|a| a.current));
    assert_eq!(votes.attestations[0].vote.amount, Uint128::from(5_000u128));

    let res = attest_create_account(&mut app, &door, &config, witness(2), 5_000).unwrap();
    assert!(res.events.iter().any(|e| e.ty == "wasm-create_account"));

    let balance = app
        .wrap()
        .query_balance("terra1newaccount", "uluna")
        .unwrap()
        .amount;
    assert_eq!(balance, Uint128::from(5_000u128));
    let reward = app
        .wrap()
        .query_balance(witness(0).as_str(), "uluna")
        .unwrap()
        .amount;
    assert_eq!(reward, Uint128::from(34u128));

    let escrow: EscrowResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::Escrow {
                bridge_config: config.clone(),
            },
        )
        .unwrap();
    assert_eq!(escrow.amount, Uint128::from(1_000_000u128 - 5_100));

    // Late vote is recorded without paying again
    let res = attest_create_account(&mut app, &door, &config, witness(3), 5_000).unwrap();
    assert!(res
        .events
        .iter()
        .any(|e| e.attributes.iter().any(|a| a.key == "already_created")));
    let balance = app
        .wrap()
        .query_balance("terra1newaccount", "uluna")
        .unwrap()
        .amount;
    assert_eq!(balance, Uint128::from(5_000u128));
}

fn create_account_votes(
    app: &App,
    door: &Addr,
    config: &BridgeConfig,
) -> CreateAccountAttestationsResponse {
    app.wrap()
        .query_wasm_smart(
            door,
            &QueryMsg::CreateAccountAttestations {
                bridge_config: config.clone(),
                account: "terra1newaccount".to_string(),
            },
        )
        .unwrap()
}

fn create_account_record(
    app: &App,
    door: &Addr,
    config: &BridgeConfig,
) -> BridgeCreateAccountResponse {
    app.wrap()
        .query_wasm_smart(
            door,
            &QueryMsg::BridgeCreateAccount {
                bridge_config: config.clone(),
                account: "terra1newaccount".to_string(),
            },
        )
        .unwrap()
}

#[test]
fn test_create_account_vote_rules() {
    let (mut app, door, config) = setup();

    let err = attest_create_account(
        &mut app,
        &door,
        &config,
        Addr::unchecked("terra1stranger"),
        5_000,
    )
    .unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized witness"));
    assert!(create_account_votes(&app, &door, &config).attestations.is_empty());

    let res = attest_create_account(&mut app, &door, &config, witness(0), 5_000).unwrap();
    assert_eq!(status_of(&res), "recorded");
    let before = create_account_votes(&app, &door, &config);

    let res = attest_create_account(&mut app, &door, &config, witness(0), 5_000).unwrap();
    assert_eq!(status_of(&res), "duplicate");
    assert_eq!(create_account_votes(&app, &door, &config), before);

    // Witness 0 changes its vote; only the latest one counts
    let res = attest_create_account(&mut app, &door, &config, witness(0), 6_000).unwrap();
    assert_eq!(status_of(&res), "replaced");
    let votes = create_account_votes(&app, &door, &config);
    assert_eq!(votes.attestations.len(), 1);
    assert_eq!(votes.attestations[0].vote.amount, Uint128::from(6_000u128));

    attest_create_account(&mut app, &door, &config, witness(1), 5_000).unwrap();
    attest_create_account(&mut app, &door, &config, witness(2), 5_000).unwrap();
    assert!(!create_account_record(&app, &door, &config).created);

    attest_create_account(&mut app, &door, &config, witness(3), 5_000).unwrap();
    assert!(create_account_record(&app, &door, &config).created);
    let balance = app
        .wrap()
        .query_balance("terra1newaccount", "uluna")
        .unwrap()
        .amount;
    assert_eq!(balance, Uint128::from(5_000u128));
}

#[test]
fn test_create_account_attestation_rejected_while_paused() {
    let (mut app, door, config) = setup();

    app.execute_contract(
        Addr::unchecked(OWNER),
        door.clone(),
        &ExecuteMsg::Pause {},
        &[],
    )
    .unwrap();

    let err = attest_create_account(&mut app, &door, &config, witness(0), 5_000).unwrap_err();
    assert!(err.root_cause().to_string().contains("Door is paused"));
    assert!(create_account_votes(&app, &door, &config).attestations.is_empty());
    assert!(!create_account_record(&app, &door, &config).exists);
}

#[test]
fn test_second_create_account_for_destination_is_not_paid() {
    let (mut app, door, config) = setup();

    for i in 0..3 {
        attest_create_account(&mut app, &door, &config, witness(i), 5_000).unwrap();
    }
    assert!(create_account_record(&app, &door, &config).created);

    // A later commit to the same destination carries a different amount
    for i in 0..3 {
        let res = attest_create_account(&mut app, &door, &config, witness(i), 8_000).unwrap();
        assert!(res
            .events
            .iter()
            .any(|e| e.attributes.iter().any(|a| a.key == "already_created")));
        assert!(!res.events.iter().any(|e| e.ty == "wasm-create_account"));
    }

    let balance = app
        .wrap()
        .query_balance("terra1newaccount", "uluna")
        .unwrap()
        .amount;
    assert_eq!(balance, Uint128::from(5_000u128));
    let escrow: EscrowResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::Escrow {
                bridge_config: config.clone(),
            },
        )
        .unwrap();
    assert_eq!(escrow.amount, Uint128::from(1_000_000u128 - 5_100));
}

#[test]
fn test_create_account_commit_on_source_door() {
    let (mut app, door, config) = setup();

    let err = app
        .execute_contract(
            Addr::unchecked(USER),
            door.clone(),
            &ExecuteMsg::CreateAccountCommit {
                bridge_config: config.clone(),
                destination: "terra1remoteaccount".to_string(),
                amount: Uint128::from(5_000u128),
                signature_reward: Uint128::from(50u128),
            },
            &coins(5_050, "uluna"),
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Insufficient reward"));

    let err = app
        .execute_contract(
            Addr::unchecked(USER),
            door.clone(),
            &ExecuteMsg::CreateAccountCommit {
                bridge_config: config.clone(),
                destination: "terra1remoteaccount".to_string(),
                amount: Uint128::from(5_000u128),
                signature_reward: Uint128::from(100u128),
            },
            &coins(5_000, "uluna"),
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Insufficient funds"));

    app.execute_contract(
        Addr::unchecked(USER),
        door.clone(),
        &ExecuteMsg::CreateAccountCommit {
            bridge_config: config.clone(),
            destination: "terra1remoteaccount".to_string(),
            amount: Uint128::from(5_000u128),
            signature_reward: Uint128::from(100u128),
        },
        &coins(5_100, "uluna"),
    )
    .unwrap();

    let escrow: EscrowResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::Escrow {
                bridge_config: config.clone(),
            },
        )
        .unwrap();
    assert_eq!(escrow.amount, Uint128::from(1_005_100u128));
}
