//! Access and safety controller tests: ownership, renouncement and
//! safe-gated privileged execution.

use cosmwasm_std::{coins, to_json_binary, Addr, Uint128};
use cw20::{BalanceResponse, Cw20Coin, Cw20ExecuteMsg, Cw20QueryMsg};
use cw_multi_test::{App, AppResponse, ContractWrapper, Executor};

use door::msg::{
    AdminMsg, ConfigResponse, EscrowResponse, ExecuteMsg, InstantiateMsg, OperationKind, QueryMsg,
};
use door::{BridgeConfig, BridgeParams, Issue};

// ============================================================================
// Test Setup
// ============================================================================

const OWNER: &str = "terra1owner";
const SAFE: &str = "terra1safe";
const NEW_OWNER: &str = "terra1newowner";

fn contract_door() -> Box<dyn cw_multi_test::Contract<cosmwasm_std::Empty>> {
    let contract = ContractWrapper::new(
        door::contract::execute,
        door::contract::instantiate,
        door::contract::query,
    );
    Box::new(contract)
}

fn contract_cw20() -> Box<dyn cw_multi_test::Contract<cosmwasm_std::Empty>> {
    let contract = ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    );
    Box::new(contract)
}

/// Door with one native bridge whose escrow holds 50_000 uluna.
fn setup() -> (App, Addr, BridgeConfig) {
    let mut app = App::default();
    app.init_modules(|router, _, storage| {
        router
            .bank
            .init_balance(storage, &Addr::unchecked(OWNER), coins(10_000_000, "uluna"))
            .unwrap();
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
                witnesses: vec!["terra1witness0".to_string()],
                quorum: None,
            },
            &[],
            "door",
            None,
        )
        .unwrap();

    let config = BridgeConfig {
        locking_chain_door: door.to_string(),
        locking_chain_issue: Issue::native("uluna"),
        issuing_chain_door: "terra1issuingdoor".to_string(),
        issuing_chain_issue: Issue::native("uluna"),
    };
    app.execute_contract(
        Addr::unchecked(OWNER),
        door.clone(),
        &ExecuteMsg::CreateBridge {
            config: config.clone(),
            params: BridgeParams {
                min_create_amount: Uint128::from(1u128),
                signature_reward: Uint128::zero(),
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
        &coins(50_000, "uluna"),
    )
    .unwrap();

    (app, door, config)
}

fn run(
    app: &mut App,
    sender: &str,
    door: &Addr,
    msg: &ExecuteMsg,
) -> anyhow::Result<AppResponse> {
    app.execute_contract(Addr::unchecked(sender), door.clone(), msg, &[])
}

fn query_config(app: &App, door: &Addr) -> ConfigResponse {
    app.wrap()
        .query_wasm_smart(door, &QueryMsg::Config {})
        .unwrap()
}

// ============================================================================
// Pause & Ownership
// ============================================================================

#[test]
fn test_pause_requires_owner() {
    let (mut app, door, _config) = setup();

    let err = run(&mut app, "terra1random", &door, &ExecuteMsg::Pause {}).unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));

    run(&mut app, OWNER, &door, &ExecuteMsg::Pause {}).unwrap();
    assert!(query_config(&app, &door).paused);

    let err = run(&mut app, SAFE, &door, &ExecuteMsg::Unpause {}).unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));

    run(&mut app, OWNER, &door, &ExecuteMsg::Unpause {}).unwrap();
    assert!(!query_config(&app, &door).paused);
}

#[test]
fn test_transfer_ownership() {
    let (mut app, door, _config) = setup();

    let transfer = ExecuteMsg::TransferOwnership {
        new_owner: NEW_OWNER.to_string(),
    };
    let err = run(&mut app, NEW_OWNER, &door, &transfer).unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));

    run(&mut app, OWNER, &door, &transfer).unwrap();
    assert_eq!(
        query_config(&app, &door).owner,
        Some(Addr::unchecked(NEW_OWNER))
    );

    let err = run(&mut app, OWNER, &door, &ExecuteMsg::Pause {}).unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));
    run(&mut app, NEW_OWNER, &door, &ExecuteMsg::Pause {}).unwrap();
}

#[test]
fn test_renounce_ownership_is_irreversible() {
    let (mut app, door, _config) = setup();

    run(&mut app, OWNER, &door, &ExecuteMsg::RenounceOwnership {}).unwrap();
    let config = query_config(&app, &door);
    assert_eq!(config.owner, None);
    assert_eq!(config.safe, Addr::unchecked(SAFE));

    for msg in [
        ExecuteMsg::Pause {},
        ExecuteMsg::RenounceOwnership {},
        ExecuteMsg::TransferOwnership {
            new_owner: OWNER.to_string(),
        },
    ] {
        let err = run(&mut app, OWNER, &door, &msg).unwrap_err();
        assert!(err.root_cause().to_string().contains("Unauthorized"));
    }

    // The safe keeps its privileged path
    run(
        &mut app,
        SAFE,
        &door,
        &ExecuteMsg::Execute {
            target: "terra1treasury".to_string(),
            value: coins(1, "uluna"),
            data: Default::default(),
            operation: OperationKind::Send,
        },
    )
    .unwrap();
}

// ============================================================================
// Privileged Execution
// ============================================================================

#[test]
fn test_execute_requires_safe() {
    let (mut app, door, _config) = setup();

    let msg = ExecuteMsg::Execute {
        target: "terra1treasury".to_string(),
        value: coins(1_000, "uluna"),
        data: Default::default(),
        operation: OperationKind::Send,
    };
    let err = run(&mut app, OWNER, &door, &msg).unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));

    run(&mut app, SAFE, &door, &msg).unwrap();
    let balance = app.wrap().query_balance("terra1treasury", "uluna").unwrap();
    assert_eq!(balance.amount, Uint128::from(1_000u128));

    let empty_send = ExecuteMsg::Execute {
        target: "terra1treasury".to_string(),
        value: vec![],
        data: Default::default(),
        operation: OperationKind::Send,
    };
    let err = run(&mut app, SAFE, &door, &empty_send).unwrap_err();
    assert!(err.root_cause().to_string().contains("Invalid operation"));
}

#[test]
fn test_execute_call_forwards_to_target() {
    let (mut app, door, _config) = setup();

    let cw20_code_id = app.store_code(contract_cw20());
    let token = app
        .instantiate_contract(
            cw20_code_id,
            Addr::unchecked(OWNER),
            &cw20_base::msg::InstantiateMsg {
                name: "Stray Token".to_string(),
                symbol: "STRAY".to_string(),
                decimals: 6,
                initial_balances: vec![Cw20Coin {
                    address: door.to_string(),
                    amount: Uint128::from(5_000u128),
                }],
                mint: None,
                marketing: None,
            },
            &[],
            "cw20-stray",
            None,
        )
        .unwrap();

    run(
        &mut app,
        SAFE,
        &door,
        &ExecuteMsg::Execute {
            target: token.to_string(),
            value: vec![],
            data: to_json_binary(&Cw20ExecuteMsg::Transfer {
                recipient: "terra1treasury".to_string(),
                amount: Uint128::from(5_000u128),
            })
            .unwrap(),
            operation: OperationKind::Call,
        },
    )
    .unwrap();

    let balance: BalanceResponse = app
        .wrap()
        .query_wasm_smart(
            &token,
            &Cw20QueryMsg::Balance {
                address: "terra1treasury".to_string(),
            },
        )
        .unwrap();
    assert_eq!(balance.balance, Uint128::from(5_000u128));
}

#[test]
fn test_recover_escrow_via_self_call() {
    let (mut app, door, config) = setup();

    let recover = |amount: u128| ExecuteMsg::Execute {
        target: door.to_string(),
        value: vec![],
        data: to_json_binary(&AdminMsg::RecoverEscrow {
            bridge_config: config.clone(),
            recipient: "terra1treasury".to_string(),
            amount: Uint128::from(amount),
        })
        .unwrap(),
        operation: OperationKind::SelfCall,
    };

    let err = run(&mut app, SAFE, &door, &recover(60_000)).unwrap_err();
    assert!(err.root_cause().to_string().contains("Insufficient funds"));

    run(&mut app, SAFE, &door, &recover(20_000)).unwrap();

    let balance = app.wrap().query_balance("terra1treasury", "uluna").unwrap();
    assert_eq!(balance.amount, Uint128::from(20_000u128));
    let escrow: EscrowResponse = app
        .wrap()
        .query_wasm_smart(
            &door,
            &QueryMsg::Escrow {
                bridge_config: config.clone(),
            },
        )
        .unwrap();
    assert_eq!(escrow.amount, Uint128::from(30_000u128));
}

#[test]
fn test_fund_escrow_requires_owner() {
    let (mut app, door, config) = setup();
    app.init_modules(|router, _, storage| {
        router
            .bank
            .init_balance(storage, &Addr::unchecked(SAFE), coins(1_000, "uluna"))
            .unwrap();
    });

    let err = app
        .execute_contract(
            Addr::unchecked(SAFE),
            door.clone(),
            &ExecuteMsg::FundEscrow {
                bridge_config: config.clone(),
            },
            &coins(1_000, "uluna"),
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));
}
