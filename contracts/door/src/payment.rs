//! Attached-funds checks, escrow accounting and payout messages.

use cosmwasm_std::{
    to_json_binary, Addr, BankMsg, Coin, CosmosMsg, MessageInfo, StdResult, Storage, Uint128,
    WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use common::AssetInfo;

use crate::error::ContractError;
use crate::state::ESCROW;

/// Total attached in `denom`; any other denom is rejected.
pub fn paid_in(info: &MessageInfo, denom: &str) -> Result<Uint128, ContractError> {
    if let Some(other) = info.funds.iter().find(|c| c.denom != denom) {
        return Err(ContractError::TransferFailed {
            reason: format!("unexpected denom {}, expected {}", other.denom, denom),
        });
    }
    Ok(info.funds.iter().map(|c| c.amount).sum())
}

/// Require exactly `expected` of `denom` attached and nothing else.
pub fn must_pay_exact(
    info: &MessageInfo,
    denom: &str,
    expected: Uint128,
) -> Result<(), ContractError> {
    if expected.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }
    let got = paid_in(info, denom)?;
    if got < expected {
        return Err(ContractError::InsufficientFunds { expected, got });
    }
    if got > expected {
        return Err(ContractError::InvalidAmount {
            reason: format!("overpaid: sent {}, expected {}", got, expected),
        });
    }
    Ok(())
}

/// Require at least `min` of `denom` attached; returns the amount paid.
pub fn must_pay_reward(
    info: &MessageInfo,
    denom: &str,
    min: Uint128,
) -> Result<Uint128, ContractError> {
    let got = paid_in(info, denom)?;
    if got < min {
        return Err(ContractError::InsufficientReward { expected: min, got });
    }
    Ok(got)
}

pub fn credit_escrow(
    storage: &mut dyn Storage,
    bridge_key: &[u8],
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    let balance = ESCROW
        .may_load(storage, bridge_key)?
        .unwrap_or_default()
        .checked_add(amount)
        .map_err(cosmwasm_std::StdError::from)?;
    ESCROW.save(storage, bridge_key, &balance)?;
    Ok(balance)
}

pub fn debit_escrow(
    storage: &mut dyn Storage,
    bridge_key: &[u8],
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    let balance = ESCROW.may_load(storage, bridge_key)?.unwrap_or_default();
    if balance < amount {
        return Err(ContractError::InsufficientFunds {
            expected: amount,
            got: balance,
        });
    }
    let remaining = balance - amount;
    ESCROW.save(storage, bridge_key, &remaining)?;
    Ok(remaining)
}

/// Transfer of `amount` of `asset` from this door to `recipient`.
pub fn transfer_msg(asset: &AssetInfo, recipient: &Addr, amount: Uint128) -> StdResult<CosmosMsg> {
    Ok(match asset {
        AssetInfo::Native { denom } => CosmosMsg::Bank(BankMsg::Send {
            to_address: recipient.to_string(),
            amount: vec![Coin {
                denom: denom.clone(),
                amount,
            }],
        }),
        AssetInfo::Cw20 { contract_addr } => CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: contract_addr.clone(),
            msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
                recipient: recipient.to_string(),
                amount,
            })?,
            funds: vec![],
        }),
    })
}

/// Split `total` evenly among `witnesses`; the remainder goes to the first.
pub fn split_reward(total: Uint128, witnesses: &[Addr]) -> Vec<(Addr, Uint128)> {
    if witnesses.is_empty() || total.is_zero() {
        return vec![];
    }
    let n = Uint128::from(witnesses.len() as u128);
    let share = total / n;
    let remainder = total - share * n;

    witnesses
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let amount = if i == 0 { share + remainder } else { share };
            (w.clone(), amount)
        })
        .filter(|(_, amount)| !amount.is_zero())
        .collect()
}

/// Bank messages paying a native reward split among `witnesses`.
pub fn reward_msgs(denom: &str, total: Uint128, witnesses: &[Addr]) -> Vec<CosmosMsg> {
    split_reward(total, witnesses)
        .into_iter()
        .map(|(witness, amount)| {
            CosmosMsg::Bank(BankMsg::Send {
                to_address: witness.to_string(),
                amount: vec![Coin {
                    denom: denom.to_string(),
                    amount,
                }],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::coins;
    use cosmwasm_std::testing::mock_info;

    fn addrs(n: usize) -> Vec<Addr> {
        (0..n).map(|i| Addr::unchecked(format!("w{}", i))).collect()
    }

    #[test]
    fn test_split_reward_remainder_to_first() {
        let split = split_reward(Uint128::new(100), &addrs(3));
        assert_eq!(split[0].1, Uint128::new(34));
        assert_eq!(split[1].1, Uint128::new(33));
        assert_eq!(split[2].1, Uint128::new(33));
    }

    #[test]
    fn test_split_reward_small_total_skips_zero_shares() {
        let split = split_reward(Uint128::new(2), &addrs(3));
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].1, Uint128::new(2));
        assert!(split_reward(Uint128::zero(), &addrs(3)).is_empty());
    }

    #[test]
    fn test_must_pay_exact() {
        let info = mock_info("user", &coins(100, "uluna"));
        assert!(must_pay_exact(&info, "uluna", Uint128::new(100)).is_ok());
        assert_eq!(
            must_pay_exact(&info, "uluna", Uint128::new(150)).unwrap_err(),
            ContractError::InsufficientFunds {
                expected: Uint128::new(150),
                got: Uint128::new(100)
            }
        );
        assert!(matches!(
            must_pay_exact(&info, "uluna", Uint128::new(50)).unwrap_err(),
            ContractError::InvalidAmount { .. }
        ));
        assert!(matches!(
            must_pay_exact(&info, "uusd", Uint128::new(100)).unwrap_err(),
            ContractError::TransferFailed { .. }
        ));
    }

    #[test]
    fn test_must_pay_reward() {
        let info = mock_info("user", &coins(15, "uluna"));
        assert_eq!(
            must_pay_reward(&info, "uluna", Uint128::new(10)).unwrap(),
            Uint128::new(15)
        );
        assert!(matches!(
            must_pay_reward(&info, "uluna", Uint128::new(20)).unwrap_err(),
            ContractError::InsufficientReward { .. }
        ));
    }
}
