//! Deposit confirmation.
//!
//! A deposit is a Bitcoin transaction paying the custody script at some output, alongside an
//! OP_RETURN output that names the EVM account to credit. Confirming it credits
//! `value - fee` to that account; the fee stays collectable until the deposit is swept.

use bitcoin::Txid;
use tracing::*;
use tunnel_primitives::{
    BitcoinAmount, EvmAddress, ScriptHash, UtxoPointer, constants::MAX_EXPOSED_TX_ELEMENTS,
};

use crate::{
    errors::{EconomicMismatchError, MalformedClaimError, Mismatch, UtxoValidationResult},
    ledger::TunnelLedger,
    oracle::{BitcoinOracle, TxView},
    script::{output_depositor, script_hash},
};

/// Outcome of a valid deposit confirmation claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositConfirmation {
    /// The custody output being credited.
    pub outpoint: UtxoPointer,

    /// Value of the custody output.
    pub value: BitcoinAmount,

    /// Amount to credit, `value - fee`.
    pub net: BitcoinAmount,

    /// Protocol fee retained, collectable at sweep time.
    pub fee: BitcoinAmount,

    pub depositor: EvmAddress,
}

/// Checks a claim that output `claimed_output_index` of `txid` is a creditable deposit.
///
/// Checks run in order and the first failure is returned:
///
/// 1. the deposit is not already acknowledged
/// 2. `claimed_output_index` is within the exposed outputs
/// 3. the transaction is known and has that output
/// 4. another OP_RETURN output names the depositor, as 20 raw bytes or 40 hex characters
/// 5. the output pays `custody_script_hash`
/// 6. the output is worth at least `min_deposit`
/// 7. the ledger's fee for that value leaves something to credit
///
/// # Parameters
///
/// - `txid` - The deposit transaction
/// - `claimed_output_index` - Index of the output paying custody
/// - `oracle` - Source of the transaction record
/// - `custody_script_hash` - Hash of the vault's current custody script
/// - `ledger` - Acknowledgment state and fee schedule
/// - `min_deposit` - Smallest creditable output value
///
/// # Returns
///
/// - `Ok(DepositConfirmation)` - The claim is valid. Nothing is recorded; the caller persists
///   the acknowledgment
/// - `Err(UtxoValidationError)` - The first violated check
pub fn check_deposit_confirmation_validity<O, L>(
    txid: &Txid,
    claimed_output_index: u32,
    oracle: &O,
    custody_script_hash: &ScriptHash,
    ledger: &L,
    min_deposit: BitcoinAmount,
) -> UtxoValidationResult<DepositConfirmation>
where
    O: BitcoinOracle + ?Sized,
    L: TunnelLedger + ?Sized,
{
    if ledger.is_deposit_acknowledged(txid)? {
        return Err(MalformedClaimError::DepositAlreadyAcknowledged { txid: *txid }.into());
    }

    let idx = claimed_output_index as usize;
    if idx >= MAX_EXPOSED_TX_ELEMENTS {
        return Err(MalformedClaimError::OutputIndexOutOfRange {
            index: claimed_output_index,
            max: MAX_EXPOSED_TX_ELEMENTS,
        }
        .into());
    }

    let view = TxView::fetch_known(oracle, txid)?;
    let Some(deposit_output) = view.output(idx) else {
        return Err(MalformedClaimError::MissingOutput {
            index: claimed_output_index,
            total: view.tx().total_outputs,
        }
        .into());
    };

    let depositor = view
        .outputs()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .find_map(|(_, out)| output_depositor(out))
        .ok_or(MalformedClaimError::DepositorNotFound { txid: *txid })?;

    let got_hash = script_hash(&deposit_output.script_pubkey);
    if got_hash != *custody_script_hash {
        return Err(EconomicMismatchError::ScriptHash {
            index: claimed_output_index,
            mismatch: Mismatch::new(*custody_script_hash, got_hash),
        }
        .into());
    }

    let value = deposit_output.value;
    if value < min_deposit {
        return Err(EconomicMismatchError::DepositBelowMinimum {
            value,
            min: min_deposit,
        }
        .into());
    }

    let fee = ledger.calculate_deposit_fee(value)?;
    let net = match value.checked_sub(fee) {
        Some(net) if !net.is_zero() => net,
        _ => return Err(EconomicMismatchError::DepositFeeTooHigh { value, fee }.into()),
    };

    debug!(%txid, vout = claimed_output_index, %value, %fee, %depositor, "deposit confirmation valid");

    Ok(DepositConfirmation {
        outpoint: UtxoPointer::new(*txid, claimed_output_index),
        value,
        net,
        fee,
        depositor,
    })
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use tunnel_params::DepositFeeSchedule;
    use tunnel_test_utils::{ArbitraryGenerator, init_test_logging};

    use super::*;
    use crate::{
        errors::UtxoValidationError,
        test_utils::{
            MemLedger, MemOracle, custody_hash, custody_script, input, op_return, output, sats,
            txid, user_script,
        },
    };

    const DEPOSITOR: [u8; 20] = hex!("aa00000000000000000000000000000000000000");

    /// Address output first, deposit second, fee of 10000 on 30000.
    fn setup() -> (MemOracle, MemLedger, Txid) {
        let mut oracle = MemOracle::default();
        let id = oracle.insert(
            txid(1),
            vec![],
            vec![op_return(&DEPOSITOR), output(30_000, custody_script())],
        );
        let mut ledger = MemLedger::default();
        ledger.set_deposit_fee(30_000, 10_000);
        (oracle, ledger, id)
    }

    fn check(
        oracle: &MemOracle,
        ledger: &MemLedger,
        id: &Txid,
        idx: u32,
    ) -> UtxoValidationResult<DepositConfirmation> {
        check_deposit_confirmation_validity(id, idx, oracle, &custody_hash(), ledger, sats(100))
    }

    /// Address-then-deposit layout credits value minus fee to the address.
    #[test]
    fn test_valid_deposit_address_first() {
        init_test_logging();
        let (oracle, ledger, id) = setup();

        let conf = check(&oracle, &ledger, &id, 1).unwrap();
        assert_eq!(conf.net, sats(20_000));
        assert_eq!(conf.fee, sats(10_000));
        assert_eq!(conf.depositor, EvmAddress::new(DEPOSITOR));
        assert_eq!(conf.outpoint, UtxoPointer::new(id, 1));
        assert_eq!(conf.net.checked_add(conf.fee), Some(conf.value));
    }

    /// Deposit-then-address layout, with the address in hex text.
    #[test]
    fn test_valid_deposit_address_second_hex() {
        let mut oracle = MemOracle::default();
        let hex_addr = b"AA00000000000000000000000000000000000000";
        let id = oracle.insert(
            txid(2),
            vec![],
            vec![output(30_000, custody_script()), op_return(hex_addr)],
        );
        let mut ledger = MemLedger::default();
        ledger.set_deposit_fee(30_000, 10_000);

        let conf = check(&oracle, &ledger, &id, 0).unwrap();
        assert_eq!(conf.depositor, EvmAddress::new(DEPOSITOR));
        assert_eq!(conf.net, sats(20_000));
    }

    /// The address output need not be adjacent to the deposit.
    #[test]
    fn test_valid_deposit_address_not_adjacent() {
        let mut oracle = MemOracle::default();
        let id = oracle.insert(
            txid(3),
            vec![],
            vec![
                output(1_000, user_script(1)),
                output(2_000, user_script(2)),
                output(3_000, user_script(3)),
                output(30_000, custody_script()),
                output(4_000, user_script(4)),
                op_return(&DEPOSITOR),
            ],
        );
        let mut ledger = MemLedger::default();
        ledger.set_deposit_fee(30_000, 10_000);

        let conf = check(&oracle, &ledger, &id, 3).unwrap();
        assert_eq!(conf.depositor, EvmAddress::new(DEPOSITOR));
    }

    /// 9 inputs and 10 outputs, of which the oracle exposes only the first 8 of each.
    #[test]
    fn test_valid_deposit_in_truncated_tx() {
        let mut oracle = MemOracle::default();
        let inputs = (0..9u8).map(|i| input(txid(0x40 + i), 0, 10_000)).collect();
        let mut outputs: Vec<_> = (0..6u8).map(|i| output(1_000, user_script(i))).collect();
        outputs.push(output(30_000, custody_script()));
        outputs.push(op_return(&DEPOSITOR));
        outputs.push(output(1_000, user_script(8)));
        outputs.push(output(1_000, user_script(9)));
        let id = oracle.insert(txid(4), inputs, outputs);
        let mut ledger = MemLedger::default();
        ledger.set_deposit_fee(30_000, 10_000);

        let conf = check(&oracle, &ledger, &id, 6).unwrap();
        assert_eq!(conf.depositor, EvmAddress::new(DEPOSITOR));
        assert_eq!(conf.net, sats(20_000));
        assert_eq!(conf.outpoint, UtxoPointer::new(id, 6));

        // The address is exposed, but the claimed index lies past the exposed prefix.
        let err = check(&oracle, &ledger, &id, 8).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::OutputIndexOutOfRange {
                index: 8,
                ..
            })
        ));
    }

    #[test]
    fn test_fee_matches_ledger_schedule() {
        let mut arb = ArbitraryGenerator::new();
        let schedule = DepositFeeSchedule::default();
        for _ in 0..16 {
            let value: u32 = arb.generate();
            let value = u64::from(value).max(2 * schedule.min_fee_sats.to_sat());

            let mut oracle = MemOracle::default();
            let id = oracle.insert(
                txid(4),
                vec![],
                vec![op_return(&DEPOSITOR), output(value, custody_script())],
            );
            let ledger = MemLedger::with_fee_schedule(schedule);

            let conf = check(&oracle, &ledger, &id, 1).unwrap();
            assert_eq!(conf.fee, schedule.calculate_fee(sats(value)));
            assert_eq!(conf.net.checked_add(conf.fee), Some(sats(value)));
        }
    }

    #[test]
    fn test_already_acknowledged() {
        let (oracle, mut ledger, id) = setup();
        ledger.acknowledge(id);

        let err = check(&oracle, &ledger, &id, 1).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::DepositAlreadyAcknowledged { .. })
        ));
    }

    #[test]
    fn test_index_beyond_exposed_outputs() {
        let (oracle, ledger, id) = setup();
        let err = check(&oracle, &ledger, &id, 8).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::OutputIndexOutOfRange {
                index: 8,
                ..
            })
        ));
    }

    #[test]
    fn test_not_enough_outputs() {
        let (oracle, ledger, id) = setup();
        let err = check(&oracle, &ledger, &id, 2).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::MissingOutput {
                index: 2,
                total: 2
            })
        ));
    }

    #[test]
    fn test_unknown_tx() {
        let (oracle, ledger, _) = setup();
        let err = check(&oracle, &ledger, &txid(99), 0).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::TxNotFound { .. })
        ));
    }

    #[test]
    fn test_no_depositor() {
        let mut oracle = MemOracle::default();
        // 19-byte payload is not an address.
        let id = oracle.insert(
            txid(5),
            vec![],
            vec![op_return(&DEPOSITOR[..19]), output(30_000, custody_script())],
        );
        let ledger = MemLedger::default();

        let err = check(&oracle, &ledger, &id, 1).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::DepositorNotFound { .. })
        ));
    }

    /// A claim pointing at the OP_RETURN itself cannot use it as the depositor.
    #[test]
    fn test_claimed_output_not_its_own_depositor() {
        let (oracle, ledger, id) = setup();
        let err = check(&oracle, &ledger, &id, 0).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::DepositorNotFound { .. })
        ));
    }

    #[test]
    fn test_wrong_custody_script() {
        let mut oracle = MemOracle::default();
        let id = oracle.insert(
            txid(6),
            vec![],
            vec![op_return(&DEPOSITOR), output(30_000, user_script(9))],
        );
        let ledger = MemLedger::default();

        let err = check(&oracle, &ledger, &id, 1).unwrap_err();
        let UtxoValidationError::EconomicMismatch(EconomicMismatchError::ScriptHash { index, mismatch }) =
            err
        else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(index, 1);
        assert_eq!(mismatch.expected, custody_hash());
    }

    #[test]
    fn test_below_minimum() {
        let (oracle, ledger, id) = setup();
        let err = check_deposit_confirmation_validity(
            &id,
            1,
            &oracle,
            &custody_hash(),
            &ledger,
            sats(30_001),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::EconomicMismatch(EconomicMismatchError::DepositBelowMinimum { .. })
        ));
    }

    #[test]
    fn test_fee_consumes_deposit() {
        let (oracle, mut ledger, id) = setup();
        ledger.set_deposit_fee(30_000, 30_000);
        let err = check(&oracle, &ledger, &id, 1).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::EconomicMismatch(EconomicMismatchError::DepositFeeTooHigh { .. })
        ));

        ledger.set_deposit_fee(30_000, 30_001);
        assert!(check(&oracle, &ledger, &id, 1).is_err());
    }

    /// Acknowledgment is checked before anything is fetched.
    #[test]
    fn test_acknowledged_checked_first() {
        let (oracle, mut ledger, _) = setup();
        ledger.acknowledge(txid(99));
        let err = check(&oracle, &ledger, &txid(99), 12).unwrap_err();
        assert!(matches!(
            err,
            UtxoValidationError::MalformedClaim(MalformedClaimError::DepositAlreadyAcknowledged { .. })
        ));
        assert_eq!(oracle.lookups(), 0);
    }
}
