//! Read-only ledger records the validators consult.

use std::io::{self, Read, Write};

use arbitrary::{Arbitrary, Unstructured};
use bitcoin::ScriptBuf;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{amount::BitcoinAmount, buf::EvmAddress};

/// A withdrawal requested on the EVM side, awaiting fulfillment on Bitcoin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub counter: u64,

    /// Gross amount debited from the user, protocol fee included.
    pub amount: BitcoinAmount,

    /// Protocol fee retained from `amount`, out of which the Bitcoin network fee is paid.
    pub fee: BitcoinAmount,

    pub timestamp_requested: u64,

    /// Script the user is to be paid to.
    pub destination_script: ScriptBuf,

    pub evm_originator: EvmAddress,
}

impl WithdrawalRecord {
    /// Value the user must receive on Bitcoin, `None` if the fee exceeds the amount.
    pub fn payout(&self) -> Option<BitcoinAmount> {
        self.amount.checked_sub(self.fee)
    }
}

impl BorshSerialize for WithdrawalRecord {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        BorshSerialize::serialize(&self.counter, writer)?;
        BorshSerialize::serialize(&self.amount, writer)?;
        BorshSerialize::serialize(&self.fee, writer)?;
        BorshSerialize::serialize(&self.timestamp_requested, writer)?;
        BorshSerialize::serialize(self.destination_script.as_bytes(), writer)?;
        BorshSerialize::serialize(&self.evm_originator, writer)
    }
}

impl BorshDeserialize for WithdrawalRecord {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let counter = u64::deserialize_reader(reader)?;
        let amount = BitcoinAmount::deserialize_reader(reader)?;
        let fee = BitcoinAmount::deserialize_reader(reader)?;
        let timestamp_requested = u64::deserialize_reader(reader)?;
        let destination_script = ScriptBuf::from(Vec::<u8>::deserialize_reader(reader)?);
        let evm_originator = EvmAddress::deserialize_reader(reader)?;

        Ok(Self {
            counter,
            amount,
            fee,
            timestamp_requested,
            destination_script,
            evm_originator,
        })
    }
}

impl<'a> Arbitrary<'a> for WithdrawalRecord {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let amount = u.int_in_range(1_000..=2_100_000_000_000_000u64)?;
        let fee = u.int_in_range(0..=amount)?;
        // P2WPKH-sized destination.
        let mut program = [0u8; 22];
        u.fill_buffer(&mut program)?;
        program[0] = 0x00;
        program[1] = 0x14;

        Ok(Self {
            counter: u64::arbitrary(u)?,
            amount: BitcoinAmount::from_sat(amount),
            fee: BitcoinAmount::from_sat(fee),
            timestamp_requested: u64::arbitrary(u)?,
            destination_script: ScriptBuf::from(program.to_vec()),
            evm_originator: EvmAddress::arbitrary(u)?,
        })
    }
}

/// Ledger view of a deposit that was confirmed on the EVM side.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct ConfirmedDepositRecord {
    /// Protocol fee still to be collected by a sweep. Zero once swept.
    pub collectable_fee: BitcoinAmount,

    /// Output index of the deposit within its transaction.
    pub output_index: u32,
}

impl ConfirmedDepositRecord {
    /// Whether the deposit is confirmed but not yet consolidated into custody.
    pub fn is_unswept(&self) -> bool {
        !self.collectable_fee.is_zero()
    }
}
