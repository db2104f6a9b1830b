//! Reserve Policy Leaves
//!
//! Builds the tapscript leaves committed to by reserve addresses:
//!
//! - **CSV leaf**: `<lock> OP_CHECKSEQUENCEVERIFY OP_DROP <user_pubkey> OP_CHECKSIG`,
//!   the user's recovery path once the relative timelock has matured.
//! - **Commitment leaf**: `OP_RETURN <payload>`, an unspendable leaf that binds
//!   an application identity (e.g. the asset owner) into the address.

use bitcoin::opcodes::all::*;
use bitcoin::script::{Builder as ScriptBuilder, PushBytesBuf};
use bitcoin::{ScriptBuf, XOnlyPublicKey};

use super::TaprootError;

/// BIP-68 relative lock value field.
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000_ffff;

/// BIP-68 flag selecting 512-second units instead of blocks.
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;

/// Largest payload accepted in a commitment leaf (standard data-carrier limit).
pub const MAX_COMMITMENT_PAYLOAD: usize = 80;

/// Build the user recovery leaf guarded by a relative timelock.
///
/// The lock value is pushed with Bitcoin's minimal script-number encoding, so
/// `0` becomes `OP_0`, `1..=16` become `OP_1..OP_16` and anything larger is a
/// little-endian sign-magnitude push (144 → `02 90 00`).
///
/// # Errors
///
/// [`TaprootError::InvalidLockValue`] if `lock_value` is negative or sets bits
/// outside the BIP-68 value field and type flag.
pub fn build_relative_timelock_leaf(
    lock_value: i64,
    spender: &XOnlyPublicKey,
) -> Result<ScriptBuf, TaprootError> {
    validate_lock_value(lock_value)?;

    Ok(ScriptBuilder::new()
        .push_int(lock_value)
        .push_opcode(OP_CSV)
        .push_opcode(OP_DROP)
        .push_x_only_key(spender)
        .push_opcode(OP_CHECKSIG)
        .into_script())
}

/// Build an `OP_RETURN <payload>` leaf.
///
/// # Errors
///
/// [`TaprootError::PayloadTooLarge`] above [`MAX_COMMITMENT_PAYLOAD`] bytes.
pub fn build_commitment_leaf(payload: &[u8]) -> Result<ScriptBuf, TaprootError> {
    if payload.len() > MAX_COMMITMENT_PAYLOAD {
        return Err(TaprootError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_COMMITMENT_PAYLOAD,
        });
    }

    let push = PushBytesBuf::try_from(payload.to_vec()).map_err(|_| {
        TaprootError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_COMMITMENT_PAYLOAD,
        }
    })?;

    Ok(ScriptBuilder::new()
        .push_opcode(OP_RETURN)
        .push_slice(push)
        .into_script())
}

fn validate_lock_value(lock_value: i64) -> Result<(), TaprootError> {
    let value = u32::try_from(lock_value).map_err(|_| TaprootError::InvalidLockValue(lock_value))?;

    if value & !(SEQUENCE_LOCKTIME_MASK | SEQUENCE_LOCKTIME_TYPE_FLAG) != 0 {
        return Err(TaprootError::InvalidLockValue(lock_value));
    }

    Ok(())
}
