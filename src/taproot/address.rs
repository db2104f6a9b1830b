//! Reserve Address Derivation
//!
//! Tweaks an internal key by the Merkle root of a one- or two-leaf script tree
//! and encodes the witness v1 program for the target network.
//!
//! ## Leaf order
//!
//! Leaves are kept in argument order: `leaf_a` is leaf 0 and `leaf_b` is
//! leaf 1 in [`TaprootAddress::leaves`]. The Merkle root follows BIP-341, so
//! the two leaf hashes are combined as a `TapBranch` of the lexicographically
//! smaller hash first. That is the only root a script-path spend can prove
//! against on-chain.
//!
//! ## Spending Paths
//! - **Key path**: the internal key (the operator) spends immediately
//! - **Script path**: the CSV leaf lets the user recover after the timelock

use bitcoin::hashes::Hash;
use bitcoin::key::{TweakedPublicKey, UntweakedPublicKey};
use bitcoin::secp256k1::Parity;
use bitcoin::taproot::{
    ControlBlock, LeafVersion, TapLeafHash, TapNodeHash, TapTweakHash, TaprootMerkleBranch,
};
use bitcoin::{Address, Network, ScriptBuf, XOnlyPublicKey};
use secp256k1::SECP256K1;
use serde::{Deserialize, Serialize};

use super::leaf::{build_commitment_leaf, build_relative_timelock_leaf};
use super::TaprootError;

/// Script tree committed to by a reserve address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptTree {
    /// One leaf at depth 0
    Single(ScriptBuf),
    /// Two leaves at depth 1, in canonical (argument) order
    Pair(ScriptBuf, ScriptBuf),
}

impl ScriptTree {
    /// Leaves in canonical order.
    pub fn leaves(&self) -> Vec<&ScriptBuf> {
        match self {
            ScriptTree::Single(leaf) => vec![leaf],
            ScriptTree::Pair(a, b) => vec![a, b],
        }
    }
}

/// A tapscript leaf together with what a script-path spend will need.
#[derive(Clone, Debug)]
pub struct TapLeafInfo {
    pub script: ScriptBuf,
    pub leaf_hash: TapLeafHash,
    pub control_block: ControlBlock,
}

/// A derived Taproot reserve address.
#[derive(Clone, Debug)]
pub struct TaprootAddress {
    pub address: Address,
    /// `OP_1 <output_key>`
    pub output_script: ScriptBuf,
    pub tweak_hash: TapTweakHash,
    pub output_key: XOnlyPublicKey,
    pub output_key_parity: Parity,
    pub internal_key: XOnlyPublicKey,
    /// `None` for key-path-only addresses
    pub merkle_root: Option<TapNodeHash>,
    /// Leaves in canonical order, empty for key-path-only addresses
    pub leaves: Vec<TapLeafInfo>,
    pub network: Network,
}

/// Serializable view of a [`TaprootAddress`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaprootAddressInfo {
    /// The Taproot address (bc1p... / tb1p... / bcrt1p...)
    pub address: String,
    /// Output script (hex)
    pub output_script: String,
    /// Tap tweak hash (hex)
    pub tweak_hash: String,
    /// Tweaked output key (x-only, hex)
    pub output_key: String,
    /// Untweaked internal key (x-only, hex)
    pub internal_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<String>,
    pub leaves: Vec<TapLeafView>,
    pub network: String,
}

/// Serializable leaf data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapLeafView {
    pub script: String,
    pub script_asm: String,
    pub leaf_hash: String,
    pub control_block: String,
}

impl TaprootAddress {
    /// Tweaked key in the form the address encodes.
    pub fn tweaked_key(&self) -> TweakedPublicKey {
        TweakedPublicKey::dangerous_assume_tweaked(self.output_key)
    }

    /// Control block for spending `script` through the script path.
    pub fn control_block(&self, script: &ScriptBuf) -> Option<&ControlBlock> {
        self.leaves
            .iter()
            .find(|leaf| &leaf.script == script)
            .map(|leaf| &leaf.control_block)
    }

    pub fn to_info(&self) -> TaprootAddressInfo {
        TaprootAddressInfo {
            address: self.address.to_string(),
            output_script: hex::encode(self.output_script.as_bytes()),
            tweak_hash: hex::encode(self.tweak_hash.to_byte_array()),
            output_key: hex::encode(self.output_key.serialize()),
            internal_key: hex::encode(self.internal_key.serialize()),
            merkle_root: self.merkle_root.map(|root| hex::encode(root.to_byte_array())),
            leaves: self
                .leaves
                .iter()
                .map(|leaf| TapLeafView {
                    script: hex::encode(leaf.script.as_bytes()),
                    script_asm: leaf.script.to_asm_string(),
                    leaf_hash: hex::encode(leaf.leaf_hash.to_byte_array()),
                    control_block: hex::encode(leaf.control_block.serialize()),
                })
                .collect(),
            network: self.network.to_string(),
        }
    }
}

/// Derive the address for a one-leaf tree.
pub fn derive_single_leaf_address(
    internal_key: &XOnlyPublicKey,
    leaf: ScriptBuf,
    network: Network,
) -> Result<TaprootAddress, TaprootError> {
    let leaf_hash = TapLeafHash::from_script(&leaf, LeafVersion::TapScript);
    let merkle_root = TapNodeHash::from(leaf_hash);

    let tweaked = tweak_internal_key(internal_key, Some(merkle_root))?;
    let control_block = control_block_for(internal_key, tweaked.parity, Vec::new())?;

    Ok(tweaked.into_address(
        *internal_key,
        Some(merkle_root),
        vec![TapLeafInfo {
            script: leaf,
            leaf_hash,
            control_block,
        }],
        network,
    ))
}

/// Derive the address for a two-leaf tree.
///
/// `leaf_a` and `leaf_b` keep their positions in the returned leaf list; each
/// one's control block carries the other's hash as its Merkle branch.
pub fn derive_two_leaf_address(
    internal_key: &XOnlyPublicKey,
    leaf_a: ScriptBuf,
    leaf_b: ScriptBuf,
    network: Network,
) -> Result<TaprootAddress, TaprootError> {
    let hash_a = TapLeafHash::from_script(&leaf_a, LeafVersion::TapScript);
    let hash_b = TapLeafHash::from_script(&leaf_b, LeafVersion::TapScript);
    let node_a = TapNodeHash::from(hash_a);
    let node_b = TapNodeHash::from(hash_b);
    let merkle_root = TapNodeHash::from_node_hashes(node_a, node_b);

    let tweaked = tweak_internal_key(internal_key, Some(merkle_root))?;
    let control_a = control_block_for(internal_key, tweaked.parity, vec![node_b])?;
    let control_b = control_block_for(internal_key, tweaked.parity, vec![node_a])?;

    Ok(tweaked.into_address(
        *internal_key,
        Some(merkle_root),
        vec![
            TapLeafInfo {
                script: leaf_a,
                leaf_hash: hash_a,
                control_block: control_a,
            },
            TapLeafInfo {
                script: leaf_b,
                leaf_hash: hash_b,
                control_block: control_b,
            },
        ],
        network,
    ))
}

/// Derive the address for either tree shape.
pub fn derive_address(
    internal_key: &XOnlyPublicKey,
    tree: &ScriptTree,
    network: Network,
) -> Result<TaprootAddress, TaprootError> {
    match tree {
        ScriptTree::Single(leaf) => derive_single_leaf_address(internal_key, leaf.clone(), network),
        ScriptTree::Pair(a, b) => derive_two_leaf_address(internal_key, a.clone(), b.clone(), network),
    }
}

/// Key-path-only address (no script tree), as used for change.
pub fn derive_key_path_address(
    internal_key: &XOnlyPublicKey,
    network: Network,
) -> Result<TaprootAddress, TaprootError> {
    let tweaked = tweak_internal_key(internal_key, None)?;
    Ok(tweaked.into_address(*internal_key, None, Vec::new(), network))
}

/// Hot reserve: operator key path plus the user's CSV recovery leaf.
pub fn derive_hot_reserve_address(
    operator_key: &XOnlyPublicKey,
    user_key: &XOnlyPublicKey,
    lock_time: i64,
    network: Network,
) -> Result<TaprootAddress, TaprootError> {
    let csv_leaf = build_relative_timelock_leaf(lock_time, user_key)?;
    derive_single_leaf_address(operator_key, csv_leaf, network)
}

/// Entity-derived reserve: `[OP_RETURN <asset_owner>, CSV leaf]` under the
/// operator key, so every asset owner gets a distinct address.
pub fn derive_entity_reserve_address(
    asset_owner: &[u8; 32],
    operator_key: &XOnlyPublicKey,
    user_key: &XOnlyPublicKey,
    lock_time: i64,
    network: Network,
) -> Result<TaprootAddress, TaprootError> {
    let owner_leaf = build_commitment_leaf(asset_owner)?;
    let csv_leaf = build_relative_timelock_leaf(lock_time, user_key)?;
    derive_two_leaf_address(operator_key, owner_leaf, csv_leaf, network)
}

/// Output of the tap tweak before it is wrapped into an address.
struct Tweaked {
    tweak_hash: TapTweakHash,
    output_key: XOnlyPublicKey,
    parity: Parity,
}

impl Tweaked {
    fn into_address(
        self,
        internal_key: XOnlyPublicKey,
        merkle_root: Option<TapNodeHash>,
        leaves: Vec<TapLeafInfo>,
        network: Network,
    ) -> TaprootAddress {
        let tweaked_key = TweakedPublicKey::dangerous_assume_tweaked(self.output_key);

        TaprootAddress {
            address: Address::p2tr_tweaked(tweaked_key, network),
            output_script: ScriptBuf::new_p2tr_tweaked(tweaked_key),
            tweak_hash: self.tweak_hash,
            output_key: self.output_key,
            output_key_parity: self.parity,
            internal_key,
            merkle_root,
            leaves,
            network,
        }
    }
}

/// Q = P + H_taptweak(P || merkle_root)·G
///
/// Errors instead of panicking when the tweak is out of range or the sum is
/// the point at infinity.
fn tweak_internal_key(
    internal_key: &UntweakedPublicKey,
    merkle_root: Option<TapNodeHash>,
) -> Result<Tweaked, TaprootError> {
    let tweak_hash = TapTweakHash::from_key_and_tweak(*internal_key, merkle_root);
    let scalar = tweak_hash.to_scalar();

    let (output_key, parity) = internal_key
        .add_tweak(SECP256K1, &scalar)
        .map_err(|e| TaprootError::AddressDerivationFailed(e.to_string()))?;

    Ok(Tweaked {
        tweak_hash,
        output_key,
        parity,
    })
}

fn control_block_for(
    internal_key: &XOnlyPublicKey,
    parity: Parity,
    branch: Vec<TapNodeHash>,
) -> Result<ControlBlock, TaprootError> {
    let merkle_branch = TaprootMerkleBranch::try_from(branch)
        .map_err(|e| TaprootError::AddressDerivationFailed(e.to_string()))?;

    Ok(ControlBlock {
        leaf_version: LeafVersion::TapScript,
        output_key_parity: parity,
        internal_key: *internal_key,
        merkle_branch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::taproot::TaprootBuilder;
    use secp256k1::{Keypair, SecretKey};

    fn key(seed: u8) -> XOnlyPublicKey {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        Keypair::from_secret_key(SECP256K1, &sk).x_only_public_key().0
    }

    #[test]
    fn test_hot_reserve_address_prefix() {
        let reserve = derive_hot_reserve_address(&key(1), &key(2), 144, Network::Testnet).unwrap();
        assert!(reserve.address.to_string().starts_with("tb1p"));

        let reserve = derive_hot_reserve_address(&key(1), &key(2), 144, Network::Bitcoin).unwrap();
        assert!(reserve.address.to_string().starts_with("bc1p"));

        let reserve = derive_hot_reserve_address(&key(1), &key(2), 144, Network::Regtest).unwrap();
        assert!(reserve.address.to_string().starts_with("bcrt1p"));
    }

    #[test]
    fn test_single_leaf_matches_taproot_builder() {
        let internal = key(1);
        let leaf = build_relative_timelock_leaf(144, &key(2)).unwrap();

        let ours = derive_single_leaf_address(&internal, leaf.clone(), Network::Bitcoin).unwrap();
        let reference = TaprootBuilder::new()
            .add_leaf(0, leaf)
            .unwrap()
            .finalize(SECP256K1, internal)
            .unwrap();

        assert_eq!(ours.output_key, reference.output_key().to_inner());
        assert_eq!(ours.output_key_parity, reference.output_key_parity());
        assert_eq!(ours.merkle_root, reference.merkle_root());
    }

    #[test]
    fn test_two_leaf_matches_taproot_builder() {
        let internal = key(1);
        let owner_leaf = build_commitment_leaf(&[0x42; 32]).unwrap();
        let csv_leaf = build_relative_timelock_leaf(6, &key(2)).unwrap();

        let ours = derive_two_leaf_address(
            &internal,
            owner_leaf.clone(),
            csv_leaf.clone(),
            Network::Testnet,
        )
        .unwrap();
        let reference = TaprootBuilder::new()
            .add_leaf(1, owner_leaf.clone())
            .unwrap()
            .add_leaf(1, csv_leaf.clone())
            .unwrap()
            .finalize(SECP256K1, internal)
            .unwrap();

        assert_eq!(ours.output_key, reference.output_key().to_inner());
        assert_eq!(ours.merkle_root, reference.merkle_root());

        let reference_cb = reference
            .control_block(&(csv_leaf.clone(), LeafVersion::TapScript))
            .unwrap();
        assert_eq!(ours.control_block(&csv_leaf).unwrap(), &reference_cb);
    }

    #[test]
    fn test_control_blocks_commit_to_output_key() {
        let reserve = derive_entity_reserve_address(
            &[7u8; 32],
            &key(3),
            &key(4),
            144,
            Network::Regtest,
        )
        .unwrap();

        assert_eq!(reserve.leaves.len(), 2);
        for leaf in &reserve.leaves {
            assert!(leaf
                .control_block
                .verify_taproot_commitment(SECP256K1, reserve.output_key, &leaf.script));
        }
    }

    #[test]
    fn test_canonical_leaf_positions() {
        let reserve =
            derive_entity_reserve_address(&[9u8; 32], &key(3), &key(4), 10, Network::Testnet)
                .unwrap();

        assert!(reserve.leaves[0].script.is_op_return());
        assert!(!reserve.leaves[1].script.is_op_return());
    }

    #[test]
    fn test_key_path_address_has_no_tree() {
        let change = derive_key_path_address(&key(5), Network::Testnet).unwrap();
        assert!(change.merkle_root.is_none());
        assert!(change.leaves.is_empty());

        let reference = Address::p2tr(SECP256K1, key(5), None, Network::Testnet);
        assert_eq!(change.address, reference);
    }

    #[test]
    fn test_output_script_is_witness_v1() {
        let reserve = derive_hot_reserve_address(&key(1), &key(2), 6, Network::Testnet).unwrap();
        assert!(reserve.output_script.is_p2tr());
        assert_eq!(reserve.output_script, reserve.address.script_pubkey());
        assert_eq!(&reserve.output_script.as_bytes()[2..], &reserve.output_key.serialize());
    }

    #[test]
    fn test_distinct_owners_distinct_addresses() {
        let a = derive_entity_reserve_address(&[1u8; 32], &key(1), &key(2), 6, Network::Testnet)
            .unwrap();
        let b = derive_entity_reserve_address(&[2u8; 32], &key(1), &key(2), 6, Network::Testnet)
            .unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_info_serialization() {
        let reserve = derive_hot_reserve_address(&key(1), &key(2), 144, Network::Testnet).unwrap();
        let info = reserve.to_info();

        assert_eq!(info.address, reserve.address.to_string());
        assert_eq!(info.output_key.len(), 64);
        assert_eq!(info.leaves.len(), 1);
        assert!(info.leaves[0].script_asm.contains("OP_CSV"));

        let json = serde_json::to_string(&info).unwrap();
        let back: TaprootAddressInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
