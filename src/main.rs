//! zBTC Reserve CLI
//!
//! Derives reserve addresses and builds unsigned deposit transactions.
//!
//! Usage:
//!   zbtc-reserve address --user-key <hex> [--asset-owner <hex>]
//!   zbtc-reserve max-spendable --utxos utxos.json
//!   zbtc-reserve deposit --utxos utxos.json --reserve <addr> --amount <sats> --user-key <hex>
//!
//! Defaults come from `ZBTC_*` environment variables (a `.env` file is loaded).

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use zbtc_reserve::common::{self, ReserveConfig, ReserveError};
use zbtc_reserve::deposit::{DepositTxBuilder, Utxo};
use zbtc_reserve::taproot::{
    derive_entity_reserve_address, derive_hot_reserve_address, parse_x_only_key_hex,
};
use zbtc_reserve::units;

#[derive(Parser)]
#[command(name = "zbtc-reserve")]
#[command(about = "Derive zBTC reserve addresses and build deposit transactions")]
struct Cli {
    /// Network: mainnet, testnet, signet or regtest (overrides ZBTC_NETWORK)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Fee rate in sat/vbyte (overrides ZBTC_FEE_RATE)
    #[arg(short, long, global = true)]
    fee_rate: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive a hot or entity-derived reserve address
    Address {
        /// User's public key (32 or 33 bytes hex) for the CSV recovery leaf
        #[arg(short, long)]
        user_key: String,

        /// Operator internal key (hex); falls back to ZBTC_OPERATOR_KEY
        #[arg(short, long)]
        operator_key: Option<String>,

        /// Asset owner (32 bytes hex); derives an entity reserve when set
        #[arg(short, long)]
        asset_owner: Option<String>,

        /// CSV lock value (overrides ZBTC_LOCK_TIME)
        #[arg(short, long)]
        lock_time: Option<i64>,
    },

    /// Print the amount a full sweep of the UTXO set can deposit
    MaxSpendable {
        /// JSON file with `[{"txid", "vout", "value_sats"}]`
        #[arg(long)]
        utxos: PathBuf,
    },

    /// Build an unsigned deposit transaction
    Deposit {
        /// JSON file with `[{"txid", "vout", "value_sats"}]`
        #[arg(long)]
        utxos: PathBuf,

        /// Reserve address receiving the deposit
        #[arg(short, long)]
        reserve: String,

        /// Amount in sats
        #[arg(short, long)]
        amount: String,

        /// Spender's public key; the UTXOs and change use its key-path address
        #[arg(short, long)]
        user_key: String,
    },
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.error_code(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ReserveError> {
    let mut config = ReserveConfig::from_env()?;
    if let Some(network) = &cli.network {
        config.network = network.parse()?;
    }
    if let Some(rate) = cli.fee_rate {
        config.fee_rate = rate;
    }
    common::init_from_config(&config)?;

    let network = config.network.bitcoin_network();

    match cli.command {
        Command::Address {
            user_key,
            operator_key,
            asset_owner,
            lock_time,
        } => {
            let operator_hex = match operator_key {
                Some(key) => key,
                None => config.require_operator_key()?.to_string(),
            };
            let operator = parse_x_only_key_hex(&operator_hex)?;
            let user = parse_x_only_key_hex(&user_key)?;
            let lock_time = lock_time.unwrap_or(config.lock_time);

            let reserve = match asset_owner {
                Some(owner_hex) => {
                    let owner = parse_asset_owner(&owner_hex)?;
                    derive_entity_reserve_address(&owner, &operator, &user, lock_time, network)?
                }
                None => derive_hot_reserve_address(&operator, &user, lock_time, network)?,
            };

            let info = reserve.to_info();
            common::log_address_event(&info.address, &info.network, info.leaves.len());
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::MaxSpendable { utxos } => {
            let utxos = load_utxos(&utxos)?;
            let builder = DepositTxBuilder::new(network, config.fee_rate)?;
            let max = builder.max_spendable(&utxos);

            println!("{}", serde_json::json!({
                "max_spendable_sats": max.to_sat(),
                "display": units::sats_to_display(max),
                "fee_rate": config.fee_rate,
                "utxos": utxos.len(),
            }));
        }
        Command::Deposit {
            utxos,
            reserve,
            amount,
            user_key,
        } => {
            let utxos = load_utxos(&utxos)?;
            let amount = units::parse_sats(&amount)
                .ok_or_else(|| ReserveError::validation(format!("invalid amount: {}", amount)))?;
            let user = parse_x_only_key_hex(&user_key)?;

            let builder = DepositTxBuilder::new(network, config.fee_rate)?;
            match builder.build(&utxos, &reserve, amount, &user) {
                Ok(deposit) => {
                    common::log_deposit_event(
                        amount.to_sat(),
                        config.fee_rate,
                        deposit.consumed_utxos.len(),
                        Some(deposit.change_amount.to_sat()),
                        None,
                    );
                    println!("{}", serde_json::to_string_pretty(&deposit.to_summary(amount))?);
                }
                Err(e) => {
                    let err = ReserveError::from(e);
                    let message = err.to_string();
                    common::log_deposit_event(
                        amount.to_sat(),
                        config.fee_rate,
                        0,
                        None,
                        Some((err.error_code(), message.as_str())),
                    );
                    return Err(err);
                }
            }
        }
    }

    Ok(())
}

fn load_utxos(path: &Path) -> Result<Vec<Utxo>, ReserveError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn parse_asset_owner(hex_str: &str) -> Result<[u8; 32], ReserveError> {
    let bytes = hex::decode(hex_str.trim())
        .map_err(|e| ReserveError::validation(format!("asset owner: {}", e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        ReserveError::validation(format!("asset owner must be 32 bytes, got {}", bytes.len()))
    })
}
