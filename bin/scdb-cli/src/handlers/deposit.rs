use anyhow::{bail, Context, Result};
use bitcoin::{consensus, ScriptBuf, Transaction};
use scdb_primitives::scripts::deposit::{find_deposits, recognize_deposit};
use tracing::info;

use crate::{cli::DepositArgs, params};

pub(crate) fn handle_deposit(args: DepositArgs) -> Result<()> {
    let DepositArgs { script, tx, params } = args;
    let params = params::load(&params)?;
    let flag = &params.deposit_flag;

    match (script, tx) {
        (Some(script), _) => {
            let bytes = hex::decode(script.trim()).context("script must be hex")?;
            let script = ScriptBuf::from_bytes(bytes);

            match recognize_deposit(&script, flag) {
                Some(deposit) => {
                    info!(sidechain = %deposit.sidechain, layout = ?deposit.layout, "recognized deposit");
                    println!("{}", serde_json::to_string_pretty(&deposit)?);
                }
                None => bail!("script is not a sidechain deposit"),
            }
        }
        (None, Some(tx)) => {
            let bytes = hex::decode(tx.trim()).context("transaction must be hex")?;
            let tx: Transaction = consensus::deserialize(&bytes).context("invalid transaction")?;
            let deposits = find_deposits(&tx, flag);

            info!(txid = %tx.compute_txid(), count = deposits.len(), "scanned transaction");
            println!("{}", serde_json::to_string_pretty(&deposits)?);
        }
        (None, None) => bail!("either --script or --tx is required"),
    }

    Ok(())
}
