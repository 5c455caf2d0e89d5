use anyhow::Result;
use tracing::info;

use crate::{cli::ParamsArgs, params};

pub(crate) fn handle_params(args: ParamsArgs) -> Result<()> {
    let params = params::load(&args.params)?;

    info!(sidechains = params.sidechains.len(), "params are valid");
    print!("{}", toml::to_string_pretty(&params)?);

    Ok(())
}
