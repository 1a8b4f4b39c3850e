//! rain-peer: answers the station's remote-inference requests.
//!
//! Wire the station's serial port to stdin/stdout, e.g.
//! `socat /dev/ttyUSB0,b115200,raw,echo=0 EXEC:rain-peer`.
//!
//! Environment (a `.env` file is honoured):
//! - `RAIN_PEER_MODEL`  path to a trainer parameter file (default: built-in)
//! - `RAIN_PEER_POLICY` `rain` (default) or `irrigate`
//! - `RUST_LOG`         log filter, logs go to stderr

use std::env;
use std::fs;
use std::io;

use anyhow::{Context, Result, anyhow};
use log::info;

use rainwatch::model::ModelParameters;
use rainwatch::peer::{Peer, Policy};
use rainwatch::weather::FALLBACK;

fn load_params() -> Result<ModelParameters> {
    match env::var("RAIN_PEER_MODEL") {
        Ok(path) => {
            let bytes = fs::read(&path).with_context(|| format!("reading model file {path}"))?;
            let params = ModelParameters::from_json(&bytes)
                .map_err(|e| anyhow!("model file {path}: {e}"))?;
            info!("loaded model parameters from {}", path);
            Ok(params)
        }
        Err(_) => {
            info!("using built-in model parameters");
            Ok(ModelParameters::trained())
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .target(env_logger::Target::Stderr)
        .init();

    let policy = match env::var("RAIN_PEER_POLICY") {
        Ok(s) => s.parse::<Policy>().map_err(|e| anyhow!(e))?,
        Err(_) => Policy::default(),
    };
    let params = load_params()?;
    params
        .validate()
        .map_err(|e| anyhow!("model parameters invalid: {e}"))?;

    info!("rain-peer v{} ready (policy={:?})", env!("CARGO_PKG_VERSION"), policy);
    let peer = Peer::new(params, FALLBACK, policy);
    let answered = peer.serve(io::stdin().lock(), io::stdout().lock())?;
    info!("input closed after {} decisions", answered);
    Ok(())
}
