use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use ureadable::{AppState, config::Config};

const USAGE: &str = "usage: ureadable [--summary] <url>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut with_summary = false;
    let mut url = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--summary" => with_summary = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ if url.is_none() => url = Some(arg),
            _ => bail!("unexpected argument {arg:?}\n{USAGE}"),
        }
    }
    let Some(url) = url else {
        bail!(USAGE);
    };

    let config = Config::from_env()?;
    let state = AppState::from_config(&config, None, None)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let article = if with_summary {
        state.extract_with_summary(&cancel, &url).await
    } else {
        state.extract(&cancel, &url).await
    }
    .with_context(|| format!("failed to extract {url}"))?;

    println!("{}", serde_json::to_string_pretty(&article)?);
    Ok(())
}
