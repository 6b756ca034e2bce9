use anyhow::Context;

/// 等待退出信号
///
/// Resolves on Ctrl+C (SIGINT) or SIGTERM and returns the signal name.
#[cfg(unix)]
pub async fn shutdown_signal() -> anyhow::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate =
        signal(SignalKind::terminate()).with_context(|| "install SIGTERM handler failed")?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.with_context(|| "listen for Ctrl+C failed")?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() -> anyhow::Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .with_context(|| "listen for Ctrl+C failed")?;
    Ok("Ctrl+C")
}
