//! Cancellation plumbing: OS signals mapped onto a depth-1 channel.

use anyhow::{Context, Result};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tracing::debug;

/// Přijímací strana přerušení. Vlastní ji controller a předává ji
/// jednotlivým fázím jako `&mut`.
pub struct Interrupt {
    rx: mpsc::Receiver<()>,
}

/// Odesílací strana; klonovatelná, typicky ji drží signal listener.
#[derive(Clone)]
pub struct InterruptHandle {
    tx: mpsc::Sender<()>,
}

pub fn channel() -> (InterruptHandle, Interrupt) {
    // kapacita 1: další přerušení, dokud první nikdo nepřevzal, se zahodí
    let (tx, rx) = mpsc::channel(1);
    (InterruptHandle { tx }, Interrupt { rx })
}

impl Interrupt {
    /// Počká na další přerušení. Pokud všechny handly zmizely, nikdy se
    /// nevrátí (nemá kdo přerušit).
    pub async fn recv(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

impl InterruptHandle {
    /// Vrací `false`, pokud už jedno přerušení čeká ve frontě.
    pub fn trigger(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Nainstaluje handlery na SIGINT a SIGTERM a spustí task, který každý
/// signál přepošle do `handle`.
pub fn spawn_signal_listener(handle: InterruptHandle) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).context("install SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("install SIGTERM handler")?;

    tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = sigint.recv() => "SIGINT",
                Some(()) = sigterm.recv() => "SIGTERM",
                else => break,
            };
            if !handle.trigger() {
                debug!(signal = name, "interrupt already pending, dropping signal");
            } else {
                debug!(signal = name, "received signal");
            }
        }
    });

    Ok(())
}
