//! Phase controller: Wait -> Allocate (instant or gradual) -> Hold.

use std::hint::black_box;

use tracing::{debug, info, warn};

use crate::{
    alloc::{self, MemoryBlock},
    cgroup,
    config::Config,
    debug_error_display,
    gradual::{self, GrowOutcome},
    interrupt::Interrupt,
    procfs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Waiting,
    Allocating,
    Holding,
    Interrupted,
    Exited,
}

/// Jak běh skončil. Všechny varianty jsou čisté ukončení (exit 0).
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Přerušeno během čekání, nic se nealokovalo.
    InterruptedWaiting,
    /// Přerušeno během postupného růstu.
    InterruptedGrowing { allocated_mb: usize, total_mb: usize },
    /// Cílová velikost byla držena a po přerušení uvolněna.
    Released { size_mb: u64 },
}

pub struct Controller {
    cfg: Config,
    interrupt: Interrupt,
    phase: Phase,
}

impl Controller {
    pub fn new(cfg: Config, interrupt: Interrupt) -> Self {
        Self {
            cfg,
            interrupt,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, next: Phase) {
        debug!(from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
    }

    pub async fn run(&mut self) -> RunOutcome {
        if !self.cfg.wait.is_zero() && !self.wait().await {
            self.enter(Phase::Interrupted);
            warn!("interrupted during wait phase, exiting");
            return RunOutcome::InterruptedWaiting;
        }

        self.enter(Phase::Allocating);
        self.check_cgroup_limit();

        let block = match self.allocate().await {
            Ok(block) => block,
            Err(outcome) => {
                self.enter(Phase::Interrupted);
                return outcome;
            }
        };
        report_resident_set();

        self.enter(Phase::Holding);
        self.hold(block).await;
        self.enter(Phase::Exited);

        RunOutcome::Released {
            size_mb: self.cfg.size.megabytes(),
        }
    }

    /// Vrací `true`, pokud čekání doběhlo, `false` při přerušení.
    async fn wait(&mut self) -> bool {
        self.enter(Phase::Waiting);
        info!(
            wait_secs = self.cfg.wait.as_secs(),
            "waiting before starting allocation"
        );

        tokio::select! {
            biased;

            _ = self.interrupt.recv() => false,
            _ = tokio::time::sleep(self.cfg.wait) => true,
        }
    }

    async fn allocate(&mut self) -> Result<MemoryBlock, RunOutcome> {
        if self.cfg.grow.is_zero() {
            // okamžitá alokace není přerušitelná; signál počká ve frontě na hold
            return Ok(alloc::allocate(self.cfg.size, self.cfg.size_bytes));
        }

        match gradual::allocate_gradual(
            self.cfg.size,
            self.cfg.size_bytes,
            self.cfg.grow,
            &mut self.interrupt,
        )
        .await
        {
            GrowOutcome::Completed(block) => Ok(block),
            GrowOutcome::Interrupted {
                block,
                allocated_mb,
            } => {
                report_resident_set();
                // žádný rollback: dotčené stránky uvolní až konec procesu
                std::mem::forget(block);
                Err(RunOutcome::InterruptedGrowing {
                    allocated_mb,
                    total_mb: self.cfg.size.megabytes() as usize,
                })
            }
        }
    }

    async fn hold(&mut self, block: MemoryBlock) {
        info!(
            size_mb = self.cfg.size.megabytes(),
            "press Ctrl+C to exit and release the memory"
        );

        self.interrupt.recv().await;

        black_box(block.as_slice());
        info!("exiting, memory will be released");
        drop(block);
    }

    fn check_cgroup_limit(&self) {
        let limits = match cgroup::read_limits(&self.cfg.cgroup_root) {
            Ok(l) => l,
            Err(e) => {
                debug_error_display!(e, root = %self.cfg.cgroup_root.display(), "cannot read cgroup memory limits");
                return;
            }
        };

        if let Some(limit) = limits.exceeded_by(self.cfg.size_bytes as u64) {
            warn!(
                size_mb = self.cfg.size.megabytes(),
                limit_mb = limit / (1024 * 1024),
                current_mb = limits.current_bytes.unwrap_or(0) / (1024 * 1024),
                "requested size exceeds the cgroup memory limit, expect reclaim or the OOM killer"
            );
        }
    }
}

fn report_resident_set() {
    match procfs::read_self() {
        Ok(rs) => info!(
            rss_mb = rs.rss_mb(),
            swap_mb = rs.swap_bytes / (1024 * 1024),
            page_size = procfs::system_page_size(),
            "resident set"
        ),
        Err(e) => debug_error_display!(e, "cannot read resident set size"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::interrupt;

    fn config(size: &str, wait: i64, grow: i64) -> Config {
        let mut cfg = Config::new(size, wait, grow).unwrap();
        // testy nesmí záviset na cgroup hostitele
        cfg.cgroup_root = std::env::temp_dir().join("ramen-no-cgroup");
        cfg
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_during_wait_skips_allocation() {
        let (handle, interrupt) = interrupt::channel();
        let mut controller = Controller::new(config("1", 60, 0), interrupt);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            handle.trigger();
        });

        let started = Instant::now();
        let outcome = controller.run().await;

        assert_eq!(outcome, RunOutcome::InterruptedWaiting);
        assert_eq!(controller.phase(), Phase::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn instant_allocation_then_hold_until_interrupt() {
        let (handle, interrupt) = interrupt::channel();
        let mut controller = Controller::new(config("2", 0, 0), interrupt);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            handle.trigger();
        });

        let started = Instant::now();
        let outcome = controller.run().await;

        assert_eq!(outcome, RunOutcome::Released { size_mb: 2 });
        assert_eq!(controller.phase(), Phase::Exited);
        // hold nemá timeout, skončí až na přerušení
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_during_instant_allocation_is_seen_by_hold() {
        let (handle, interrupt) = interrupt::channel();
        let mut controller = Controller::new(config("1", 0, 0), interrupt);

        handle.trigger();
        let outcome = controller.run().await;

        assert_eq!(outcome, RunOutcome::Released { size_mb: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn wait_then_gradual_then_hold() {
        let (handle, interrupt) = interrupt::channel();
        let mut controller = Controller::new(config("2", 2, 1), interrupt);

        tokio::spawn(async move {
            // wait 2 s + růst ~1 s, pak hold
            tokio::time::sleep(Duration::from_secs(10)).await;
            handle.trigger();
        });

        let outcome = controller.run().await;
        assert_eq!(outcome, RunOutcome::Released { size_mb: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_during_grow_reports_partial_progress() {
        let (handle, interrupt) = interrupt::channel();
        let mut controller = Controller::new(config("10", 0, 10), interrupt);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3050)).await;
            handle.trigger();
        });

        let outcome = controller.run().await;

        let RunOutcome::InterruptedGrowing {
            allocated_mb,
            total_mb,
        } = outcome
        else {
            panic!("expected interruption during grow, got {outcome:?}");
        };
        assert_eq!(total_mb, 10);
        assert!(allocated_mb < total_mb);
        assert_eq!(controller.phase(), Phase::Interrupted);
    }
}
