//! Readiness gate: wait until a compiled result is available.
//!
//! Publishing a result notifies every waiter. The tick loop only bounds how
//! long a caller waits when nothing is ever published.

use std::sync::Arc;
use std::time::Duration;

use crate::compiler::CompiledSpriteResult;
use crate::debug;
use crate::error::{Result, SpriteError};

use super::SpriteCore;

/// Length of one wait tick.
pub const READY_TICK: Duration = Duration::from_secs(1);

/// Ticks before giving up.
pub const READY_MAX_TICKS: u32 = 100;

impl SpriteCore {
    /// Resolve with the latest result, waiting up to
    /// [`READY_MAX_TICKS`] × [`READY_TICK`] for the first one.
    pub async fn wait_until_ready(&self) -> Result<Arc<CompiledSpriteResult>> {
        self.wait_until_ready_with(READY_TICK, READY_MAX_TICKS).await
    }

    /// [`Self::wait_until_ready`] with a custom bound.
    pub async fn wait_until_ready_with(
        &self,
        tick: Duration,
        max_ticks: u32,
    ) -> Result<Arc<CompiledSpriteResult>> {
        for elapsed in 0..max_ticks {
            // register before checking so a publish in between is not missed
            let notified = self.inner.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(result) = self.compiled() {
                return Ok(result);
            }
            if elapsed > 0 {
                debug!("ready"; "waiting for sprite compile ({}/{})", elapsed, max_ticks);
            }
            let _ = tokio::time::timeout(tick, notified).await;
        }

        self.compiled()
            .ok_or(SpriteError::Timeout { ticks: max_ticks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_times_out_without_compile() {
        let dir = TempDir::new().unwrap();
        let (core, _) = core(&dir);

        let err = core
            .wait_until_ready_with(Duration::from_millis(5), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, SpriteError::Timeout { ticks: 3 }));
    }

    #[tokio::test]
    async fn test_released_by_publish() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.svg", PLAIN);
        let (core, _) = core(&dir);

        let waiter = {
            let core = core.clone();
            tokio::spawn(async move {
                core.wait_until_ready_with(Duration::from_secs(30), 2).await
            })
        };
        tokio::task::yield_now().await;

        core.scan_and_compile().await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(result.generation, 1);
    }

    #[tokio::test]
    async fn test_immediate_when_compiled() {
        let dir = TempDir::new().unwrap();
        let (core, _) = core(&dir);
        core.scan_and_compile().await.unwrap();

        let result = core
            .wait_until_ready_with(Duration::from_millis(1), 1)
            .await
            .unwrap();
        assert_eq!(result.generation, 1);
    }
}
