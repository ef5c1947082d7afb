// ── Mode controller ──
//
// Toggles the peripheral between idle/setup and active-scanning mode
// and keeps the notification synchronizer in step with the mode.

use tracing::info;

use crate::error::CoreError;
use crate::session::Session;

impl Session {
    /// Toggle attendance-scanning mode on the peripheral.
    ///
    /// On success the local mode mirrors the peripheral and any
    /// displayed live event is cleared locally WITHOUT an
    /// acknowledgment POST -- unlike the timeout/dismiss path, the
    /// peripheral may still consider the event outstanding and
    /// redeliver it after re-entering scanning mode. This mirrors the
    /// device's observed behavior. On failure nothing changes locally.
    pub async fn set_mode(&self, active: bool) -> Result<(), CoreError> {
        let device = self.device().await?;
        device.set_mode(active).await?;

        let _ = self.inner.scanning_mode.send_replace(active);
        let _ = self.inner.current_event.send_replace(None);
        info!(active, "scanning mode toggled");

        // Start or stop the notification poll task to match.
        self.sync_poller_state().await;
        Ok(())
    }
}
