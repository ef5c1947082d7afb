// ── Identity registry client ──
//
// list/enroll/delete against the peripheral's fingerprint store. The
// local registry is a read-through cache: replaced wholesale after
// every successful list, left untouched when a list fails. Enrollment
// completes out-of-band on the sensor, so a 2xx only means "capture
// started"; a one-shot grace-delayed relist picks up the eventual
// result heuristically.

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::session::Session;

impl Session {
    /// Reload the full fingerprint registry from the peripheral.
    ///
    /// On failure the previous local copy is kept -- a valid prior list
    /// is never silently emptied.
    pub async fn refresh_registry(&self) -> Result<(), CoreError> {
        let device = self.device().await?;
        let resp = device.list_fingerprints().await?;

        debug!(slots = resp.fingerprints.len(), "registry reloaded");
        let _ = self.inner.registry.send_replace(resp.fingerprints);
        Ok(())
    }

    /// Begin enrolling a new fingerprint in slot `id`.
    ///
    /// A successful return means the peripheral accepted the request
    /// and is waiting for a finger on the sensor -- NOT that the
    /// identity is stored. The capture completes asynchronously on
    /// hardware this client cannot poll, so a single registry reload is
    /// scheduled after a grace delay to pick up the result. If the
    /// capture takes longer than the grace delay, a manual refresh is
    /// needed -- an accepted limitation.
    pub async fn enroll(&self, id: u8) -> Result<(), CoreError> {
        if !(1..=127).contains(&id) {
            return Err(CoreError::InvalidSlot { id });
        }

        let device = self.device().await?;
        device.enroll(id).await?;
        debug!(id, "enrollment started on peripheral");

        // One-shot reconciliation, cancellable with the session.
        let session = self.clone();
        let cancel = self.inner.cancel.child_token();
        let grace = self.inner.config.enroll_grace;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = sleep(grace) => {
                    if !session.is_connected() {
                        return;
                    }
                    if let Err(e) = session.refresh_registry().await {
                        warn!(error = %e, id, "post-enrollment registry reload failed");
                    }
                }
            }
        });

        Ok(())
    }

    /// Delete the fingerprint in slot `id`.
    ///
    /// Deletion is synchronous on the peripheral, so the registry is
    /// reloaded immediately on success.
    pub async fn delete(&self, id: u8) -> Result<(), CoreError> {
        let device = self.device().await?;
        device.delete(id).await?;
        debug!(id, "fingerprint deleted");

        if let Err(e) = self.refresh_registry().await {
            // The delete itself succeeded; the stale list stays visible
            // until the next refresh.
            warn!(error = %e, "post-delete registry reload failed");
        }
        Ok(())
    }
}
