use std::time::Duration;

use fieldcrew_application::InvitationService;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

/// Periodically moves overdue pending invitations to `expired`.
///
/// A failed sweep is logged and retried on the next tick.
pub fn spawn_invitation_sweep(
    invitation_service: InvitationService,
    period_seconds: u64,
) -> JoinHandle<()> {
    info!(period_seconds, "starting invitation expiry sweep");

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(period_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(error) = invitation_service.expire_overdue(chrono::Utc::now()).await {
                warn!(error = %error, "invitation expiry sweep failed");
            }
        }
    })
}
