//! The bulk-dispatch orchestrator.
//!
//! A campaign fans out into one spawned task per recipient. Each task sleeps
//! a random delay from the configured window, checks the campaign's
//! cancellation token, then sends through the [`Transport`]. All delays run
//! concurrently, so a campaign takes roughly one delay period regardless of
//! recipient count. Outcomes are collected in input order once every task has
//! settled; one recipient's failure never affects another.
//!
//! At most one campaign is active. Its token sits in a shared slot that
//! [`Dispatcher::cancel_campaign`] empties; the slot is also emptied when the
//! campaign finishes, whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use broadcast_core::{MediaDescriptor, OutcomeStatus, RecipientOutcome};
use broadcast_transport::Transport;
use futures::future::join_all;
use metrics::counter;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::campaign::Campaign;
use crate::delay::DelayWindow;
use crate::errors::DispatchError;
use crate::normalize::normalize_number;

/// Campaigns accepted (counter).
pub const CAMPAIGNS_TOTAL: &str = "dispatch_campaigns_total";
/// Recipient outcomes (counter, labels: status).
pub const OUTCOMES_TOTAL: &str = "dispatch_outcomes_total";
/// Successful cancel requests (counter).
pub const CANCELLATIONS_TOTAL: &str = "dispatch_cancellations_total";

/// Dispatch policy.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Prefix ensured on every recipient number.
    pub country_code: String,
    /// Appended to the normalized number to form the transport address.
    pub address_suffix: String,
    /// Per-recipient stagger window.
    pub delay: DelayWindow,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            country_code: "57".into(),
            address_suffix: "@s.whatsapp.net".into(),
            delay: DelayWindow::default(),
        }
    }
}

struct ActiveCampaign {
    id: Uuid,
    cancel: CancellationToken,
}

type Slot = Arc<Mutex<Option<ActiveCampaign>>>;

/// Empties the slot on drop, but only if it still holds the same campaign:
/// after a cancel the slot may already belong to a newer one.
struct SlotGuard {
    slot: Slot,
    id: Uuid,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|active| active.id == self.id) {
            *slot = None;
        }
    }
}

enum Payload {
    Text(String),
    Media(MediaDescriptor),
}

/// Sends campaigns through a [`Transport`], one at a time.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    config: Arc<DispatchConfig>,
    active: Slot,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(transport: Arc<dyn Transport>, config: DispatchConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Dispatch policy in use.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Whether a campaign currently occupies the active slot.
    pub fn is_sending(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Validate and send a campaign, returning one outcome per recipient in
    /// input order.
    pub async fn start_campaign(
        &self,
        message: impl Into<String>,
        media: Option<MediaDescriptor>,
        recipients: Vec<String>,
    ) -> Result<Vec<RecipientOutcome>, DispatchError> {
        let campaign = Campaign::new(message, media, recipients)?;
        self.run(campaign).await
    }

    /// Send an already validated campaign.
    ///
    /// The campaign runs on its own task: if the caller stops waiting, sends
    /// still complete and the slot is still released.
    pub async fn run(&self, campaign: Campaign) -> Result<Vec<RecipientOutcome>, DispatchError> {
        let guard = self.claim(&campaign)?;
        counter!(CAMPAIGNS_TOTAL).increment(1);

        let span = info_span!(
            "campaign",
            campaign_id = %campaign.id(),
            recipients = campaign.recipients().len(),
            media = campaign.media().is_some()
        );
        let this = self.clone();
        let task = tokio::spawn(
            async move {
                let _guard = guard;
                this.fan_out(campaign).await
            }
            .instrument(span),
        );

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "campaign task failed");
                Err(DispatchError::Systemic(e.to_string()))
            }
        }
    }

    /// Cancel the active campaign.
    ///
    /// Returns `false` without side effects when nothing is sending. Recipients
    /// still waiting out their delay finish as cancelled; sends already handed
    /// to the transport are not interrupted. Does not wait for either.
    pub fn cancel_campaign(&self) -> bool {
        let Some(active) = self.active.lock().take() else {
            return false;
        };
        active.cancel.cancel();
        counter!(CANCELLATIONS_TOTAL).increment(1);
        info!(campaign_id = %active.id, "campaign cancelled");
        true
    }

    fn claim(&self, campaign: &Campaign) -> Result<SlotGuard, DispatchError> {
        let mut slot = self.active.lock();
        if slot.is_some() {
            return Err(DispatchError::Busy);
        }
        *slot = Some(ActiveCampaign {
            id: campaign.id(),
            cancel: campaign.cancel_token(),
        });
        Ok(SlotGuard {
            slot: Arc::clone(&self.active),
            id: campaign.id(),
        })
    }

    async fn fan_out(&self, campaign: Campaign) -> Result<Vec<RecipientOutcome>, DispatchError> {
        let (_, message, media, recipients, cancel) = campaign.into_parts();
        let payload = Arc::new(match media {
            Some(media) => Payload::Media(media),
            None => Payload::Text(message),
        });
        info!("campaign started");

        let handles: Vec<_> = recipients
            .iter()
            .map(|raw| {
                let number = normalize_number(raw, &self.config.country_code);
                let unit = Unit {
                    address: format!("{number}{}", self.config.address_suffix),
                    number,
                    delay: self.config.delay.sample(),
                };
                tokio::spawn(
                    unit.run(
                        Arc::clone(&self.transport),
                        Arc::clone(&payload),
                        cancel.clone(),
                    )
                    .in_current_span(),
                )
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        let mut failure = None;
        for joined in join_all(handles).await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(error = %e, "recipient task failed");
                    let _ = failure.get_or_insert_with(|| e.to_string());
                }
            }
        }
        if let Some(reason) = failure {
            return Err(DispatchError::Systemic(reason));
        }

        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        info!(
            sent = count(OutcomeStatus::Success) + count(OutcomeStatus::FileSent),
            cancelled = count(OutcomeStatus::Cancelled),
            failed = count(OutcomeStatus::Error),
            "campaign finished"
        );
        Ok(outcomes)
    }
}

/// One recipient's share of a campaign.
struct Unit {
    number: String,
    address: String,
    delay: Duration,
}

impl Unit {
    async fn run(
        self,
        transport: Arc<dyn Transport>,
        payload: Arc<Payload>,
        cancel: CancellationToken,
    ) -> RecipientOutcome {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(self.delay) => {}
        }

        let outcome = if cancel.is_cancelled() {
            debug!(number = %self.number, "send skipped, campaign cancelled");
            RecipientOutcome::cancelled(self.number)
        } else {
            match payload.as_ref() {
                Payload::Media(media) => match transport.send_media(&self.address, media).await {
                    Ok(()) => RecipientOutcome::file_sent(self.number),
                    Err(e) => {
                        warn!(number = %self.number, error = %e, "media send failed");
                        RecipientOutcome::error(self.number, e.to_string())
                    }
                },
                Payload::Text(text) => match transport.send_text(&self.address, text).await {
                    Ok(()) => RecipientOutcome::success(self.number),
                    Err(e) => {
                        warn!(number = %self.number, error = %e, "text send failed");
                        RecipientOutcome::error(self.number, e.to_string())
                    }
                },
            }
        };

        counter!(OUTCOMES_TOTAL, "status" => outcome.status.as_str()).increment(1);
        info!(
            number = %outcome.number,
            status = %outcome.status,
            delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
            "recipient settled"
        );
        outcome
    }
}
