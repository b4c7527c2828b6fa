use {
    super::{
        PaymentContext,
        reconciler::{ReconcileOutcome, reconcile},
    },
    crate::domain::notify::SettlementNotifier,
    std::{collections::BTreeSet, sync::Arc, time::Duration},
    tokio::sync::watch,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub credited: usize,
    pub closed: usize,
    pub failed: usize,
}

/// Reconcile every pending invoice of every user with an open session, once
/// per `interval`, until `shutdown` fires. A cycle that has started always
/// runs to completion.
pub async fn run_sweeper(
    ctx: PaymentContext,
    notifier: Arc<dyn SettlementNotifier>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "payment sweeper started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("payment sweeper shutting down");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let report = sweep_once(&ctx, &*notifier).await;
        if report.checked > 0 {
            tracing::debug!(?report, "sweep cycle finished");
        }
    }
}

/// One pass over all sessions. Errors are logged per user or per invoice and
/// never abort the rest of the cycle.
pub async fn sweep_once(ctx: &PaymentContext, notifier: &dyn SettlementNotifier) -> SweepReport {
    let mut report = SweepReport::default();

    for (user_id, tracked) in ctx.sessions.users_with_pending().await {
        let pending = match ctx.store.list_pending_payments_for_user(user_id).await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "could not list pending payments, skipping user");
                report.failed += 1;
                continue;
            }
        };

        // Tracked ids the store no longer reports as active were settled elsewhere.
        let active: BTreeSet<_> = pending.iter().map(|p| p.invoice_id).collect();
        for stale in tracked.difference(&active) {
            ctx.sessions.untrack_invoice(user_id, *stale).await;
        }

        for payment in pending {
            report.checked += 1;
            match reconcile(ctx, payment.invoice_id, user_id).await {
                Ok(ReconcileOutcome::Credited(record)) => {
                    report.credited += 1;
                    notifier.payment_settled(&record).await;
                }
                Ok(ReconcileOutcome::Closed(_)) => report.closed += 1,
                Ok(ReconcileOutcome::Pending | ReconcileOutcome::AlreadySettled(_)) => {}
                Err(e) if e.is_retryable() => {
                    report.failed += 1;
                    tracing::warn!(
                        %user_id,
                        invoice_id = %payment.invoice_id,
                        error = %e,
                        "reconcile failed, will retry next cycle"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        %user_id,
                        invoice_id = %payment.invoice_id,
                        error = %e,
                        "reconcile failed"
                    );
                }
            }
        }
    }

    report
}
