use {
    super::payment::PaymentRecord,
    std::{future::Future, pin::Pin},
};

/// Front-end hook fired once per credited invoice discovered by the sweeper.
pub trait SettlementNotifier: Send + Sync {
    fn payment_settled(&self, record: &PaymentRecord) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Notifier that only writes a log line.
pub struct LogNotifier;

impl SettlementNotifier for LogNotifier {
    fn payment_settled(&self, record: &PaymentRecord) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        tracing::info!(
            user_id = %record.user_id,
            invoice_id = %record.invoice_id,
            amount = %record.amount,
            asset = %record.asset,
            "top-up settled, balance updated"
        );
        Box::pin(async {})
    }
}
