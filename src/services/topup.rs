use {
    super::{
        PaymentContext,
        reconciler::{ReconcileOutcome, reconcile},
    },
    crate::domain::{
        error::PipelineError,
        id::{InvoiceId, SessionId, UserId},
        invoice::{Invoice, OpenInvoice},
        money::{Amount, Asset, Balance},
        payment::{NewPaymentRecord, PaymentRecord},
        user::User,
    },
};

/// Provider-enforced invoice validity window.
pub const DEFAULT_INVOICE_TTL_SECS: u32 = 1800;

/// Operations the conversational front-end drives.
pub struct TopUpService {
    ctx: PaymentContext,
    invoice_ttl_secs: u32,
}

impl TopUpService {
    pub fn new(ctx: PaymentContext, invoice_ttl_secs: u32) -> Self {
        Self {
            ctx,
            invoice_ttl_secs,
        }
    }

    pub fn context(&self) -> &PaymentContext {
        &self.ctx
    }

    pub async fn register_user(&self, user_id: UserId, name_tag: Option<&str>) -> Result<User, PipelineError> {
        let tag = name_tag
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| User::default_tag(user_id));
        self.ctx.store.ensure_user(user_id, &tag).await
    }

    pub async fn start_top_up(&self, user_id: UserId, asset: Asset) -> SessionId {
        let session = self.ctx.sessions.begin_session(user_id, asset).await;
        tracing::info!(%user_id, %asset, session_id = %session, "top-up started");
        session
    }

    /// Open an invoice for the amount the user typed, e.g. `"10"` or `"0,5"`.
    /// Invalid input is rejected before anything reaches the provider.
    #[tracing::instrument(skip_all, fields(%user_id))]
    pub async fn submit_amount(&self, user_id: UserId, input: &str) -> Result<Invoice, PipelineError> {
        let amount = Amount::parse(input)?;
        let asset = self
            .ctx
            .sessions
            .awaiting_amount(user_id)
            .await
            .ok_or_else(|| PipelineError::Validation("no top-up awaiting an amount".into()))?;

        let request = OpenInvoice {
            asset,
            amount,
            description: format!("Balance top-up for user {user_id}"),
            payload: format!("user_id:{user_id}"),
            expires_in_secs: self.invoice_ttl_secs,
        };
        let invoice = self.ctx.provider.open_invoice(&request).await?;

        let record = NewPaymentRecord::top_up(
            user_id,
            invoice.invoice_id,
            amount,
            asset,
            invoice.created_at,
        );
        self.ctx.store.create_payment(&record).await?;

        // The user may have cancelled meanwhile; the record stays checkable either way.
        if self.ctx.sessions.record_amount_entered(user_id).await.is_ok() {
            self.ctx.sessions.track_invoice(user_id, invoice.invoice_id).await;
        }

        tracing::info!(invoice_id = %invoice.invoice_id, %amount, %asset, "invoice opened");
        Ok(invoice)
    }

    /// User pressed "check payment".
    pub async fn check_payment(
        &self,
        invoice_id: InvoiceId,
        user_id: UserId,
    ) -> Result<ReconcileOutcome, PipelineError> {
        reconcile(&self.ctx, invoice_id, user_id).await
    }

    /// Cancel or return to menu. Open invoices stay in the store.
    pub async fn cancel_top_up(&self, user_id: UserId) -> bool {
        self.ctx.sessions.end_session(user_id).await
    }

    pub async fn balance(&self, user_id: UserId) -> Result<Balance, PipelineError> {
        self.ctx.store.get_user_balance(user_id).await
    }

    pub async fn payment_history(&self, user_id: UserId) -> Result<Vec<PaymentRecord>, PipelineError> {
        self.ctx.store.list_payments_for_user(user_id).await
    }
}
