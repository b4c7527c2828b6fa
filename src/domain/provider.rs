use {
    super::error::PipelineError,
    super::id::InvoiceId,
    super::invoice::{Invoice, OpenInvoice},
    std::{future::Future, pin::Pin},
};

/// Boundary to the external invoicing API. Implementations only talk to the
/// provider; they never touch local payment records.
pub trait InvoiceProvider: Send + Sync {
    fn open_invoice(
        &self,
        request: &OpenInvoice,
    ) -> Pin<Box<dyn Future<Output = Result<Invoice, PipelineError>> + Send + '_>>;

    fn fetch_invoice(
        &self,
        id: InvoiceId,
    ) -> Pin<Box<dyn Future<Output = Result<Invoice, PipelineError>> + Send + '_>>;
}
