use crate::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenStream { session: SessionId, query: String },
    CloseStream { session: SessionId },
    /// Diagnostic detail for local logs only; never rendered.
    ReportDiagnostic {
        session: SessionId,
        message: String,
        trace: Option<String>,
    },
}
