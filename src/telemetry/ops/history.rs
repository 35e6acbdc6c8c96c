use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct History;

#[derive(Copy, Clone, Debug)]
pub enum Phase { FetchLogs, Render }

impl PhaseSpan for Phase {
    fn span(&self) -> Span { match self { Phase::FetchLogs => info_span!("fetch_logs"), Phase::Render => info_span!("render") } }
}

impl OpMarker for History {
    const NAME: &'static str = "history";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("history") }
}
