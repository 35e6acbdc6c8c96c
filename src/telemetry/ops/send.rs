use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Send;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Invoke }

impl PhaseSpan for Phase {
    fn span(&self) -> Span { match self { Phase::Invoke => info_span!("invoke") } }
}

impl OpMarker for Send {
    const NAME: &'static str = "send";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("send") }
}
