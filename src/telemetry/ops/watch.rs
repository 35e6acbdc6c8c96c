use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Watch;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Start, Teardown }

impl PhaseSpan for Phase {
    fn span(&self) -> Span { match self { Phase::Start => info_span!("start"), Phase::Teardown => info_span!("teardown") } }
}

impl OpMarker for Watch {
    const NAME: &'static str = "watch";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("watch") }
}
