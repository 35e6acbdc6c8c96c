use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Schedule;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Refresh, Toggle }

impl PhaseSpan for Phase {
    fn span(&self) -> Span { match self { Phase::Refresh => info_span!("refresh"), Phase::Toggle => info_span!("toggle") } }
}

impl OpMarker for Schedule {
    const NAME: &'static str = "schedule";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("schedule") }
}
