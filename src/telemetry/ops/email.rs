use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Email;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Set, Show, Clear }

impl PhaseSpan for Phase {
    fn span(&self) -> Span { match self { Phase::Set => info_span!("set"), Phase::Show => info_span!("show"), Phase::Clear => info_span!("clear") } }
}

impl OpMarker for Email {
    const NAME: &'static str = "email";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("email") }
}
