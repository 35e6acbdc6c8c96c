pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one per CLI operation
pub fn send() -> LogCtx<ops::send::Send> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn history() -> LogCtx<ops::history::History> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn schedule() -> LogCtx<ops::schedule::Schedule> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn email() -> LogCtx<ops::email::Email> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn watch() -> LogCtx<ops::watch::Watch> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
