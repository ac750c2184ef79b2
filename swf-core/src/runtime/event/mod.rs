mod compiled_event;
mod event_factory;

pub use compiled_event::{CompiledEvent, StateMachine};
pub use event_factory::EventFactory;
