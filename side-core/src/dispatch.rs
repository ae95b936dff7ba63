// Licensed under the MIT license.

//! The hot dispatch path and the statedump replay call.
//!
//! `dispatch`/`dispatch_variadic` are what an instrumented call site invokes
//! on every pass through it, whether or not any tracer is listening; they
//! must stay cheap when disabled. `statedump_event_call`/
//! `statedump_event_call_variadic` are invoked instead, with a statedump
//! `key`, from inside an application's registered [`crate::statedump`]
//! `dump_fn` while it is replaying its current state for one tracer-driven
//! episode: `dump_fn(key)` is the outer "replay everything now" trigger the
//! statedump engine calls; `statedump_event_call` is the per-event,
//! per-record primitive the application calls from inside it, which in turn
//! fans out to whichever tracers attached a statedump callback to that
//! specific event.

use crate::event::{ArgVec, DynamicStruct, Event, Fixed, Variadic};
use crate::rcu::RcuGpState;
use crate::statedump::LIVE_KEY;

/// Dispatches one fixed-arity call: checks the fast-path `enabled` flag,
/// then invokes every currently attached callback with the given arguments.
pub fn dispatch(event: &Event<Fixed>, rcu: &RcuGpState, args: &[side_types::Arg]) {
    let state = event.state();
    if !state.is_enabled() {
        return;
    }
    let desc = event.description();
    let arg_vec = ArgVec::new(args);
    state.dispatch_with(rcu, |fn_ptr, priv_data| {
        fn_ptr(desc, &arg_vec, priv_data);
    });
}

/// Dispatches one variadic call: identical to [`dispatch`], but also
/// forwards the caller's dynamic struct of extra fields to each callback.
pub fn dispatch_variadic(
    event: &Event<Variadic>,
    rcu: &RcuGpState,
    args: &[side_types::Arg],
    extra: &DynamicStruct,
) {
    let state = event.state();
    if !state.is_enabled() {
        return;
    }
    let desc = event.description();
    let arg_vec = ArgVec::new(args);
    state.dispatch_with(rcu, |fn_ptr, priv_data| {
        fn_ptr(desc, &arg_vec, extra, priv_data);
    });
}

/// Replays one fixed-arity event's current value under a statedump `key`,
/// fanning out to every tracer that attached a statedump callback to this
/// specific event. Called by an application's own `dump_fn` while a
/// statedump episode is in flight; calling it with [`LIVE_KEY`] is a
/// programming error.
pub fn statedump_event_call(
    event: &Event<Fixed>,
    rcu: &RcuGpState,
    key: u64,
    args: &[side_types::Arg],
) -> Result<(), crate::error::Error> {
    if key == LIVE_KEY {
        return Err(crate::error::Error::Invalid("statedump key"));
    }
    let desc = event.description();
    let arg_vec = ArgVec::new(args);
    event
        .state()
        .dispatch_statedump_with(rcu, |fn_ptr, priv_data| {
            fn_ptr(desc, &arg_vec, key, priv_data);
        });
    Ok(())
}

/// Variadic counterpart to [`statedump_event_call`]. The callback signature
/// for statedump replay carries no dynamic-struct parameter, so `_extra` is
/// accepted purely for symmetry with [`dispatch_variadic`] and currently
/// unused; kept so a future replay format can carry variadic fields through
/// statedump the same way live dispatch does.
pub fn statedump_event_call_variadic(
    event: &Event<Variadic>,
    rcu: &RcuGpState,
    key: u64,
    args: &[side_types::Arg],
    _extra: &DynamicStruct,
) -> Result<(), crate::error::Error> {
    if key == LIVE_KEY {
        return Err(crate::error::Error::Invalid("statedump key"));
    }
    let desc = event.description();
    let arg_vec = ArgVec::new(args);
    event
        .state()
        .dispatch_statedump_with(rcu, |fn_ptr, priv_data| {
            fn_ptr(desc, &arg_vec, key, priv_data);
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use side_types::{describe_event, ByteOrder, EventDescription, EventFlags, Field, LogLevel, Type};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    static DISPATCH_COUNT: AtomicUsize = AtomicUsize::new(0);
    static STATEDUMP_COUNT: AtomicUsize = AtomicUsize::new(0);
    static LAST_STATEDUMP_KEY: AtomicUsize = AtomicUsize::new(0);

    fn record_dispatch(_desc: &EventDescription, _args: &ArgVec<'_>, _priv: usize) {
        DISPATCH_COUNT.fetch_add(1, AtomicOrdering::SeqCst);
    }

    fn record_statedump(_desc: &EventDescription, _args: &ArgVec<'_>, key: u64, _priv: usize) {
        STATEDUMP_COUNT.fetch_add(1, AtomicOrdering::SeqCst);
        LAST_STATEDUMP_KEY.store(key as usize, AtomicOrdering::SeqCst);
    }

    fn make_event() -> Event<Fixed> {
        let desc = describe_event(
            "dispatch-test-provider",
            "widget",
            vec![Field::new("id", Type::integer(32, true, ByteOrder::host()))],
            vec![],
            LogLevel::Info,
            EventFlags::NONE,
        );
        Event::new(desc)
    }

    #[test]
    fn disabled_event_skips_every_callback() {
        let event = make_event();
        let rcu = RcuGpState::new();
        let before = DISPATCH_COUNT.load(AtomicOrdering::SeqCst);
        dispatch(&event, &rcu, &[]);
        assert_eq!(DISPATCH_COUNT.load(AtomicOrdering::SeqCst), before);
    }

    #[test]
    fn attach_then_dispatch_invokes_callback() {
        let event = make_event();
        let rcu = RcuGpState::new();
        event.state().attach(record_dispatch, 0, &rcu).unwrap();
        let before = DISPATCH_COUNT.load(AtomicOrdering::SeqCst);
        dispatch(&event, &rcu, &[]);
        assert_eq!(DISPATCH_COUNT.load(AtomicOrdering::SeqCst), before + 1);
    }

    #[test]
    fn statedump_call_rejects_live_key() {
        let event = make_event();
        let rcu = RcuGpState::new();
        let err = statedump_event_call(&event, &rcu, LIVE_KEY, &[]);
        assert!(err.is_err());
    }

    #[test]
    fn statedump_call_invokes_only_statedump_callbacks() {
        let event = make_event();
        let rcu = RcuGpState::new();
        event
            .state()
            .attach_statedump(record_statedump, 0, &rcu)
            .unwrap();
        let before = STATEDUMP_COUNT.load(AtomicOrdering::SeqCst);
        statedump_event_call(&event, &rcu, 7, &[]).unwrap();
        assert_eq!(STATEDUMP_COUNT.load(AtomicOrdering::SeqCst), before + 1);
        assert_eq!(LAST_STATEDUMP_KEY.load(AtomicOrdering::SeqCst), 7);

        // Ordinary dispatch must not invoke the statedump-only callback.
        let dispatch_before = DISPATCH_COUNT.load(AtomicOrdering::SeqCst);
        dispatch(&event, &rcu, &[]);
        assert_eq!(DISPATCH_COUNT.load(AtomicOrdering::SeqCst), dispatch_before);
    }

    #[test]
    fn registry_rcu_drives_dispatch_for_registered_events() {
        let registry = crate::registry::global();
        let desc = describe_event(
            "dispatch-test-provider",
            "widget2",
            vec![Field::new("id", Type::integer(32, true, ByteOrder::host()))],
            vec![],
            LogLevel::Info,
            EventFlags::NONE,
        );
        let handle = registry.register_events(vec![desc]).unwrap();
        let any = &handle.events()[0];
        if let crate::registry::AnyEvent::Fixed(event) = any.as_ref() {
            event.state().attach(record_dispatch, 1, registry.rcu()).unwrap();
            let before = DISPATCH_COUNT.load(AtomicOrdering::SeqCst);
            dispatch(event, registry.rcu(), &[]);
            assert_eq!(DISPATCH_COUNT.load(AtomicOrdering::SeqCst), before + 1);
        } else {
            panic!("expected a fixed-arity event");
        }
        registry.unregister_events(handle);
    }
}
