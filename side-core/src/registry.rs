// Licensed under the MIT license.

//! The authoritative event/tracer registry: owns every registered event and
//! tracer notification handle, and serializes all mutations to them behind
//! one recursive mutex.

use std::sync::{Arc, OnceLock};

use parking_lot::ReentrantMutex;
use side_types::EventDescription;

use crate::error::Error;
use crate::event::{Event, Fixed, Variadic};
use crate::rcu::RcuGpState;

/// An event stored in the registry, type-erased over whether it accepts
/// variadic extras.
pub enum AnyEvent {
    /// A fixed-arity event.
    Fixed(Event<Fixed>),
    /// A variadic event.
    Variadic(Event<Variadic>),
}

impl AnyEvent {
    /// Returns the event's static description, regardless of flavor.
    pub fn description(&self) -> &EventDescription {
        match self {
            AnyEvent::Fixed(e) => e.description(),
            AnyEvent::Variadic(e) => e.description(),
        }
    }
}

/// Whether an event was just inserted into, or removed from, the registry.
/// Delivered to every registered tracer so it can keep its own view in
/// sync.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Notification {
    /// The event(s) were just registered.
    Insert,
    /// The event(s) are about to be unregistered.
    Remove,
}

type TracerCallback = Arc<dyn Fn(Notification, &AnyEvent) + Send + Sync>;

struct TracerEntry {
    id: u64,
    callback: TracerCallback,
}

/// An opaque handle returned by [`register_events`], presented back to
/// [`unregister_events`] to remove the whole group it named.
pub struct EventsRegisterHandle {
    events: Vec<Arc<AnyEvent>>,
}

impl EventsRegisterHandle {
    /// Returns the events registered under this handle.
    pub fn events(&self) -> &[Arc<AnyEvent>] {
        &self.events
    }
}

/// An opaque handle returned by [`register_tracer`], presented back to
/// [`unregister_tracer`].
pub struct TracerHandle {
    id: u64,
}

struct Inner {
    events: Vec<Arc<AnyEvent>>,
    tracers: Vec<TracerEntry>,
    next_tracer_id: u64,
    finalized: bool,
}

/// The registry: a recursive lock guarding the event/tracer lists, plus
/// the RCU grace-period state every attach/detach/unregister waits on.
///
/// The lock is reentrant because notification callbacks run **with the
/// lock held**, and a tracer is entitled to call back into the registry
/// (e.g. to attach a dispatch callback to a just-inserted event) from
/// inside its own notification handler.
pub struct Registry {
    side_lock: ReentrantMutex<std::cell::RefCell<Inner>>,
    rcu: RcuGpState,
}

impl Registry {
    fn new() -> Self {
        Self {
            side_lock: ReentrantMutex::new(std::cell::RefCell::new(Inner {
                events: Vec::new(),
                tracers: Vec::new(),
                next_tracer_id: 1,
                finalized: false,
            })),
            rcu: RcuGpState::new(),
        }
    }

    /// Returns the grace-period state shared by every event's dispatch
    /// path and the registry's own attach/detach/unregister operations.
    pub fn rcu(&self) -> &RcuGpState {
        &self.rcu
    }

    /// Validates and registers a group of events, notifying every tracer
    /// with [`Notification::Insert`] for each one.
    pub fn register_events(
        &self,
        descriptions: Vec<EventDescription>,
    ) -> Result<EventsRegisterHandle, Error> {
        for desc in &descriptions {
            side_types::validate(desc).map_err(|_| Error::Invalid("event description"))?;
        }

        let guard = self.side_lock.lock();
        let mut inner = guard.borrow_mut();
        if inner.finalized {
            return Err(Error::Finalized);
        }

        let mut new_events = Vec::with_capacity(descriptions.len());
        for desc in descriptions {
            let any = if desc.is_variadic() {
                Arc::new(AnyEvent::Variadic(Event::new(desc)))
            } else {
                Arc::new(AnyEvent::Fixed(Event::new(desc)))
            };
            inner.events.push(any.clone());
            new_events.push(any);
        }

        // Collect the tracer callbacks before releasing the `RefCell`
        // borrow: a tracer's notification handler is entitled to call back
        // into the registry (e.g. to attach to the event it was just told
        // about), and that reentrant call would panic against a still-live
        // `borrow_mut` even though the outer `ReentrantMutex` itself
        // permits the same thread to re-lock.
        let tracer_callbacks: Vec<TracerCallback> =
            inner.tracers.iter().map(|t| t.callback.clone()).collect();
        drop(inner);

        for callback in &tracer_callbacks {
            for event in &new_events {
                callback(Notification::Insert, event);
            }
        }

        Ok(EventsRegisterHandle { events: new_events })
    }

    /// Notifies every tracer with [`Notification::Remove`], drains every
    /// event's callback array back to empty, and unlinks the handle.
    pub fn unregister_events(&self, handle: EventsRegisterHandle) {
        let guard = self.side_lock.lock();
        let inner = guard.borrow();
        let tracer_callbacks: Vec<TracerCallback> =
            inner.tracers.iter().map(|t| t.callback.clone()).collect();
        drop(inner);

        for callback in &tracer_callbacks {
            for event in &handle.events {
                callback(Notification::Remove, event);
            }
        }

        guard
            .borrow_mut()
            .events
            .retain(|e| !handle.events.iter().any(|h| Arc::ptr_eq(e, h)));
        drop(guard);

        for event in &handle.events {
            match event.as_ref() {
                AnyEvent::Fixed(e) => e.state().drain_all(&self.rcu),
                AnyEvent::Variadic(e) => e.state().drain_all(&self.rcu),
            }
        }
    }

    /// Links a new tracer, then immediately replays every currently
    /// registered event through it with [`Notification::Insert`], so a
    /// tracer never misses an event registered before it joined.
    pub fn register_tracer(&self, callback: TracerCallback) -> TracerHandle {
        let guard = self.side_lock.lock();
        let mut inner = guard.borrow_mut();
        let id = inner.next_tracer_id;
        inner.next_tracer_id += 1;
        inner.tracers.push(TracerEntry {
            id,
            callback: callback.clone(),
        });

        let events = inner.events.clone();
        drop(inner);
        for event in &events {
            callback(Notification::Insert, event);
        }

        TracerHandle { id }
    }

    /// Replays [`Notification::Remove`] for every currently registered
    /// event, then unlinks the tracer.
    pub fn unregister_tracer(&self, handle: TracerHandle) {
        let guard = self.side_lock.lock();
        let inner = guard.borrow();
        let callback = inner
            .tracers
            .iter()
            .find(|t| t.id == handle.id)
            .map(|t| t.callback.clone());
        let events = inner.events.clone();
        drop(inner);

        if let Some(callback) = callback {
            for event in &events {
                callback(Notification::Remove, event);
            }
        }

        let mut inner = guard.borrow_mut();
        inner.tracers.retain(|t| t.id != handle.id);
    }

    /// Returns `Err(Error::Finalized)` under the lock if teardown has
    /// already run. Every attach/detach entry point checks this first: a
    /// caller holding an `Arc<AnyEvent>` from before teardown must not be
    /// able to re-attach a callback and re-enable an event `finalize`
    /// already drained.
    fn check_not_finalized(&self, guard: &parking_lot::ReentrantMutexGuard<'_, std::cell::RefCell<Inner>>) -> Result<(), Error> {
        if guard.borrow().finalized {
            return Err(Error::Finalized);
        }
        Ok(())
    }

    /// Attaches a fixed-arity dispatch callback to `event`.
    pub fn attach_fixed(
        &self,
        event: &Event<Fixed>,
        fn_ptr: crate::event::Callback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().attach(fn_ptr, priv_data, &self.rcu)?;
        Ok(())
    }

    /// Detaches a previously attached fixed-arity dispatch callback.
    pub fn detach_fixed(
        &self,
        event: &Event<Fixed>,
        fn_ptr: crate::event::Callback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().detach(fn_ptr, priv_data, &self.rcu)?;
        Ok(())
    }

    /// Attaches a variadic dispatch callback to `event`.
    pub fn attach_variadic(
        &self,
        event: &Event<Variadic>,
        fn_ptr: crate::event::VariadicCallback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().attach(fn_ptr, priv_data, &self.rcu)?;
        Ok(())
    }

    /// Detaches a previously attached variadic dispatch callback.
    pub fn detach_variadic(
        &self,
        event: &Event<Variadic>,
        fn_ptr: crate::event::VariadicCallback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().detach(fn_ptr, priv_data, &self.rcu)?;
        Ok(())
    }

    /// Attaches a statedump replay callback to a fixed-arity event,
    /// serialized the same way as [`Registry::attach_fixed`].
    pub fn attach_statedump_fixed(
        &self,
        event: &Event<Fixed>,
        fn_ptr: crate::event::StatedumpCallback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().attach_statedump(fn_ptr, priv_data, &self.rcu)
    }

    /// Detaches a previously attached fixed-arity statedump replay callback.
    pub fn detach_statedump_fixed(
        &self,
        event: &Event<Fixed>,
        fn_ptr: crate::event::StatedumpCallback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().detach_statedump(fn_ptr, priv_data, &self.rcu)
    }

    /// Attaches a statedump replay callback to a variadic event.
    pub fn attach_statedump_variadic(
        &self,
        event: &Event<Variadic>,
        fn_ptr: crate::event::StatedumpCallback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().attach_statedump(fn_ptr, priv_data, &self.rcu)
    }

    /// Detaches a previously attached variadic statedump replay callback.
    pub fn detach_statedump_variadic(
        &self,
        event: &Event<Variadic>,
        fn_ptr: crate::event::StatedumpCallback,
        priv_data: usize,
    ) -> Result<(), Error> {
        let guard = self.side_lock.lock();
        self.check_not_finalized(&guard)?;
        event.state().detach_statedump(fn_ptr, priv_data, &self.rcu)
    }

    /// Runs the process-wide teardown: unregisters every event still
    /// registered (notifying tracers and draining each one's callback array
    /// the same way [`Registry::unregister_events`] would) and marks the
    /// registry finalized so no further `register_events`/`register_tracer`
    /// call is accepted. Idempotent — a second call is a no-op.
    pub fn finalize(&self) {
        let guard = self.side_lock.lock();
        let mut inner = guard.borrow_mut();
        if inner.finalized {
            return;
        }
        inner.finalized = true;
        let remaining = std::mem::take(&mut inner.events);
        let tracer_callbacks: Vec<TracerCallback> =
            inner.tracers.iter().map(|t| t.callback.clone()).collect();
        inner.tracers.clear();
        drop(inner);
        drop(guard);

        for callback in &tracer_callbacks {
            for event in &remaining {
                callback(Notification::Remove, event);
            }
        }
        for event in &remaining {
            match event.as_ref() {
                AnyEvent::Fixed(e) => e.state().drain_all(&self.rcu),
                AnyEvent::Variadic(e) => e.state().drain_all(&self.rcu),
            }
        }
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Returns the process-wide registry, creating it on first use.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use side_types::{describe_event, EventFlags, LogLevel};
    use std::sync::atomic::Ordering;

    fn plain_desc(name: &str) -> EventDescription {
        describe_event(
            "finalize-test-provider",
            name,
            vec![],
            vec![],
            LogLevel::Info,
            EventFlags::NONE,
        )
    }

    #[test]
    fn finalize_unregisters_remaining_events_and_rejects_new_ones() {
        let registry = Registry::new();
        let handle = registry.register_events(vec![plain_desc("a")]).unwrap();
        let any = handle.events()[0].clone();

        let removed = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let removed_cb = removed.clone();
        registry.register_tracer(Arc::new(move |notif, _event: &AnyEvent| {
            if notif == Notification::Remove {
                removed_cb.store(true, Ordering::SeqCst);
            }
        }));

        registry.finalize();

        assert!(removed.load(Ordering::SeqCst));
        match any.as_ref() {
            AnyEvent::Fixed(e) => assert_eq!(e.state().callback_count(), 0),
            AnyEvent::Variadic(e) => assert_eq!(e.state().callback_count(), 0),
        }

        let err = registry
            .register_events(vec![plain_desc("b")])
            .unwrap_err();
        assert!(matches!(err, Error::Finalized));
    }

    #[test]
    fn finalize_is_idempotent() {
        let registry = Registry::new();
        registry.register_events(vec![plain_desc("x")]).unwrap();
        registry.finalize();
        registry.finalize();
        assert!(matches!(
            registry.register_events(vec![plain_desc("y")]).unwrap_err(),
            Error::Finalized
        ));
    }
}
