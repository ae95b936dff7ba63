// Licensed under the MIT license.

//! The mutable, per-event runtime state: the `enabled` fast-path flag and
//! the RCU-protected callback array.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use side_types::{Arg, Attribute, EventDescription};

use crate::rcu::RcuGpState;

/// The top byte of `enabled` is reserved for a kernel-write hook contract.
/// `side-core` never sets it; a future kernel-backed tracer may.
pub const RESERVED_ENABLED_MASK: usize = 0xff << (usize::BITS - 8);

/// The maximum number of simultaneously attached callbacks per event.
pub const MAX_CALLBACKS: usize = 254;

/// A fixed-arity callback: invoked with the event's static description and
/// the caller-supplied argument vector.
pub type Callback = fn(&EventDescription, &ArgVec<'_>, priv_data: usize);

/// A variadic callback: additionally receives the call's dynamic struct of
/// extra, self-describing fields.
pub type VariadicCallback = fn(&EventDescription, &ArgVec<'_>, &DynamicStruct, priv_data: usize);

/// A statedump callback: identical to [`Callback`] except it additionally
/// receives the in-flight statedump's key. Attached and dispatched
/// independently of the event's normal live callbacks, since a tracer
/// observing one statedump episode must not see another's replay.
pub type StatedumpCallback = fn(&EventDescription, &ArgVec<'_>, key: u64, priv_data: usize);

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Fixed {}
    impl Sealed for super::Variadic {}
}

/// Marks whether an [`Event`] accepts only its statically declared fields
/// (`Fixed`) or additional dynamically-typed fields per call (`Variadic`).
/// Promoted to the type system so
/// that attaching the wrong callback flavor is a compile error rather than
/// a rejected runtime call.
pub trait EventKind: sealed::Sealed + Copy + Clone + fmt::Debug + Default + 'static {
    /// The callback function pointer type this event flavor accepts.
    type CallbackFn: Copy + PartialEq + 'static;
}

/// An event with no variadic extras: every call site supplies exactly the
/// event's declared fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fixed;

impl EventKind for Fixed {
    type CallbackFn = Callback;
}

/// An event that accepts extra, dynamically-typed fields per call in
/// addition to its statically declared ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct Variadic;

impl EventKind for Variadic {
    type CallbackFn = VariadicCallback;
}

/// A length + pointer pair wrapping the caller-supplied argument array,
/// passed to callbacks without copying.
pub struct ArgVec<'a> {
    args: &'a [Arg],
}

impl<'a> ArgVec<'a> {
    /// Wraps a borrowed argument slice.
    pub fn new(args: &'a [Arg]) -> Self {
        Self { args }
    }

    /// Returns the wrapped arguments.
    pub fn as_slice(&self) -> &[Arg] {
        self.args
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// True if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// One (name, dynamically-typed value) pair supplied as a variadic extra
/// field, plus its own attributes.
#[derive(Clone, Debug)]
pub struct DynamicField {
    name: Box<str>,
    value: Arg,
    attrs: Vec<Attribute>,
}

impl DynamicField {
    /// Creates a new dynamic field.
    pub fn new(name: impl Into<Box<str>>, value: Arg, attrs: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            value,
            attrs,
        }
    }

    /// Returns the field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field's value.
    pub fn value(&self) -> &Arg {
        &self.value
    }

    /// Returns the field's attributes.
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }
}

/// A list of extra fields a variadic call site supplies beyond the event's
/// statically declared fields.
#[derive(Clone, Debug, Default)]
pub struct DynamicStruct {
    fields: Vec<DynamicField>,
}

impl DynamicStruct {
    /// Creates an empty dynamic struct.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn push(&mut self, field: DynamicField) {
        self.fields.push(field);
    }

    /// Returns the fields in call order.
    pub fn fields(&self) -> &[DynamicField] {
        &self.fields
    }
}

#[derive(Clone, Copy)]
struct CallbackEntry<K: EventKind> {
    fn_ptr: K::CallbackFn,
    priv_data: usize,
}

/// An immutable snapshot of the callbacks attached to an event at one
/// point in time. Replaced, never mutated in place, so an in-flight
/// dispatch reading one snapshot is unaffected by a concurrent
/// attach/detach.
struct CallbackSlot<K: EventKind> {
    entries: Vec<CallbackEntry<K>>,
}

impl<K: EventKind> CallbackSlot<K> {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

#[derive(Clone, Copy)]
struct StatedumpEntry {
    fn_ptr: StatedumpCallback,
    priv_data: usize,
}

struct StatedumpSlot {
    entries: Vec<StatedumpEntry>,
}

impl StatedumpSlot {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// The mutable runtime state attached to one event: the fast-path
/// `enabled` flag and the RCU-protected callback array.
pub struct EventState<K: EventKind> {
    enabled: AtomicUsize,
    callbacks: AtomicPtr<CallbackSlot<K>>,
    nr_callbacks: AtomicUsize,
    statedump_callbacks: AtomicPtr<StatedumpSlot>,
}

impl<K: EventKind> Default for EventState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EventKind> EventState<K> {
    /// Creates a new, disabled event state with no attached callbacks.
    pub fn new() -> Self {
        let empty = Box::into_raw(Box::new(CallbackSlot::empty()));
        let empty_statedump = Box::into_raw(Box::new(StatedumpSlot::empty()));
        Self {
            enabled: AtomicUsize::new(0),
            callbacks: AtomicPtr::new(empty),
            nr_callbacks: AtomicUsize::new(0),
            statedump_callbacks: AtomicPtr::new(empty_statedump),
        }
    }

    /// Relaxed load of the fast-path enabled flag, masking off the
    /// kernel-reserved high byte.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        (self.enabled.load(Ordering::Relaxed) & !RESERVED_ENABLED_MASK) != 0
    }

    /// Raw load of `enabled`, reserved bits included; used by dispatch to
    /// decide whether to invoke the kernel-write hook contract.
    #[inline]
    pub fn enabled_raw(&self) -> usize {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Number of currently attached callbacks.
    pub fn callback_count(&self) -> usize {
        self.nr_callbacks.load(Ordering::Relaxed)
    }

    /// Publishes the empty callback array and waits out a grace period, as
    /// `unregister_events` does for every event in the group being torn
    /// down.
    pub(crate) fn drain_all(&self, rcu: &RcuGpState) {
        if self.nr_callbacks.load(Ordering::Relaxed) == 0 {
            return;
        }
        self.publish(Vec::new(), rcu);
        self.enabled.store(0, Ordering::Relaxed);
    }

    /// Consume-loads the current callback snapshot and invokes `visit` for
    /// each entry while an RCU read section is held open.
    pub(crate) fn dispatch_with<F: FnMut(K::CallbackFn, usize)>(&self, rcu: &RcuGpState, mut visit: F) {
        let _guard = rcu.read_lock();
        let ptr = self.callbacks.load(Ordering::Acquire);
        // Safety: `ptr` always points at a live `CallbackSlot` allocated by
        // `new`/`publish`; the pointee is only ever freed after
        // `wait_grace_period` has confirmed no reader holding an older
        // snapshot's guard can still be inside this closure.
        let slot = unsafe { &*ptr };
        for entry in &slot.entries {
            visit(entry.fn_ptr, entry.priv_data);
        }
    }

    fn publish(&self, new_entries: Vec<CallbackEntry<K>>, rcu: &RcuGpState) {
        let new_count = new_entries.len();
        let new_slot = Box::into_raw(Box::new(CallbackSlot {
            entries: new_entries,
        }));
        let old_ptr = self.callbacks.swap(new_slot, Ordering::AcqRel);
        rcu.wait_grace_period();
        // Safety: the grace period just proven elapsed guarantees no
        // reader still holds a `dispatch_with` snapshot of `old_ptr`.
        drop(unsafe { Box::from_raw(old_ptr) });
        self.nr_callbacks.store(new_count, Ordering::Relaxed);
    }

    /// Attaches a callback, returning `true` if this transitioned the
    /// event from disabled (`0` callbacks) to enabled.
    pub(crate) fn attach(
        &self,
        fn_ptr: K::CallbackFn,
        priv_data: usize,
        rcu: &RcuGpState,
    ) -> Result<bool, crate::error::Error> {
        let old_ptr = self.callbacks.load(Ordering::Acquire);
        // Safety: see `dispatch_with`; we only read, never mutate, the
        // pointee here, and it cannot be freed while `self.callbacks`
        // still points at it.
        let old = unsafe { &*old_ptr };
        if old.entries.len() >= MAX_CALLBACKS {
            return Err(crate::error::Error::Invalid("callback limit reached"));
        }
        for entry in &old.entries {
            if entry.fn_ptr == fn_ptr && entry.priv_data == priv_data {
                return Err(crate::error::Error::AlreadyExists);
            }
        }
        let mut new_entries = Vec::with_capacity(old.entries.len() + 1);
        new_entries.extend_from_slice(&old.entries);
        new_entries.push(CallbackEntry { fn_ptr, priv_data });
        let was_empty = old.entries.is_empty();
        self.publish(new_entries, rcu);
        if was_empty {
            let prev = self.enabled.fetch_add(1, Ordering::Relaxed);
            Ok((prev & !RESERVED_ENABLED_MASK) == 0)
        } else {
            Ok(false)
        }
    }

    /// Detaches a callback, returning `true` if this was the last one.
    pub(crate) fn detach(
        &self,
        fn_ptr: K::CallbackFn,
        priv_data: usize,
        rcu: &RcuGpState,
    ) -> Result<bool, crate::error::Error> {
        let old_ptr = self.callbacks.load(Ordering::Acquire);
        // Safety: see `attach`.
        let old = unsafe { &*old_ptr };
        let mut new_entries = Vec::with_capacity(old.entries.len().saturating_sub(1));
        let mut found = false;
        for entry in &old.entries {
            if !found && entry.fn_ptr == fn_ptr && entry.priv_data == priv_data {
                found = true;
                continue;
            }
            new_entries.push(*entry);
        }
        if !found {
            return Err(crate::error::Error::NotFound);
        }
        let now_empty = new_entries.is_empty();
        self.publish(new_entries, rcu);
        if now_empty {
            self.enabled.fetch_sub(1, Ordering::Relaxed);
        }
        Ok(now_empty)
    }

    /// Attaches a statedump replay callback, independent of this event's
    /// normal live callbacks.
    pub(crate) fn attach_statedump(
        &self,
        fn_ptr: StatedumpCallback,
        priv_data: usize,
        rcu: &RcuGpState,
    ) -> Result<(), crate::error::Error> {
        let old_ptr = self.statedump_callbacks.load(Ordering::Acquire);
        // Safety: see `attach`; the same publish/grace-period discipline
        // guards this pointer.
        let old = unsafe { &*old_ptr };
        if old.entries.len() >= MAX_CALLBACKS {
            return Err(crate::error::Error::Invalid("callback limit reached"));
        }
        for entry in &old.entries {
            if entry.fn_ptr == fn_ptr && entry.priv_data == priv_data {
                return Err(crate::error::Error::AlreadyExists);
            }
        }
        let mut new_entries = Vec::with_capacity(old.entries.len() + 1);
        new_entries.extend_from_slice(&old.entries);
        new_entries.push(StatedumpEntry { fn_ptr, priv_data });
        self.publish_statedump(new_entries, rcu);
        Ok(())
    }

    /// Detaches a previously attached statedump replay callback.
    pub(crate) fn detach_statedump(
        &self,
        fn_ptr: StatedumpCallback,
        priv_data: usize,
        rcu: &RcuGpState,
    ) -> Result<(), crate::error::Error> {
        let old_ptr = self.statedump_callbacks.load(Ordering::Acquire);
        // Safety: see `attach_statedump`.
        let old = unsafe { &*old_ptr };
        let mut new_entries = Vec::with_capacity(old.entries.len().saturating_sub(1));
        let mut found = false;
        for entry in &old.entries {
            if !found && entry.fn_ptr == fn_ptr && entry.priv_data == priv_data {
                found = true;
                continue;
            }
            new_entries.push(*entry);
        }
        if !found {
            return Err(crate::error::Error::NotFound);
        }
        self.publish_statedump(new_entries, rcu);
        Ok(())
    }

    fn publish_statedump(&self, new_entries: Vec<StatedumpEntry>, rcu: &RcuGpState) {
        let new_slot = Box::into_raw(Box::new(StatedumpSlot {
            entries: new_entries,
        }));
        let old_ptr = self.statedump_callbacks.swap(new_slot, Ordering::AcqRel);
        rcu.wait_grace_period();
        // Safety: see `publish`.
        drop(unsafe { Box::from_raw(old_ptr) });
    }

    /// Consume-loads the current statedump callback snapshot and invokes
    /// `visit` for each entry while an RCU read section is held open,
    /// mirroring `dispatch_with`.
    pub(crate) fn dispatch_statedump_with<F: FnMut(StatedumpCallback, usize)>(
        &self,
        rcu: &RcuGpState,
        mut visit: F,
    ) {
        let _guard = rcu.read_lock();
        let ptr = self.statedump_callbacks.load(Ordering::Acquire);
        // Safety: see `dispatch_with`.
        let slot = unsafe { &*ptr };
        for entry in &slot.entries {
            visit(entry.fn_ptr, entry.priv_data);
        }
    }
}

impl<K: EventKind> Drop for EventState<K> {
    fn drop(&mut self) {
        let ptr = self.callbacks.load(Ordering::Acquire);
        let statedump_ptr = self.statedump_callbacks.load(Ordering::Acquire);
        // Safety: no reader can be in a dispatch for an event whose
        // `EventState` is being dropped, since dropping requires exclusive
        // ownership (the registry only drops a state after unregistering
        // the event, which already waited out a grace period).
        drop(unsafe { Box::from_raw(ptr) });
        drop(unsafe { Box::from_raw(statedump_ptr) });
    }
}

/// Marker type tying a static [`EventDescription`] to its runtime
/// [`EventState`], parameterized by whether it accepts variadic extras.
pub struct Event<K: EventKind> {
    desc: EventDescription,
    state: EventState<K>,
    _kind: PhantomData<K>,
}

impl<K: EventKind> Event<K> {
    /// Creates a new, disabled event from its static description.
    pub fn new(desc: EventDescription) -> Self {
        Self {
            desc,
            state: EventState::new(),
            _kind: PhantomData,
        }
    }

    /// Returns the event's static description.
    pub fn description(&self) -> &EventDescription {
        &self.desc
    }

    /// Returns the event's runtime state.
    pub fn state(&self) -> &EventState<K> {
        &self.state
    }
}
