// Licensed under the MIT license.

#![warn(missing_docs)]

//! # SIDE: Static Instrumentation Dynamically Enabled
//!
//! `side-core` is the in-process, user-space runtime underneath [`side_types`]:
//! an RCU-protected event registry, a near-zero-cost dispatch fast path, and a
//! tracer-initiated statedump replay engine, all serialized through a single
//! reentrant lock so a tracer's own notification handler can safely call back
//! into the registry it was just notified from.
//!
//! # Overview
//!
//! - Describe your events once with [`side_types::describe_event`] and
//!   validate them with [`side_types::validate`].
//! - Hand a batch of [`side_types::EventDescription`]s to
//!   [`registry::global`]`().`[`register_events`](registry::Registry::register_events)
//!   to get back an [`EventsRegisterHandle`](registry::EventsRegisterHandle).
//! - At each instrumented call site, check
//!   [`EventState::is_enabled`](event::EventState::is_enabled) (or just call
//!   [`dispatch::dispatch`]/[`dispatch::dispatch_variadic`], which check it for
//!   you) before doing any work to build the event's arguments.
//! - A tracer calls [`registry::Registry::register_tracer`] to be notified of
//!   every past and future event, and [`registry::Registry::attach_fixed`] /
//!   [`registry::Registry::attach_variadic`] to start receiving dispatched
//!   calls for one event.
//! - A tracer that wants a one-time replay of current application state calls
//!   [`statedump::request_statedump`]; applications register how to produce
//!   that replay with [`statedump::StatedumpRequestHandle::register`].
//!
//! # Notes
//!
//! Nothing in this crate spawns a thread unless a
//! [`statedump::StatedumpMode::AgentThread`] request is registered, and at
//! most one such thread ever runs, shared by every agent-mode request.
//!
//! All cross-thread publication of callback arrays goes through the grace
//! period mechanism in [`rcu`]; dispatch never blocks on a lock, and
//! attach/detach/unregister never race a concurrent dispatch into reading a
//! half-freed callback array.

pub use error::Error;
pub use event::{
    ArgVec, Callback, DynamicField, DynamicStruct, Event, EventKind, EventState, Fixed,
    StatedumpCallback, Variadic, VariadicCallback, MAX_CALLBACKS, RESERVED_ENABLED_MASK,
};
pub use rcu::{assign_pointer, dereference, RcuGpState, ReadGuard, GRACE_PERIOD_POLL};
pub use registry::{
    global, AnyEvent, EventsRegisterHandle, Notification, Registry, TracerHandle,
};
pub use statedump::{request_statedump, StatedumpMode, StatedumpRequestHandle, LIVE_KEY};

pub use dispatch::{dispatch, dispatch_variadic, statedump_event_call, statedump_event_call_variadic};

mod dispatch;
mod error;
mod event;
mod rcu;
mod registry;
mod statedump;
