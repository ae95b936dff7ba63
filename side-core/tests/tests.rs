// Licensed under the MIT license.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use side_core::{
    dispatch, dispatch_variadic, global, request_statedump, statedump_event_call, AnyEvent,
    DynamicField, DynamicStruct, Event, Fixed, Notification, StatedumpMode,
    StatedumpRequestHandle, Variadic, LIVE_KEY,
};
use side_types::{
    describe_event, ArgKind, Attribute, AttrValue, ByteOrder, EventFlags, Field, IntegerType,
    LogLevel, StaticValue, Type, TypeKind,
};

fn unique_name(label: &str) -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    format!("{label}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

fn tick_event() -> Event<Fixed> {
    let desc = describe_event(
        "demo",
        unique_name("tick"),
        vec![
            Field::new("seq", Type::integer(32, false, ByteOrder::host())),
            Field::new("delta", Type::integer(64, true, ByteOrder::host())),
        ],
        vec![],
        LogLevel::Debug,
        EventFlags::NONE,
    );
    Event::new(desc)
}

fn kv_event() -> Event<Variadic> {
    let desc = describe_event(
        "demo",
        unique_name("kv"),
        vec![],
        vec![],
        LogLevel::Debug,
        EventFlags::VARIADIC,
    );
    Event::new(desc)
}

fn int_arg(v: i128) -> side_types::Arg {
    side_types::Arg::from_static(StaticValue::Integer(v))
}

// Scenario 1 / property P1: a dispatch on a fixed event with no callbacks
// attached has no user-visible side effects.
#[test]
fn fast_disabled_dispatch_is_silent() {
    let event = tick_event();
    let registry = global();
    for seq in 0..1_000 {
        dispatch(&event, registry.rcu(), &[int_arg(seq), int_arg(-seq)]);
    }
    assert_eq!(event.state().callback_count(), 0);
}

// Scenario 2 / property P2: after attach, the very next dispatch invokes the
// callback with the literal argument values supplied.
#[test]
fn attach_then_dispatch_observes_exact_values() {
    static SEEN: Mutex<Vec<(i128, i128)>> = Mutex::new(Vec::new());
    fn sink(_desc: &side_types::EventDescription, args: &side_core::ArgVec<'_>, _priv: usize) {
        let slice = args.as_slice();
        let seq = match slice[0].kind() {
            ArgKind::Static(StaticValue::Integer(v)) => *v,
            _ => panic!("expected integer seq"),
        };
        let delta = match slice[1].kind() {
            ArgKind::Static(StaticValue::Integer(v)) => *v,
            _ => panic!("expected integer delta"),
        };
        SEEN.lock().unwrap().push((seq, delta));
    }

    let event = tick_event();
    let registry = global();
    registry.attach_fixed(&event, sink, 0).unwrap();

    dispatch(&event, registry.rcu(), &[int_arg(42), int_arg(-7)]);

    assert_eq!(SEEN.lock().unwrap().last().copied(), Some((42, -7)));
    registry.detach_fixed(&event, sink, 0).unwrap();
}

// Property P5: a duplicate attach is rejected and leaves the callback array
// unchanged.
#[test]
fn duplicate_attach_is_rejected() {
    fn sink(_desc: &side_types::EventDescription, _args: &side_core::ArgVec<'_>, _priv: usize) {}

    let event = tick_event();
    let registry = global();
    registry.attach_fixed(&event, sink, 7).unwrap();
    let err = registry.attach_fixed(&event, sink, 7).unwrap_err();
    assert!(matches!(err, side_core::Error::AlreadyExists));
    assert_eq!(event.state().callback_count(), 1);
    registry.detach_fixed(&event, sink, 7).unwrap();
}

// Property P3 / scenario 3: concurrent dispatchers and an attach/detach
// controller. Once detach returns, no further invocations are recorded.
#[test]
fn concurrent_attach_detach_bounds_observed_callbacks() {
    static RECORDED: Mutex<Vec<u64>> = Mutex::new(Vec::new());
    fn sink(_desc: &side_types::EventDescription, args: &side_core::ArgVec<'_>, _priv: usize) {
        if let ArgKind::Static(StaticValue::Integer(v)) = args.as_slice()[0].kind() {
            RECORDED.lock().unwrap().push(*v as u64);
        }
    }
    RECORDED.lock().unwrap().clear();

    let event = Arc::new(tick_event());
    let registry = global();
    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let mut dispatchers = Vec::new();
    for t in 0..4u64 {
        let event = event.clone();
        let stop = stop.clone();
        dispatchers.push(std::thread::spawn(move || {
            let mut seq = t * 1_000_000;
            while !stop.load(Ordering::Relaxed) {
                dispatch(&event, registry.rcu(), &[int_arg(seq as i128), int_arg(0)]);
                seq += 1;
            }
        }));
    }

    for _ in 0..10 {
        registry.attach_fixed(&event, sink, 0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        registry.detach_fixed(&event, sink, 0).unwrap();
    }

    stop.store(true, Ordering::Relaxed);
    for d in dispatchers {
        d.join().unwrap();
    }

    let after_detach_count = RECORDED.lock().unwrap().len();
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(RECORDED.lock().unwrap().len(), after_detach_count);
}

// Scenario 4: a variadic event's dynamic fields arrive with the names and
// values supplied at the call site.
#[test]
fn variadic_dispatch_carries_dynamic_fields() {
    static SEEN: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());
    fn sink(
        _desc: &side_types::EventDescription,
        _args: &side_core::ArgVec<'_>,
        extra: &DynamicStruct,
        _priv: usize,
    ) {
        let mut seen = SEEN.lock().unwrap();
        seen.clear();
        for field in extra.fields() {
            let rendered = match field.value().kind() {
                ArgKind::Dynamic(dv) => match dv.value() {
                    StaticValue::Str(s) => s.to_string(),
                    StaticValue::Integer(v) => v.to_string(),
                    _ => "?".to_string(),
                },
                _ => "?".to_string(),
            };
            seen.push((field.name().to_string(), rendered));
        }
    }

    let event = kv_event();
    let registry = global();
    registry.attach_variadic(&event, sink, 0).unwrap();

    let mut extra = DynamicStruct::new();
    extra.push(DynamicField::new(
        "k",
        side_types::Arg::from_dynamic(side_types::DynamicValue::new(
            Type::utf8_str(),
            StaticValue::Str("alpha".into()),
        )),
        vec![],
    ));
    extra.push(DynamicField::new(
        "v",
        side_types::Arg::from_dynamic(side_types::DynamicValue::new(
            Type::integer(32, false, ByteOrder::host()),
            StaticValue::Integer(17),
        )),
        vec![],
    ));

    dispatch_variadic(&event, registry.rcu(), &[], &extra);

    let seen = SEEN.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], ("k".to_string(), "alpha".to_string()));
    assert_eq!(seen[1], ("v".to_string(), "17".to_string()));
    drop(seen);
    registry.detach_variadic(&event, sink, 0).unwrap();
}

// Property P4: a tracer registered after some events are already
// registered still receives Insert for all of them, and Remove when their
// handle is later unregistered.
#[test]
fn tracer_replay_covers_past_and_future_registrations() {
    let registry = global();
    let desc_a = describe_event(
        "demo",
        unique_name("replay-a"),
        vec![],
        vec![],
        LogLevel::Info,
        EventFlags::NONE,
    );
    let handle_a = registry.register_events(vec![desc_a]).unwrap();
    let a_name = handle_a.events()[0].description().name().to_string();

    let inserts: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let removes: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let inserts_cb = inserts.clone();
    let removes_cb = removes.clone();
    let tracer = registry.register_tracer(Arc::new(move |notif, event: &AnyEvent| {
        let name = event.description().name().to_string();
        match notif {
            Notification::Insert => inserts_cb.lock().unwrap().push(name),
            Notification::Remove => removes_cb.lock().unwrap().push(name),
        }
    }));

    // Already-registered event replayed immediately on join.
    assert!(inserts.lock().unwrap().iter().any(|n| n == &a_name));

    let desc_b = describe_event(
        "demo",
        unique_name("replay-b"),
        vec![],
        vec![],
        LogLevel::Info,
        EventFlags::NONE,
    );
    let handle_b = registry.register_events(vec![desc_b]).unwrap();
    let b_name = handle_b.events()[0].description().name().to_string();
    assert!(inserts.lock().unwrap().iter().any(|n| n == &b_name));

    registry.unregister_events(handle_b);
    assert!(removes.lock().unwrap().iter().any(|n| n == &b_name));

    registry.unregister_tracer(tracer);
    registry.unregister_events(handle_a);
}

thread_local! {
    static STATEDUMP_CTX: std::cell::RefCell<Option<(Arc<Event<Fixed>>, &'static side_core::Registry)>> =
        const { std::cell::RefCell::new(None) };
}

fn replay_three(key: u64) {
    STATEDUMP_CTX.with(|c| {
        let borrow = c.borrow();
        let (event, registry) = borrow.as_ref().expect("statedump context installed");
        for value in [1i128, 2, 3] {
            statedump_event_call(event, registry.rcu(), key, &[int_arg(value)]).unwrap();
        }
    });
}

// Scenario 5: a statedump request replays a fixed set of events under its
// own key, invisible to ordinary live dispatch and to other keys.
#[test]
fn statedump_replay_is_scoped_to_its_key() {
    static EMITTED: Mutex<Vec<(u64, i128)>> = Mutex::new(Vec::new());
    fn sink(
        _desc: &side_types::EventDescription,
        args: &side_core::ArgVec<'_>,
        key: u64,
        _priv: usize,
    ) {
        if let ArgKind::Static(StaticValue::Integer(v)) = args.as_slice()[0].kind() {
            EMITTED.lock().unwrap().push((key, *v));
        }
    }
    EMITTED.lock().unwrap().clear();

    let event = Arc::new(tick_event());
    let registry = global();
    registry.attach_statedump_fixed(&event, sink, 0).unwrap();
    STATEDUMP_CTX.with(|c| *c.borrow_mut() = Some((event.clone(), registry)));

    let handle =
        StatedumpRequestHandle::register(unique_name("snapshot"), replay_three, StatedumpMode::PollingThread)
            .unwrap();

    let key = request_statedump();
    handle.poll();

    let emitted = EMITTED.lock().unwrap();
    let under_key: Vec<_> = emitted.iter().filter(|(k, _)| *k == key).collect();
    assert_eq!(under_key.len(), 3);
    assert!(under_key.iter().all(|(k, _)| *k != LIVE_KEY));

    // Live dispatch never reaches the statedump-only callback.
    drop(emitted);
    dispatch(&event, registry.rcu(), &[int_arg(99)]);
    assert!(EMITTED
        .lock()
        .unwrap()
        .iter()
        .all(|(_, v)| *v != 99));
}

// Scenario 6 / ABI guard: a description with a structurally invalid type is
// rejected by the registry rather than silently accepted.
#[test]
fn register_events_rejects_ill_formed_description() {
    let registry = global();
    let bad_integer = Type::new(TypeKind::Integer(IntegerType {
        width: 8,
        signed: false,
        byte_order: ByteOrder::host(),
        effective_bits: 4,
        offset_bits: 6,
    }));
    let desc = describe_event(
        "demo",
        unique_name("bad"),
        vec![Field::new("broken", bad_integer)],
        vec![Attribute::new("doc", AttrValue::Str("bad bitfield".into()))],
        LogLevel::Info,
        EventFlags::NONE,
    );
    let err = registry.register_events(vec![desc]).unwrap_err();
    assert!(matches!(err, side_core::Error::Invalid(_)));
}
