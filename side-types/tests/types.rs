// Licensed under the MIT license.

use side_types::*;

#[test]
fn describe_event_builds_and_reports() {
    let desc = describe_event(
        "MyCompany_MyComponent",
        "UserLoggedIn",
        vec![
            Field::new("user_id", Type::integer(64, false, ByteOrder::host())),
            Field::new("name", Type::utf8_str()),
        ],
        vec![Attribute::new("doc", AttrValue::Str("who logged in".into()))],
        LogLevel::Info,
        EventFlags::NONE,
    );

    assert_eq!(desc.provider(), "MyCompany_MyComponent");
    assert_eq!(desc.name(), "UserLoggedIn");
    assert_eq!(desc.fields().len(), 2);
    assert_eq!(desc.level(), LogLevel::Info);
    assert!(!desc.is_variadic());
    assert_eq!(desc.abi_version(), ABI_VERSION);
}

#[test]
fn variadic_flag_round_trips() {
    let desc = describe_event(
        "Prov",
        "Ev",
        vec![],
        vec![],
        LogLevel::Debug,
        EventFlags::VARIADIC,
    );
    assert!(desc.is_variadic());
    assert!(desc.flags().contains(EventFlags::VARIADIC));
}

#[test]
fn validate_accepts_well_formed_struct() {
    let desc = describe_event(
        "Prov",
        "Ev",
        vec![Field::new(
            "point",
            Type::struct_of(vec![
                Field::new("x", Type::integer(32, true, ByteOrder::host())),
                Field::new("y", Type::integer(32, true, ByteOrder::host())),
            ]),
        )],
        vec![],
        LogLevel::Info,
        EventFlags::NONE,
    );
    assert!(validate(&desc).is_ok());
}

#[test]
fn validate_rejects_bit_window_past_storage() {
    let bad = Type::new(TypeKind::Integer(IntegerType {
        width: 8,
        signed: false,
        byte_order: ByteOrder::host(),
        effective_bits: 4,
        offset_bits: 6,
    }));
    let desc = describe_event(
        "Prov",
        "Ev",
        vec![Field::new("bitfield", bad)],
        vec![],
        LogLevel::Info,
        EventFlags::NONE,
    );
    assert_eq!(
        validate(&desc),
        Err(TypeError::BitWindowOutOfBounds {
            offset: 6,
            effective: 4,
            width: 8,
        })
    );
}

#[test]
fn validate_rejects_nested_gather_vla() {
    let inner_vla = GatherKind::Vla {
        length: Box::new(Type::integer(32, false, ByteOrder::host())),
        element: Box::new(GatherType {
            offset: 0,
            access_mode: AccessMode::Direct,
            kind: GatherKind::Byte,
        }),
    };
    let outer = Type::new(TypeKind::Gather(GatherType {
        offset: 0,
        access_mode: AccessMode::Direct,
        kind: GatherKind::Array(Box::new(GatherType {
            offset: 0,
            access_mode: AccessMode::Direct,
            kind: inner_vla,
        })),
    }));
    let desc = describe_event(
        "Prov",
        "Ev",
        vec![Field::new("data", outer)],
        vec![],
        LogLevel::Info,
        EventFlags::NONE,
    );
    assert_eq!(validate(&desc), Err(TypeError::NestedGatherVla));
}

#[test]
fn walk_description_visits_every_leaf() {
    struct Counter {
        integers: usize,
        strings: usize,
    }
    impl TypeVisitor for Counter {
        fn visit_integer(&mut self, _ty: &IntegerType) {
            self.integers += 1;
        }
        fn visit_str(&mut self, _ty: &StrType) {
            self.strings += 1;
        }
    }

    let desc = describe_event(
        "Prov",
        "Ev",
        vec![
            Field::new("a", Type::integer(32, true, ByteOrder::host())),
            Field::new("b", Type::utf8_str()),
            Field::new("c", Type::integer(64, false, ByteOrder::host())),
        ],
        vec![],
        LogLevel::Info,
        EventFlags::NONE,
    );

    let mut counter = Counter {
        integers: 0,
        strings: 0,
    };
    walk_description(&mut counter, &desc);
    assert_eq!(counter.integers, 2);
    assert_eq!(counter.strings, 1);
}

#[test]
fn dynamic_value_carries_its_own_type() {
    let dv = DynamicValue::new(Type::bool(), StaticValue::Bool(true));
    assert_eq!(dv.ty().tag(), TypeTag::Bool);
    assert_eq!(dv.value(), &StaticValue::Bool(true));
}
