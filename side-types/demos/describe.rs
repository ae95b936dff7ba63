// Licensed under the MIT license.

//! Shows how an event's static shape is described with `side-types` alone,
//! with no provider, no registry, and no dispatch involved.

use side_types::*;

fn main() {
    let desc = describe_event(
        "Contoso_Webserver",
        "RequestCompleted",
        vec![
            Field::new("path", Type::utf8_str()),
            Field::new("status", Type::integer(16, false, ByteOrder::host())),
            Field::new(
                "duration_ms",
                Type::with_attrs(
                    TypeKind::Integer(IntegerType::plain(32, false, ByteOrder::host())),
                    vec![Attribute::new("unit", AttrValue::Str("ms".into()))],
                ),
            ),
        ],
        vec![],
        LogLevel::Info,
        EventFlags::NONE,
    );

    validate(&desc).expect("well-formed description");

    println!(
        "{}/{}: {} fields, level={}",
        desc.provider(),
        desc.name(),
        desc.fields().len(),
        desc.level(),
    );

    struct FieldPrinter;
    impl TypeVisitor for FieldPrinter {
        fn visit_integer(&mut self, ty: &IntegerType) {
            println!("  integer: width={} signed={}", ty.width, ty.signed);
        }
        fn visit_str(&mut self, _ty: &StrType) {
            println!("  str");
        }
    }
    walk_description(&mut FieldPrinter, &desc);
}
