use descriptor::raw::{DescriptorProto, EnumDescriptorProto};
use descriptor::{
    Declaration, DeclarationMut, DescriptorError, Extension, FieldType, File, FileDescriptorProto,
    Label,
};

const ALIAS: Extension<String> = Extension::new("shop.alias", 50001);
const SENSITIVE: Extension<bool> = Extension::new("shop.sensitive", 50002);
const MAX_LEN: Extension<i64> = Extension::new("shop.max_len", 50003);
const WEIGHT: Extension<f64> = Extension::new("shop.weight", 50004);

fn load_shop() -> File {
    let raw: FileDescriptorProto = serde_json::from_str(include_str!("resources/shop.json"))
        .expect("resource should parse");
    File::from_raw(&raw)
}

#[test]
fn e2e_wrap_descriptor_resource() {
    let file = load_shop();
    assert_eq!(file.name(), "shop/order.proto");
    assert_eq!(file.package(), "com.example.shop");
    assert_eq!(file.syntax(), Some("proto3"));
    assert_eq!(file.dependencies().len(), 2);

    let names: Vec<_> = file.messages().map(|m| m.full_name()).collect();
    assert_eq!(names, ["com.example.shop.Address", "com.example.shop.Order"]);

    let order = file.message_by_name("Order").unwrap();
    assert_eq!(order.path().to_string(), "4,1");
    assert_eq!(order.fields().len(), 7);

    let status = order.inner_enum("Status").unwrap();
    assert_eq!(status.full_name(), "com.example.shop.Order.Status");
    assert_eq!(status.path().to_string(), "4,1,4,0");
    assert_eq!(status.values().len(), 3);
    assert_eq!(
        status.value_by_number(2).map(|v| v.name()),
        Some("STATUS_SHIPPED")
    );

    let line_item = order.inner_message("LineItem").unwrap();
    assert_eq!(line_item.path().to_string(), "4,1,3,0");
    let quantity = line_item.field("quantity").unwrap();
    assert_eq!(quantity.path().to_string(), "4,1,3,0,2,1");
    assert_eq!(quantity.type_name(), "int32");
    assert!(quantity.is_deprecated());

    let currency = file.enum_by_name("Currency").unwrap();
    assert_eq!(currency.path().to_string(), "5,0");
    assert_eq!(currency.value("CURRENCY_USD").unwrap().path().to_string(), "5,0,2,1");

    let alias = file.extensions().next().unwrap();
    assert!(alias.is_extension());
    assert_eq!(alias.extendee(), Some(".google.protobuf.FieldOptions"));
    assert_eq!(alias.path().to_string(), "7,0");
}

#[test]
fn e2e_type_references_are_linked() {
    let file = load_shop();
    let order = file.find_message(".com.example.shop.Order").unwrap();

    let status = order.field("status").unwrap();
    assert_eq!(status.resolved_enum().map(|e| e.id()), order.inner_enum("Status").map(|e| e.id()));
    assert!(status.resolved_message().is_none());

    let items = order.field("items").unwrap();
    assert!(items.is_repeated());
    assert_eq!(items.resolved_message().unwrap().name(), "LineItem");

    let shipping = order.field("shipping").unwrap();
    assert_eq!(shipping.type_name(), "com.example.shop.Address");

    // Declared in another file.
    let created_at = order.field("created_at").unwrap();
    assert!(created_at.resolved_message().is_none());
    assert_eq!(created_at.type_name(), ".google.protobuf.Timestamp");

    for field in file.all_messages().flat_map(|m| m.fields().collect::<Vec<_>>()) {
        let raw = field.to_raw();
        if let Some(target) = field.resolved_enum() {
            assert_eq!(raw.type_name, Some(target.full_name()));
            assert_eq!(raw.r#type, Some(FieldType::Enum));
        }
        if let Some(target) = field.resolved_message() {
            assert_eq!(raw.type_name, Some(target.full_name()));
            assert_eq!(raw.r#type, Some(FieldType::Message));
        }
    }
}

#[test]
fn e2e_oneofs_and_services() {
    let file = load_shop();
    let order = file.message_by_name("Order").unwrap();
    let payment = order.oneof("payment").unwrap();
    assert_eq!(payment.path().to_string(), "4,1,8,0");
    let members: Vec<_> = payment.fields().map(|f| f.name()).collect();
    assert_eq!(members, ["card", "voucher"]);
    assert_eq!(order.field("card").unwrap().to_raw().oneof_index, Some(0));

    let service = file.service_by_name("OrderService").unwrap();
    assert_eq!(service.full_name(), "com.example.shop.OrderService");
    let place = service.method("PlaceOrder").unwrap();
    assert_eq!(place.input(), Some(order));
    assert_eq!(place.output(), Some(order));
    let watch = service.method("WatchOrder").unwrap();
    assert!(watch.server_streaming());
    assert!(watch.input().is_none());
    assert_eq!(watch.input_type(), ".google.protobuf.Empty");
    assert_eq!(watch.leading_comments(), Some(" Streams updates.\n"));
}

#[test]
fn e2e_comments_follow_paths() {
    let file = load_shop();
    let order = file.message_by_name("Order").unwrap();
    assert_eq!(
        order.leading_comments(),
        Some(" An order placed by a customer.\n")
    );
    assert_eq!(order.trailing_comments(), None);

    let status = order.inner_enum("Status").unwrap();
    assert_eq!(status.leading_comments(), Some(" Order lifecycle.\n"));
    assert_eq!(status.leading_detached_comments(), [" Statuses\n".to_string()]);

    let id = order.field("id").unwrap();
    assert_eq!(id.trailing_comments(), Some(" opaque id\n"));

    let address = file.message_by_name("Address").unwrap();
    assert!(address.comments().is_none());
    assert!(address.leading_detached_comments().is_empty());
}

#[test]
fn e2e_json_round_trip_keeps_paths_and_names() {
    let first = load_shop();
    let json = serde_json::to_string(&first.to_raw()).unwrap();
    let raw: FileDescriptorProto = serde_json::from_str(&json).unwrap();
    let second = File::from_raw(&raw);

    let describe = |file: &File| -> Vec<(String, String)> {
        file.all_messages()
            .map(|m| (m.path().to_string(), m.full_name()))
            .chain(file.all_enums().map(|e| (e.path().to_string(), e.full_name())))
            .collect()
    };
    assert_eq!(describe(&first), describe(&second));
    assert_eq!(first.to_raw(), second.to_raw());
    assert_eq!(
        second.message_by_name("Order").unwrap().leading_comments(),
        Some(" An order placed by a customer.\n")
    );
}

#[test]
fn e2e_build_file_from_scratch() {
    let mut file = File::new("foo.proto", "demo");
    let foo = file.add_message("Foo");
    let bar = file.message_mut(foo).unwrap().add_field("bar");
    file.field_mut(bar).unwrap().set_type("String").set_number(1);

    let raw = file.to_raw();
    let json = serde_json::to_value(&raw.message_type[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "Foo",
            "field": [{"name": "bar", "number": 1, "type": "TYPE_STRING"}]
        })
    );
    assert_eq!(file.field(bar).unwrap().path().to_string(), "4,0,2,0");
}

#[test]
fn e2e_nested_enum_path_after_wrap() {
    let raw = FileDescriptorProto {
        name: Some("a.proto".into()),
        message_type: vec![DescriptorProto {
            name: Some("Outer".into()),
            enum_type: vec![EnumDescriptorProto {
                name: Some("Kind".into()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    let file = File::from_raw(&raw);
    let kind = file.find_enum("Outer.Kind").unwrap();
    assert_eq!(kind.path().to_string(), "4,0,4,0");
    assert_eq!(kind.full_name(), "Outer.Kind");
}

#[test]
fn e2e_custom_options() {
    let mut file = load_shop();
    let order = file.message_by_name("Order").unwrap();
    let id = order.field("id").unwrap();
    assert_eq!(id.string_option(&ALIAS), "order_id");

    let address = file.message_by_name("Address").unwrap();
    assert!(!address.has_options());
    assert!(!address.bool_option(&SENSITIVE));
    assert_eq!(address.string_option(&ALIAS), "");
    assert_eq!(address.int64_option(&MAX_LEN), 0);
    assert_eq!(address.float64_option(&WEIGHT), 0.0);

    let street = address.field("street").unwrap().id();
    let mut street = file.field_mut(street).unwrap();
    street
        .set_bool_option(&SENSITIVE, true)
        .unwrap()
        .set_int64_option(&MAX_LEN, 120)
        .unwrap()
        .set_float64_option(&WEIGHT, 0.5)
        .unwrap()
        .set_label(Label::Optional);
    street.set_int64_option(&MAX_LEN, 80).unwrap();

    let bad = Extension::<bool>::new("shop.reserved", 19500);
    assert_eq!(
        street.set_bool_option(&bad, true).err(),
        Some(DescriptorError::InvalidExtensionTag {
            name: "shop.reserved",
            tag: 19500,
        })
    );

    let street = file.message_by_name("Address").unwrap().field("street").unwrap();
    assert!(street.bool_option(&SENSITIVE));
    assert_eq!(street.int64_option(&MAX_LEN), 80);
    assert_eq!(street.float64_option(&WEIGHT), 0.5);
    assert!(!street.has_option(&bad));
}

#[test]
fn e2e_invalid_tag_leaves_node_without_options() {
    let mut file = File::new("a.proto", "pkg");
    let foo = file.add_message("Foo");
    let low = Extension::<String>::new("pkg.low", 999);
    let result = file
        .message_mut(foo)
        .unwrap()
        .set_string_option(&low, "x")
        .map(|_| ());
    assert!(matches!(
        result,
        Err(DescriptorError::InvalidExtensionTag { tag: 999, .. })
    ));
    assert!(!file.message(foo).unwrap().has_options());
    assert!(file.to_raw().message_type[0].options.is_none());
}
