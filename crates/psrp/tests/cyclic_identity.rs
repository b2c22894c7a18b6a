//! Crate-level cyclic/self-referential object scenarios, reached through
//! the same public `clixml::encode`/`decode` pair an embedder uses for any
//! other message body.

use std::cell::RefCell;
use std::rc::Rc;

use psrp::clixml;
use psrp::value::{ComplexObject, PsProperty, PsType, PsValue};

#[test]
fn a_root_object_that_points_back_at_itself_keeps_its_identity() {
    let shared = Rc::new(RefCell::new(
        ComplexObject::standard().with_type(PsType::new(vec!["Cyclic".into()])),
    ));
    shared.borrow_mut().extended_properties.insert(
        "Self".to_string(),
        PsProperty::new("Self", PsValue::Shared(shared.clone())),
    );
    let value = PsValue::Shared(shared);

    let bytes = clixml::encode(&value, None).unwrap();
    let decoded = clixml::decode(&bytes, None).unwrap();

    let PsValue::Shared(root) = &decoded else {
        panic!("expected a cyclic object to decode back to a Shared handle, got {decoded:?}");
    };
    let self_prop = root.borrow().get_extended("Self").cloned().expect("Self property");
    let PsValue::Shared(looped_back) = self_prop else {
        panic!("expected Self to decode back to a Shared handle");
    };
    assert!(
        Rc::ptr_eq(root, &looped_back),
        "obj.Self must point back at obj itself, not a copy"
    );
}

#[test]
fn a_non_cyclic_object_still_decodes_to_a_plain_object() {
    let value = PsValue::Object(ComplexObject::standard().with_extended("Name", "plain"));
    let bytes = clixml::encode(&value, None).unwrap();
    let decoded = clixml::decode(&bytes, None).unwrap();
    assert!(matches!(decoded, PsValue::Object(_)));
}
