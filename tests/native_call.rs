use heap_rs::{
    binding::{self, HostValue, Operation},
    native::{self, NativeLibraries},
    value::{is_same, RawView, TaggedValue},
    HeapError,
};

extern "C" fn identity(x: isize) -> isize {
    x
}

/// Returns the second tagged argument, ignoring the rest.
extern "C" fn second(_a: isize, b: isize, _c: isize) -> isize {
    b
}

fn code_of(f: usize) -> RawView {
    RawView::unknown(f as *mut u8)
}

#[test]
fn test_identity_through_binding() {
    let f = code_of(identity as usize);
    let mut words = [0usize; 2];
    let buf = RawView::from_words(&mut words);
    unsafe {
        let n = binding::invoke(
            Operation::Call,
            &[f.into(), HostValue::Array(vec![HostValue::Number(77)])],
        )
        .unwrap();
        assert_eq!(n.as_number(), Some(77));

        let p = binding::invoke(
            Operation::Call,
            &[f.into(), HostValue::Array(vec![buf.into()])],
        )
        .unwrap();
        assert!(is_same(p.as_view().unwrap(), buf));
    }
}

#[test]
fn test_argument_order_is_preserved() {
    let f = code_of(second as usize);
    let args = [
        TaggedValue::Integer(1),
        TaggedValue::Integer(2),
        TaggedValue::Integer(3),
    ];
    let res = unsafe { native::call(f, &args) }.unwrap();
    assert_eq!(res.as_integer(), Some(2));
}

#[test]
fn test_missing_symbol() {
    let mut libs = NativeLibraries::system();
    let err = libs
        .get_function("libheap-rs-missing.so", "nothing")
        .unwrap_err();
    assert!(matches!(err, HeapError::Library { .. }), "{err}");
}

#[test]
#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn test_call_into_libc() {
    let mut libs = NativeLibraries::system();
    let labs = libs.get_function("libc.so.6", "labs").unwrap();
    assert!(libs.is_loaded("libc.so.6"));

    // labs(-5 << 1) == 10, which decodes back to 5
    let res = unsafe { native::call(labs, &[TaggedValue::Integer(-5)]) }.unwrap();
    assert_eq!(res.as_integer(), Some(5));

    let err = libs.get_function("libc.so.6", "no_such_symbol_here").unwrap_err();
    assert!(matches!(err, HeapError::Symbol { .. }));
}
