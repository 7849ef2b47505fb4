/// Destructures host arguments by variant, bailing out with the operation's argument error if
/// there are too few or one has the wrong kind. Extra trailing arguments are ignored.
///
/// ```ignore
/// expect_args!(args, Operation::IsSame, [View(a), View(b)]);
/// ```
macro_rules! expect_args {
    ($args:expr, $op:expr, [ $($variant:ident($name:ident)),+ $(,)? ]) => {
        let mut args_iter = $args.iter();
        $(
            let $name = match args_iter.next() {
                Some($crate::binding::HostValue::$variant(v)) => v.clone(),
                _ => return Err($op.argument_error()),
            };
        )+
    };
}

/// Converts a host number into an unsigned quantity, or bails out with the argument error.
macro_rules! expect_unsigned {
    ($value:expr, $op:expr) => {
        match $value.try_into() {
            Ok(v) => v,
            Err(_) => return Err($op.argument_error()),
        }
    };
}
