/// Emits a debug diagnostic on the `traceable` log target.
///
/// This is a thin wrapper over the `log` facade so that the library never
/// prints on its own.  Install any `log` compatible logger to see the output.
#[macro_export]
#[doc(hidden)]
macro_rules! traceable_debug {
    ($($arg:tt)*) => {
        ::log::debug!(target: "traceable", $($arg)*)
    };
}
