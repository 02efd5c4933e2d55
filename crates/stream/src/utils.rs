//! Internal helper macros.

/// Returns early with `$error` unless `$predicate` holds.
///
/// ```ignore
/// ensure!(!fragment.is_empty(), ParamError::EmptyFragment { count });
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
