// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::ConvertError;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub type EngineResult<T> = std::result::Result<T, ConvertError>;

/// Run a codec call, turning a panic into `ConvertError::InternalPanic`.
///
/// mozjpeg reports libjpeg errors by unwinding, and the other native codecs
/// may panic on hostile input; none of that may escape a conversion.
pub fn run_with_panic_policy<T, F>(stage: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(stage, %message, "codec panicked");
            Err(ConvertError::internal_panic(format!("{stage}: {message}")))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn passes_through_ok_and_err() {
        assert_eq!(run_with_panic_policy("t", || Ok(5)).unwrap(), 5);
        let err = run_with_panic_policy::<(), _>("t", || {
            Err(ConvertError::decode_failed("nope"))
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn panic_becomes_internal_error() {
        let err = run_with_panic_policy::<(), _>("decode:test", || panic!("boom")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalBug);
        assert!(err.to_string().contains("decode:test: boom"));
    }
}
