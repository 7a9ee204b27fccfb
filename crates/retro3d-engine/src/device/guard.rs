//! Translation of driver status codes into engine errors.
//!
//! Every driver call made by the engine goes through [`Guard::guard`] (usually
//! via the [`guard!`](crate::guard) macro, which records the call expression as
//! the operation name). A failed call becomes [`Error::Subsystem`] and the
//! caller returns immediately, so no dependent call is issued after a failure.

use crate::driver::DriverResult;

use super::error::{Error, Result};

pub trait Guard<T> {
    fn guard(self, call: &'static str) -> Result<T>;
}

impl<T> Guard<T> for DriverResult<T> {
    #[inline]
    fn guard(self, call: &'static str) -> Result<T> {
        self.map_err(|status| {
            log::debug!("call to {call} failed with status {status}");
            Error::Subsystem { call, status }
        })
    }
}

/// Runs a driver call and converts its status into an engine [`Result`].
///
/// ```ignore
/// guard!(driver.begin_scene(ctx))?;
/// ```
#[macro_export]
macro_rules! guard {
    ($call:expr) => {
        $crate::device::Guard::guard($call, stringify!($call))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Status;

    #[test]
    fn ok_passes_through() {
        let r: DriverResult<u32> = Ok(7);
        assert_eq!(r.guard("noop").unwrap(), 7);
    }

    #[test]
    fn failure_carries_call_and_status() {
        let r: DriverResult<()> = Err(Status::INVALID_CALL);
        match r.guard("driver.begin_scene(ctx)") {
            Err(Error::Subsystem { call, status }) => {
                assert_eq!(call, "driver.begin_scene(ctx)");
                assert_eq!(status, Status::INVALID_CALL);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn macro_names_the_expression() {
        fn failing(_x: u32) -> DriverResult<()> {
            Err(Status::NOT_FOUND)
        }
        let err = crate::guard!(failing(3)).unwrap_err();
        assert!(err.to_string().contains("failing(3)"));
        assert_eq!(err.status(), Some(Status::NOT_FOUND));
    }
}
