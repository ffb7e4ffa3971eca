use crate::error::{Error, ErrorKind};

/// What a failed check does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorHandling {
    /// Pretend the check passed.
    Ignoring,
    /// Log and pretend the check passed.
    Logging,
    /// Log, then return the error.
    Testing,
    /// Return the error silently.
    Returning,
    /// Abort the process.
    Terminating,
}

/// Selected at compile time through the `check-*` cargo features.
pub const DEFAULT_ERROR_ACTION: ErrorHandling = if cfg!(feature = "check-ignoring") {
    ErrorHandling::Ignoring
} else if cfg!(feature = "check-logging") {
    ErrorHandling::Logging
} else if cfg!(feature = "check-returning") {
    ErrorHandling::Returning
} else if cfg!(feature = "check-terminating") {
    ErrorHandling::Terminating
} else {
    ErrorHandling::Testing
};

/// Check `cond` under the configured error action.
#[inline]
pub fn expect(cond: bool, kind: ErrorKind) -> Result<(), Error> {
    expect_as(DEFAULT_ERROR_ACTION, cond, kind)
}

pub fn expect_as(action: ErrorHandling, cond: bool, kind: ErrorKind) -> Result<(), Error> {
    if cond {
        return Ok(());
    }
    match action {
        ErrorHandling::Ignoring => Ok(()),
        ErrorHandling::Logging => {
            log::error!("flats error: {kind}");
            Ok(())
        }
        ErrorHandling::Testing => {
            log::error!("flats error: {kind}");
            Err(Error::new(kind))
        }
        ErrorHandling::Returning => Err(Error::new(kind)),
        ErrorHandling::Terminating => panic!("flats error: {kind}"),
    }
}

/// Check `cond` regardless of the configured action.
///
/// A failure here indicates buffer corruption, so the `Ignoring` and
/// `Logging` modes do not apply.
#[inline]
pub fn expect_always(cond: bool, kind: ErrorKind) -> Result<(), Error> {
    if cond {
        Ok(())
    } else {
        log::error!("flats error: {kind}");
        Err(Error::new(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes() {
        assert_eq!(expect_as(ErrorHandling::Ignoring, false, ErrorKind::BadInt), Ok(()));
        assert_eq!(expect_as(ErrorHandling::Logging, false, ErrorKind::BadInt), Ok(()));
        assert_eq!(
            expect_as(ErrorHandling::Testing, false, ErrorKind::BadInt),
            Err(Error::new(ErrorKind::BadInt))
        );
        assert_eq!(
            expect_as(ErrorHandling::Returning, false, ErrorKind::BadInt),
            Err(Error::new(ErrorKind::BadInt))
        );
        assert_eq!(expect_as(ErrorHandling::Terminating, true, ErrorKind::BadInt), Ok(()));
    }

    #[test]
    fn always() {
        assert_eq!(expect_always(true, ErrorKind::TailTooBig), Ok(()));
        assert_eq!(
            expect_always(false, ErrorKind::TailTooBig),
            Err(Error::new(ErrorKind::TailTooBig))
        );
    }
}
