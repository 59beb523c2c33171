//! Maps [`ecap_core::error::EcapError`] (and the CLI's own I/O failures) to
//! process exit codes.

use ecap_core::error::EcapError;
use std::process::ExitCode;

pub const EXIT_USAGE: u8 = 64;
pub const EXIT_IO: u8 = 2;
pub const EXIT_SOFTWARE: u8 = 1;

/// The input (carrier, password, or message) was wrong in some way the
/// caller can fix. I/O failures get their own code; anything left over is
/// treated as an internal invariant violation.
pub fn exit_code_for_ecap_error(error: &EcapError) -> ExitCode {
    use EcapError::*;

    match error {
        CarrierUnrecognized
        | CarrierMalformed(_)
        | CarrierTooSmall
        | JpegSegmentOverflow
        | NoPayload
        | BadHeader(_)
        | UnsupportedVersion
        | KdfUnsupported
        | AuthFail => ExitCode::from(EXIT_USAGE),
        Cancelled => ExitCode::from(EXIT_SOFTWARE),
    }
}

pub fn exit_code_for_io_error(_error: &std::io::Error) -> ExitCode {
    ExitCode::from(EXIT_IO)
}

pub fn exit_code_for_prompt_error(error: &crate::prompt::PromptError) -> ExitCode {
    use crate::prompt::PromptError::*;

    match error {
        Io(_) => ExitCode::from(EXIT_IO),
        Empty => ExitCode::from(EXIT_USAGE),
    }
}
