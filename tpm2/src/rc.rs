//! Response code decoding.
//!
//! A response code is either format 0 (bit 7 clear), carrying a warning or
//! error that is not tied to part of the command, or format 1 (bit 7 set),
//! carrying an error together with the index of the handle, parameter or
//! session that caused it.

use std::fmt::{self, Display};

use serde::Serialize;
use tracing::debug;

use crate::constants::{CommandCode, ResponseCode};
use crate::error::{Error, Result};

const FORMAT_MASK: u32 = 1 << 7;

const FMT0_ERROR_CODE_MASK: u32 = 0x7f;
const FMT0_VERSION_MASK: u32 = 1 << 8;
const FMT0_VENDOR_MASK: u32 = 1 << 10;
const FMT0_SEVERITY_MASK: u32 = 1 << 11;

const FMT1_ERROR_CODE_MASK: u32 = 0x3f;
const FMT1_PARAMETER_INDEX_MASK: u32 = 0xf00;
const FMT1_HANDLE_OR_SESSION_INDEX_MASK: u32 = 0x700;
const FMT1_PARAMETER_MASK: u32 = 1 << 6;
const FMT1_SESSION_MASK: u32 = 1 << 11;

const FMT1_INDEX_SHIFT: u32 = 8;

macro_rules! code_table {
    (
        $(#[$attr:meta])*
        $ty:ident, $table:ident {
            $($value:literal => $name:literal, $desc:literal;)*
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub struct $ty(pub u8);

        static $table: &[(u8, &str, &str)] = &[$(($value, $name, $desc),)*];

        impl $ty {
            fn entry(&self) -> Option<&'static (u8, &'static str, &'static str)> {
                $table.iter().find(|(value, _, _)| *value == self.0)
            }

            /// TPM name without the `TPM_RC_` prefix.
            pub fn name(&self) -> Option<&'static str> {
                self.entry().map(|(_, name, _)| *name)
            }

            pub fn description(&self) -> Option<&'static str> {
                self.entry().map(|(_, _, desc)| *desc)
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => write!(f, "TPM_RC_{name}"),
                    None => write!(f, "{:#04x}", self.0),
                }
            }
        }
    };
}

code_table! {
    /// Format-zero error code, not associated with a handle, parameter or
    /// session.
    ErrorCode0, ERROR_CODE0_TABLE {
        0x00 => "INITIALIZE", "TPM not initialized by TPM2_Startup or already initialized";
        0x01 => "FAILURE", "commands not being accepted because of a TPM failure";
        0x03 => "SEQUENCE", "improper use of a sequence handle";
        0x0b => "PRIVATE", "not currently used";
        0x19 => "HMAC", "not currently used";
        0x20 => "DISABLED", "the command is disabled";
        0x21 => "EXCLUSIVE", "command failed because audit sequence required exclusivity";
        0x24 => "AUTH_TYPE", "authorization handle is not correct for command";
        0x25 => "AUTH_MISSING", "command requires an authorization session for handle and it is not present";
        0x26 => "POLICY", "policy failure in math operation or an invalid authPolicy value";
        0x27 => "PCR", "PCR check fail";
        0x28 => "PCR_CHANGED", "PCR have changed since checked";
        0x2d => "UPGRADE", "the TPM is in field upgrade mode unless called via TPM2_FieldUpgradeData(), then it is not in field upgrade mode";
        0x2e => "TOO_MANY_CONTEXTS", "context ID counter is at maximum";
        0x2f => "AUTH_UNAVAILABLE", "authValue or authPolicy is not available for selected entity";
        0x30 => "REBOOT", "a _TPM_Init and Startup(CLEAR) is required before the TPM can resume operation";
        0x31 => "UNBALANCED", "the protection algorithms (hash and symmetric) are not reasonably balanced";
        0x42 => "COMMAND_SIZE", "command commandSize value is inconsistent with contents of the command buffer";
        0x43 => "COMMAND_CODE", "command code not supported";
        0x44 => "AUTHSIZE", "the value of authorizationSize is out of range or the number of octets in the Authorization Area is greater than required";
        0x45 => "AUTH_CONTEXT", "use of an authorization session with a context command or another command that cannot have an authorization session";
        0x46 => "NV_RANGE", "NV offset+size is out of range";
        0x47 => "NV_SIZE", "Requested allocation size is larger than allowed";
        0x48 => "NV_LOCKED", "NV access locked";
        0x49 => "NV_AUTHORIZATION", "NV access authorization fails in command actions";
        0x4a => "NV_UNINITIALIZED", "an NV Index is used before being initialized or the state saved by TPM2_Shutdown(STATE) could not be restored";
        0x4b => "NV_SPACE", "insufficient space for NV allocation";
        0x4c => "NV_DEFINED", "NV Index or persistent object already defined";
        0x50 => "BAD_CONTEXT", "context in TPM2_ContextLoad() is not valid";
        0x51 => "CPHASH", "cpHash value already set or not correct for use";
        0x52 => "PARENT", "handle for parent is not a valid parent";
        0x53 => "NEEDS_TEST", "some function needs testing";
        0x54 => "NO_RESULT", "returned when an internal function cannot process a request due to an unspecified problem";
        0x55 => "SENSITIVE", "the sensitive area did not unmarshal correctly after decryption";
    }
}

code_table! {
    /// Format-one error code, associated with a handle, parameter or
    /// session.
    ErrorCode1, ERROR_CODE1_TABLE {
        0x01 => "ASYMMETRIC", "asymmetric algorithm not supported or not correct";
        0x02 => "ATTRIBUTES", "inconsistent attributes";
        0x03 => "HASH", "hash algorithm not supported or not appropriate";
        0x04 => "VALUE", "value is out of range or is not correct for the context";
        0x05 => "HIERARCHY", "hierarchy is not enabled or is not correct for the use";
        0x07 => "KEY_SIZE", "key size is not supported";
        0x08 => "MGF", "mask generation function not supported";
        0x09 => "MODE", "mode of operation not supported";
        0x0a => "TYPE", "the type of the value is not appropriate for the use";
        0x0b => "HANDLE", "the handle is not correct for the use";
        0x0c => "KDF", "unsupported key derivation function or function not appropriate for use";
        0x0d => "RANGE", "value was out of allowed range";
        0x0e => "AUTH_FAIL", "the authorization HMAC check failed and DA counter incremented";
        0x0f => "NONCE", "invalid nonce size or nonce value mismatch";
        0x10 => "PP", "authorization requires assertion of PP";
        0x12 => "SCHEME", "unsupported or incompatible scheme";
        0x15 => "SIZE", "structure is the wrong size";
        0x16 => "SYMMETRIC", "unsupported symmetric algorithm or key size, or not appropriate for instance";
        0x17 => "TAG", "incorrect structure tag";
        0x18 => "SELECTOR", "union selector is incorrect";
        0x1a => "INSUFFICIENT", "the TPM was unable to unmarshal a value because there were not enough octets in the input buffer";
        0x1b => "SIGNATURE", "the signature is not valid";
        0x1c => "KEY", "key fields are not compatible with the selected use";
        0x1d => "POLICY_FAIL", "a policy check failed";
        0x1f => "INTEGRITY", "integrity check failed";
        0x20 => "TICKET", "invalid ticket";
        0x21 => "RESERVED_BITS", "reserved bits not set to zero as required";
        0x22 => "BAD_AUTH", "authorization failure without DA implications";
        0x23 => "EXPIRED", "the policy has expired";
        0x24 => "POLICY_CC", "the commandCode in the policy is not the commandCode of the command or the command code in a policy command references a command that is not implemented";
        0x25 => "BINDING", "public and sensitive portions of an object are not cryptographically bound";
        0x26 => "CURVE", "curve not supported";
        0x27 => "ECC_POINT", "point is not on the required curve";
    }
}

code_table! {
    /// Format-zero warning code. Warnings describe conditions that are not
    /// necessarily errors, and the command may succeed when retried.
    WarningCode, WARNING_CODE_TABLE {
        0x01 => "CONTEXT_GAP", "gap for context ID is too large";
        0x02 => "OBJECT_MEMORY", "out of memory for object contexts";
        0x03 => "SESSION_MEMORY", "out of memory for session contexts";
        0x04 => "MEMORY", "out of shared object/session memory or need space for internal operations";
        0x05 => "SESSION_HANDLES", "out of session handles; a session must be flushed before a new session may be created";
        0x06 => "OBJECT_HANDLES", "out of object handles; the handle space for objects is depleted and a reboot is required";
        0x07 => "LOCALITY", "bad locality";
        0x08 => "YIELDED", "the TPM has suspended operation on the command; forward progress was made and the command may be retried";
        0x09 => "CANCELED", "the command was canceled";
        0x0a => "TESTING", "TPM is performing self-tests";
        0x10 => "REFERENCE_H0", "the 1st handle in the handle area references a transient object or session that is not loaded";
        0x11 => "REFERENCE_H1", "the 2nd handle in the handle area references a transient object or session that is not loaded";
        0x12 => "REFERENCE_H2", "the 3rd handle in the handle area references a transient object or session that is not loaded";
        0x13 => "REFERENCE_H3", "the 4th handle in the handle area references a transient object or session that is not loaded";
        0x14 => "REFERENCE_H4", "the 5th handle in the handle area references a transient object or session that is not loaded";
        0x15 => "REFERENCE_H5", "the 6th handle in the handle area references a transient object or session that is not loaded";
        0x16 => "REFERENCE_H6", "the 7th handle in the handle area references a transient object or session that is not loaded";
        0x18 => "REFERENCE_S0", "the 1st authorization session handle references a session that is not loaded";
        0x19 => "REFERENCE_S1", "the 2nd authorization session handle references a session that is not loaded";
        0x1a => "REFERENCE_S2", "the 3rd authorization session handle references a session that is not loaded";
        0x1b => "REFERENCE_S3", "the 4th authorization session handle references a session that is not loaded";
        0x1c => "REFERENCE_S4", "the 5th authorization session handle references a session that is not loaded";
        0x1d => "REFERENCE_S5", "the 6th authorization session handle references a session that is not loaded";
        0x1e => "REFERENCE_S6", "the 7th authorization session handle references a session that is not loaded";
        0x20 => "NV_RATE", "the TPM is rate-limiting accesses to prevent wearout of NV";
        0x21 => "LOCKOUT", "authorizations for objects subject to DA protection are not allowed at this time because the TPM is in DA lockout mode";
        0x22 => "RETRY", "the TPM was not able to start the command";
        0x23 => "NV_UNAVAILABLE", "the command may require writing of NV and NV is not current accessible";
    }
}

/// Decodes `code`, returned by the TPM in response to `command`.
///
/// Returns `Ok(())` for [`ResponseCode::SUCCESS`] and the matching [`Error`]
/// otherwise. Indices are 1-based as reported by the TPM; an index of 0 is
/// returned unchanged.
pub fn decode_response_code(command: CommandCode, code: ResponseCode) -> Result<()> {
    let rc = code.0;
    if code.is_success() {
        return Ok(());
    }

    let err = if rc & FORMAT_MASK == 0 {
        if rc & FMT0_VERSION_MASK == 0 {
            Error::Tpm1 { command, code }
        } else if rc & FMT0_VENDOR_MASK != 0 {
            Error::Vendor { command, code }
        } else if rc & FMT0_SEVERITY_MASK != 0 {
            Error::Warning {
                command,
                code: WarningCode((rc & FMT0_ERROR_CODE_MASK) as u8),
            }
        } else {
            Error::Error {
                command,
                code: ErrorCode0((rc & FMT0_ERROR_CODE_MASK) as u8),
            }
        }
    } else {
        let error_code = ErrorCode1((rc & FMT1_ERROR_CODE_MASK) as u8);
        if rc & FMT1_PARAMETER_MASK != 0 {
            Error::Parameter {
                command,
                code: error_code,
                index: ((rc & FMT1_PARAMETER_INDEX_MASK) >> FMT1_INDEX_SHIFT) as u8,
            }
        } else if rc & FMT1_SESSION_MASK != 0 {
            Error::Session {
                command,
                code: error_code,
                index: ((rc & FMT1_HANDLE_OR_SESSION_INDEX_MASK) >> FMT1_INDEX_SHIFT) as u8,
            }
        } else {
            Error::Handle {
                command,
                code: error_code,
                index: ((rc & FMT1_HANDLE_OR_SESSION_INDEX_MASK) >> FMT1_INDEX_SHIFT) as u8,
            }
        }
    };

    debug!(%command, %code, "TPM returned an unsuccessful response code");
    Err(err)
}
