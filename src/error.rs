use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into three groups that matter to callers in different ways. Errors about
/// the preload data itself are internal: they indicate that a database and its decoder disagree,
/// and policy resolution fails open on them. Errors about the peer (its URL or certificate chain)
/// and the final pin verdict are what a TLS verification callback reports to its library.
///
/// # Error Categories
///
/// ## Preload Data Errors
/// - [`Error::Malformed`] - Inconsistent trie, Huffman table or container fields
/// - [`Error::OutOfBounds`] - A bit or byte cursor ran past its buffer
/// - [`Error::NotSupported`] - Unknown container magic or version
/// - [`Error::Empty`] - Empty input provided
///
/// ## Verification Errors
/// - [`Error::InvalidUrl`] - No host could be extracted from a URL
/// - [`Error::NoUrlData`] - No URL was registered for the verifying thread
/// - [`Error::InvalidCertificate`] - A chain entry is not a decodable X.509 certificate
/// - [`Error::InvalidPeerCertChain`] - The chain is empty or does not end in a self-signed root
/// - [`Error::PubkeyMismatch`] - Pin verification rejected the chain
///
/// ## Other Errors
/// - [`Error::InvalidParameter`] - Rejected input to a builder or codec
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::InternalError`] - Unimplemented or unexpected internal state
///
/// # Examples
///
/// ```rust
/// use pinscope::{Error, PreloadedDatabase};
///
/// match PreloadedDatabase::from_bytes(b"not a database") {
///     Ok(_) => unreachable!(),
///     Err(Error::NotSupported) => println!("not a pin database"),
///     Err(Error::Malformed { message, file, line }) => {
///         println!("malformed: {message} ({file}:{line})");
///     }
///     Err(e) => println!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The preload data is damaged or inconsistent.
    ///
    /// Raised when a Huffman node points outside its table, a trie jump lands outside the
    /// bit-stream, or a container field contradicts another one. The error carries the source
    /// location that detected it.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A read would have gone past the end of a buffer.
    ///
    /// Used by both the byte-level [`crate::Parser`] and the bit-level trie cursor.
    #[error("Out of Bound read would have occurred - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The input is not a pin database this version understands.
    #[error("This database format is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// No host could be extracted from the given URL.
    #[error("Invalid URL - {0}")]
    InvalidUrl(String),

    /// The verifying thread has no current URL registered.
    #[error("No URL registered for the current thread")]
    NoUrlData,

    /// A certificate in the peer chain could not be decoded.
    #[error("Invalid certificate - {0}")]
    InvalidCertificate(String),

    /// The peer chain is empty or incomplete.
    ///
    /// Pins can be placed on any key up to the root, so hashing a chain that stops short of a
    /// self-signed certificate would silently skip pins on the missing part.
    #[error("Invalid peer certificate chain - {0}")]
    InvalidPeerCertChain(String),

    /// None of the chain's public keys satisfied the host's pinset, or the host was denied.
    #[error("Public key pin mismatch - {0}")]
    PubkeyMismatch(String),

    /// Input handed to a builder or codec was rejected.
    #[error("Invalid parameter - {0}")]
    InvalidParameter(String),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// An internal invariant did not hold, or an unimplemented path was selected.
    #[error("Internal error - {0}")]
    InternalError(String),
}

impl Error {
    /// The boundary code this error is reported as.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

/// Stable integer codes reported across the adapter boundary.
///
/// TLS integration layers translate these into their own library's error values, so the
/// numbers never change between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[repr(i32)]
pub enum ErrorCode {
    /// Success
    None = 0,
    /// The URL could not be parsed into a host
    InvalidUrl = -2,
    /// A certificate or its public key could not be decoded
    InvalidCert = -3,
    /// No URL was available for the verifying thread
    NoUrlData = -5,
    /// The peer chain is empty or incomplete
    InvalidPeerCertChain = -6,
    /// Pin verification failed
    PubkeyMismatch = -7,
    /// A parameter was rejected
    InvalidParameter = -9,
    /// File or stream I/O failed
    Io = -10,
    /// Any other failure, including damaged preload data and caught panics
    Internal = -100,
}

impl ErrorCode {
    /// The raw integer value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ErrorCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::InvalidUrl(_) => ErrorCode::InvalidUrl,
            Error::NoUrlData => ErrorCode::NoUrlData,
            Error::InvalidCertificate(_) => ErrorCode::InvalidCert,
            Error::InvalidPeerCertChain(_) => ErrorCode::InvalidPeerCertChain,
            Error::PubkeyMismatch(_) => ErrorCode::PubkeyMismatch,
            Error::InvalidParameter(_) => ErrorCode::InvalidParameter,
            Error::FileError(_) => ErrorCode::Io,
            Error::Malformed { .. }
            | Error::OutOfBounds { .. }
            | Error::NotSupported
            | Error::Empty
            | Error::InternalError(_) => ErrorCode::Internal,
        }
    }
}
