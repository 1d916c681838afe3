use std::path::PathBuf;

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

/// The generic Error type, which covers all errors this library can return.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::ModuleNotFound`] - The module path does not point at a file
///
/// ## Loading Errors
/// - [`Error::Malformed`] - Corrupted or invalid module structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the module boundaries
/// - [`Error::NotSupported`] - Not a .NET module, or an unsupported metadata feature
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::GoblinErr`] - PE parsing errors from goblin
/// - [`Error::RecursionLimit`] - Signature nesting exceeded the allowed depth
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust,no_run
/// use typedump::{loader::CilProvider, Dumper, Error, Filters};
/// use std::path::Path;
///
/// let dumper = Dumper::new(CilProvider::default(), "Parsed/Game");
/// match dumper.run(Path::new("Managed/Assembly-CSharp.dll"), &Filters::default()) {
///     Ok(summary) => println!("{} pages", summary.pages_written),
///     Err(Error::ModuleNotFound(path)) => eprintln!("{} not found", path.display()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed module: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The module path given to the pipeline does not exist or is not a file.
    ///
    /// Raised before the provider is consulted; no output is produced.
    #[error("{} not found", .0.display())]
    ModuleNotFound(PathBuf),

    /// The module is damaged and could not be parsed.
    ///
    /// Includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the module.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type or metadata feature is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Recursion limit reached while decoding a signature.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
