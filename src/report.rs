//! Diagnostic output

/// Severity of a message emitted by `report!`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Diagnostic {
    /// Convergence traces, printed only in verbose mode.
    Trace,
    Info,
    Warning,
}

/// Prints a tagged diagnostic to stderr if `$cond` holds, e.g.
/// ```ignore
/// report!(Diagnostic::Warning, true, "dr did not converge for n_dr = {}", n_dr);
/// ```
#[macro_export]
macro_rules! report {
    ($diagnostic:expr, $cond:expr, $($arg:tt)*) => {
        if $cond {
            use colored::Colorize;
            let tag = match $diagnostic {
                $crate::report::Diagnostic::Trace => "trace".dimmed(),
                $crate::report::Diagnostic::Info => "info".bold().cyan(),
                $crate::report::Diagnostic::Warning => "warning".bold().yellow(),
            };
            eprintln!("{}: {}", tag, format!($($arg)*));
        }
    };
}
