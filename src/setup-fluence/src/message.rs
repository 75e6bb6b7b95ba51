//! A collection of macros for printing messages to the CI job log.
//!
//! Warnings, errors and debug lines are written as runner workflow commands so they show up as
//! annotations; the message text is escaped with [`escape_data`] so multi-line causes stay inside
//! a single annotation.

/// Escapes a message for use as workflow command data.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[macro_export]
macro_rules! success_message {
    ($($arg:tt)*) => {
        {
            use $crate::Colorize;
            println!("{} {}", "[SUCCESS]".green().bold(), format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! info_message {
    ($($arg:tt)*) => {
        {
            use $crate::Colorize;
            println!("{} {}", "   [INFO]".cyan().bold(), format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! warning_message {
    ($($arg:tt)*) => {
        {
            println!("::warning::{}", $crate::message::escape_data(&format!($($arg)*)));
        }
    };
}

#[macro_export]
macro_rules! error_message {
    ($($arg:tt)*) => {
        {
            println!("::error::{}", $crate::message::escape_data(&format!($($arg)*)));
        }
    };
}

#[macro_export]
macro_rules! debug_message {
    ($($arg:tt)*) => {
        {
            println!("::debug::{}", $crate::message::escape_data(&format!($($arg)*)));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::escape_data;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("plain"), "plain");
        assert_eq!(escape_data("50%\r\ndone"), "50%25%0D%0Adone");
    }
}
