/// Writes one tagged, coloured line. `err` routes the line to stderr.
#[doc(hidden)]
#[macro_export]
macro_rules! emit {
    (out, $colour:literal, $tag:literal, $($arg:tt)*) => {
        println!(concat!("\x1b[", $colour, "m[", $tag, "][{}]\x1b[0m {}"), chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
    (err, $colour:literal, $tag:literal, $($arg:tt)*) => {
        eprintln!(concat!("\x1b[", $colour, "m[", $tag, "][{}]\x1b[0m {}"), chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::emit!(out, "32", "INFO ", $($arg)*) };
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => { $crate::emit!(out, "33", "LOG  ", $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::emit!(out, "35", "WARN ", $($arg)*) };
}

/// Writes to stderr; stdout may carry the planning JSON.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::emit!(err, "31", "ERROR", $($arg)*) };
}

/// Banner for the start of a planning stage.
#[macro_export]
macro_rules! stage {
    ($($arg:tt)*) => { $crate::emit!(out, "1;34", "STAGE", $($arg)*) };
}

/// Per-sample and per-provider-call traffic. Only printed when `LOG_MTP_EVENTS` is set.
#[macro_export]
macro_rules! event {
    ($($arg:tt)*) => {
        if std::env::var_os("LOG_MTP_EVENTS").is_some() {
            $crate::emit!(out, "36", "EVENT", $($arg)*)
        }
    };
}
