macro_rules! corrupt {
    ($offset:expr, $e:expr) => {
        return Err($crate::error::Error::CorruptFormat {
            offset: $offset,
            reason: ::std::string::String::from($e),
        })
    };
    ($offset:expr, $fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::CorruptFormat {
            offset: $offset,
            reason: format!($fmt, $($arg)+),
        })
    };
}
