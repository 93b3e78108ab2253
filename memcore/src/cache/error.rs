use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    NotFound = 0x01,
    KeyExists = 0x02,
    ValueTooLarge = 0x03,
    InvalidArguments = 0x04,
    ItemNotStored = 0x05,
    ArithOnNonNumeric = 0x06,
    OutOfMemory = 0x82,
    InternalError = 0x84,
}

impl CacheError {
    pub fn to_static_string(&self) -> &'static str {
        match self {
            CacheError::NotFound => "Not found",
            CacheError::KeyExists => "Key exists",
            CacheError::ValueTooLarge => "Value too big",
            CacheError::InvalidArguments => "Invalid arguments",
            CacheError::ItemNotStored => "Item not stored",
            CacheError::ArithOnNonNumeric => "Incr/Decr on non numeric value",
            CacheError::OutOfMemory => "Out of memory",
            CacheError::InternalError => "Internal error",
        }
    }

    /// Status code used by memcache binary protocol
    pub fn status_code(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_static_string())
    }
}

impl std::error::Error for CacheError {}

pub type Result<T> = std::result::Result<T, CacheError>;
