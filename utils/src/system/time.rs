use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

pub fn get_timestamp_ms() -> Result<u128, SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis())
}

pub fn get_timestamp_ns() -> Result<u128, SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos())
}
