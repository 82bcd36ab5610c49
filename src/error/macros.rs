//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::GeoAiError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GeoAiError::config(format!($fmt, $($arg)*))
    };
}

/// 快速创建参数验证错误的宏，第一个参数为字段名
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $msg:expr) => {
        $crate::error::GeoAiError::validation($msg, Some($field))
    };
    ($field:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::GeoAiError::validation(format!($fmt, $($arg)*), Some($field))
    };
}

/// 确保条件成立，否则返回配置错误
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::config_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::config_error!($fmt, $($arg)*));
        }
    };
}

/// 确保条件成立，否则返回参数验证错误
#[macro_export]
macro_rules! ensure_valid {
    ($cond:expr, $field:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::validation_error!($field, $msg));
        }
    };
    ($cond:expr, $field:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::validation_error!($field, $fmt, $($arg)*));
        }
    };
}
