//! Bounding box requested through the `/scale/{size}` path segment

use firecache_core::AppError;
use std::fmt;

/// Maximum width and height of a scaled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleSize {
    pub width: u32,
    pub height: u32,
}

impl ScaleSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse `N` (an `N`x`N` box) or `WxH`.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let (width, height) = match s.split_once('x') {
            Some((w, h)) => (parse_dimension(w, s)?, parse_dimension(h, s)?),
            None => {
                let n = parse_dimension(s, s)?;
                (n, n)
            }
        };
        Ok(Self { width, height })
    }
}

fn parse_dimension(value: &str, whole: &str) -> Result<u32, AppError> {
    // u32::from_str accepts a leading '+', sizes are digits only.
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "Invalid size '{}': expected N or WIDTHxHEIGHT",
            whole
        )));
    }
    let n = value
        .parse::<u32>()
        .map_err(|_| AppError::BadRequest(format!("Size '{}' is out of range", whole)))?;
    if n == 0 {
        return Err(AppError::BadRequest(format!(
            "Invalid size '{}': dimensions must be positive",
            whole
        )));
    }
    Ok(n)
}

impl fmt::Display for ScaleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
