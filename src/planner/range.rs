use std::fmt;

use serde::{Deserialize, Serialize};

/// 闭区间 `[min, max]`，用于金额、延迟、gas 等实数配置。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct NumberRange {
    min: f64,
    max: f64,
}

impl NumberRange {
    pub fn new(min: f64, max: f64) -> Result<Self, RangeError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(RangeError::NotFinite);
        }
        if min > max {
            return Err(RangeError::Inverted {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(Self { min, max })
    }

    pub const fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub const fn zero() -> Self {
        Self::fixed(0.0)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_zero(&self) -> bool {
        self.min == 0.0 && self.max == 0.0
    }
}

impl Default for NumberRange {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<[f64; 2]> for NumberRange {
    type Error = RangeError;

    fn try_from(value: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1])
    }
}

impl From<NumberRange> for [f64; 2] {
    fn from(value: NumberRange) -> Self {
        [value.min, value.max]
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// 整数闭区间，用于重复次数、分组上限与路线模块数上限。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct CountRange {
    min: u32,
    max: u32,
}

impl CountRange {
    pub fn new(min: u32, max: u32) -> Result<Self, RangeError> {
        if min > max {
            return Err(RangeError::Inverted {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(Self { min, max })
    }

    pub const fn fixed(value: u32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub const fn once() -> Self {
        Self::fixed(1)
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// 仅当两端都为 0 时才视为关闭；`[0, 3]` 这类包含 0 的区间仍然生效。
    pub fn is_disabled(&self) -> bool {
        self.min == 0 && self.max == 0
    }
}

impl Default for CountRange {
    fn default() -> Self {
        Self::fixed(0)
    }
}

impl TryFrom<[u32; 2]> for CountRange {
    type Error = RangeError;

    fn try_from(value: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1])
    }
}

impl From<CountRange> for [u32; 2] {
    fn from(value: CountRange) -> Self {
        [value.min, value.max]
    }
}

impl fmt::Display for CountRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range lower bound {min} is greater than upper bound {max}")]
    Inverted { min: String, max: String },
    #[error("range bounds must be finite numbers")]
    NotFinite,
}
