// Copyright 2024 diskbar
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scale tags for byte counts and the conversion into the largest one that
//! still reads as at least one.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const DECIMAL_MAGNITUDE: f64 = 1000.0;
pub const B: f64 = 1.0;
pub const KB: f64 = B * DECIMAL_MAGNITUDE;
pub const MB: f64 = KB * DECIMAL_MAGNITUDE;
pub const GB: f64 = MB * DECIMAL_MAGNITUDE;
pub const TB: f64 = GB * DECIMAL_MAGNITUDE;
pub const PB: f64 = TB * DECIMAL_MAGNITUDE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
}

impl Unit {
    /// Every unit, ordered by multiplier.
    pub const ALL: [Unit; 6] = [Unit::B, Unit::KB, Unit::MB, Unit::GB, Unit::TB, Unit::PB];

    pub const fn smallest() -> Unit { Unit::B }

    pub const fn multiplier(self) -> f64 {
        match self {
            Unit::B => B,
            Unit::KB => KB,
            Unit::MB => MB,
            Unit::GB => GB,
            Unit::TB => TB,
            Unit::PB => PB,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Unit::B => "B",
            Unit::KB => "KB",
            Unit::MB => "MB",
            Unit::GB => "GB",
            Unit::TB => "TB",
            Unit::PB => "PB",
        }
    }

    /// Express `bytes` in this unit.
    pub fn scale(self, bytes: f64) -> f64 { bytes / self.multiplier() }
}

/// Convert a byte count into the largest unit in which it is still `>= 1`.
///
/// Anything below one byte, including zero, stays in [Unit::B]. Negative and
/// non-finite counts are treated as zero.
pub fn convert_to_largest_unit(bytes: f64) -> (f64, Unit) {
    let bytes = if bytes.is_finite() && bytes > 0.0 { bytes } else { 0.0 };
    let unit = Unit::ALL
        .iter()
        .rev()
        .copied()
        .find(|u| u.multiplier() <= bytes)
        .unwrap_or(Unit::smallest());
    (unit.scale(bytes), unit)
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Unit, String> {
        let tag = s.trim();
        Unit::ALL
            .iter()
            .copied()
            .find(|u| u.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("only B, KB, MB, GB, TB and PB are supported: {:?}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stays_in_bytes() {
        assert_eq!(convert_to_largest_unit(0.0), (0.0, Unit::B));
    }

    #[test]
    fn sub_byte_and_garbage_fall_back_to_bytes() {
        assert_eq!(convert_to_largest_unit(0.5).1, Unit::B);
        assert_eq!(convert_to_largest_unit(-12.0), (0.0, Unit::B));
        assert_eq!(convert_to_largest_unit(f64::NAN), (0.0, Unit::B));
    }

    #[test]
    fn picks_the_largest_unit_that_reads_as_one() {
        assert_eq!(convert_to_largest_unit(512.0), (512.0, Unit::B));
        assert_eq!(convert_to_largest_unit(999.0).1, Unit::B);
        assert_eq!(convert_to_largest_unit(1000.0), (1.0, Unit::KB));
        assert_eq!(convert_to_largest_unit(5_000_000_000.0), (5.0, Unit::GB));
        assert_eq!(convert_to_largest_unit(2.5e15), (2.5, Unit::PB));
        // nothing beyond PB, so huge values just grow.
        assert_eq!(convert_to_largest_unit(3e18), (3000.0, Unit::PB));
    }

    #[test]
    fn conversion_properties_hold_across_magnitudes() {
        let mut bytes = 1.0;
        while bytes < 1e19 {
            for b in [bytes, bytes * 1.5, bytes * 7.0] {
                let (v, u) = convert_to_largest_unit(b);
                assert!((v - b / u.multiplier()).abs() <= f64::EPSILON * v.max(1.0));
                if u != Unit::smallest() {
                    assert!(v >= 1.0, "{b} -> {v} {u}");
                }
                for larger in Unit::ALL.iter().filter(|l| **l > u) {
                    assert!(b / larger.multiplier() < 1.0, "{b} fits {larger} better than {u}");
                }
            }
            bytes *= 10.0;
        }
    }

    #[test]
    fn units_are_ordered_by_multiplier() {
        for pair in Unit::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].multiplier() < pair[1].multiplier());
        }
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("gb".parse::<Unit>().unwrap(), Unit::GB);
        assert_eq!(" KB ".parse::<Unit>().unwrap(), Unit::KB);
        assert!("GiB".parse::<Unit>().is_err());
        assert_eq!(Unit::TB.to_string(), "TB");
    }
}
