//! Decimal degrees ↔ degrees/minutes/seconds.

use crate::{GeoidError, C};
use std::{fmt, str::FromStr};

const SEC_PER_MIN: C = 60.0;
const ARCSEC_PER_DEG: C = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// Returns the sign of `value`. Zero, including `-0.0`, is
    /// positive.
    pub fn of(value: C) -> Self {
        if value >= 0.0 {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    pub fn factor(self) -> C {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// An angle in degrees, minutes and seconds.
///
/// The sign is held separately from `degrees` so that angles smaller
/// than one degree keep it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub sign: Sign,
    pub degrees: u32,
    pub minutes: u32,
    /// Always in `[0, 60)`.
    pub seconds: C,
}

impl Dms {
    pub fn to_decimal(&self) -> C {
        self.sign.factor()
            * (C::from(self.degrees)
                + C::from(self.minutes) / SEC_PER_MIN
                + self.seconds / ARCSEC_PER_DEG)
    }

    /// Returns this angle with its sign replaced by `hemisphere`'s.
    pub fn with_hemisphere(self, hemisphere: Hemisphere) -> Self {
        Self {
            sign: hemisphere.sign(),
            ..self
        }
    }
}

/// Splits finite `decimal` degrees into degrees, minutes and seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_dms(decimal: C) -> Dms {
    let sign = Sign::of(decimal);
    let total_seconds = decimal.abs() * ARCSEC_PER_DEG;
    // `%` is exact, so this is strictly below 60.
    let seconds = total_seconds % SEC_PER_MIN;
    let total_minutes = ((total_seconds - seconds) / SEC_PER_MIN).round() as u32;
    Dms {
        sign,
        degrees: total_minutes / 60,
        minutes: total_minutes % 60,
        seconds,
    }
}

/// Returns `sign × (|degrees| + minutes/60 + seconds/3600)`.
pub fn to_decimal(degrees: i32, minutes: u32, seconds: C, sign: Sign) -> C {
    Dms {
        sign,
        degrees: degrees.unsigned_abs(),
        minutes,
        seconds,
    }
    .to_decimal()
}

/// Seconds are rounded to the formatter's precision (default 3)
/// before splitting, so a rounded-up `60` carries into the minutes.
impl fmt::Display for Dms {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.sign {
            Sign::Positive => "",
            Sign::Negative => "-",
        };
        let precision = f.precision().unwrap_or(3);
        let scale = C::powi(10.0, precision.min(9) as i32);
        let total_seconds = ((C::from(self.degrees) * ARCSEC_PER_DEG
            + C::from(self.minutes) * SEC_PER_MIN
            + self.seconds)
            * scale)
            .round()
            / scale;
        let seconds = total_seconds % SEC_PER_MIN;
        let total_minutes = ((total_seconds - seconds) / SEC_PER_MIN).round() as u64;
        // Two integer digits, plus the point and fraction if any.
        let width = if precision == 0 { 2 } else { precision + 3 };
        write!(
            f,
            "{sign}{}°{:02}'{seconds:0width$.precision$}\"",
            total_minutes / 60,
            total_minutes % 60,
        )
    }
}

/// Parses `D°M'S"`, `D:M:S` or `D M S`, with an optional leading
/// sign or trailing hemisphere letter. Minutes and seconds may be
/// omitted.
impl FromStr for Dms {
    type Err = GeoidError;

    fn from_str(s: &str) -> Result<Self, GeoidError> {
        let mk_err = || GeoidError::InvalidDms(s.to_owned());
        let mut body = s.trim();

        let mut sign = None;
        if let Some(rest) = body.strip_prefix('-') {
            sign = Some(Sign::Negative);
            body = rest;
        } else if let Some(rest) = body.strip_prefix('+') {
            sign = Some(Sign::Positive);
            body = rest;
        }

        if let Some(last) = body.chars().last().filter(char::is_ascii_alphabetic) {
            let hemisphere: Hemisphere = last.to_string().parse().map_err(|_| mk_err())?;
            if sign.is_some() {
                return Err(mk_err());
            }
            sign = Some(hemisphere.sign());
            body = &body[..body.len() - 1];
        }

        let fields: Vec<&str> = body
            .split(|c: char| c.is_whitespace() || matches!(c, '°' | '\'' | '"' | ':'))
            .filter(|field| !field.is_empty())
            .collect();
        let (degrees, minutes, seconds) = match fields.as_slice() {
            [d] => (*d, "0", "0"),
            [d, m] => (*d, *m, "0"),
            [d, m, s] => (*d, *m, *s),
            _ => return Err(mk_err()),
        };
        let degrees = degrees.parse::<u32>().map_err(|_| mk_err())?;
        let minutes = minutes.parse::<u32>().map_err(|_| mk_err())?;
        let seconds = seconds.parse::<C>().map_err(|_| mk_err())?;
        if minutes >= 60 || !(0.0..SEC_PER_MIN).contains(&seconds) {
            return Err(mk_err());
        }

        Ok(Self {
            sign: sign.unwrap_or(Sign::Positive),
            degrees,
            minutes,
            seconds,
        })
    }
}

/// Which side of the equator or prime meridian an angle lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn sign(self) -> Sign {
        match self {
            Self::North | Self::East => Sign::Positive,
            Self::South | Self::West => Sign::Negative,
        }
    }

    /// Returns `true` for north and south.
    pub fn is_latitude(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    /// Returns the signed decimal degrees for an unsigned `magnitude`.
    pub fn apply(self, magnitude: C) -> C {
        self.sign().factor() * magnitude.abs()
    }
}

impl FromStr for Hemisphere {
    type Err = GeoidError;

    fn from_str(s: &str) -> Result<Self, GeoidError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Self::North),
            "s" | "south" => Ok(Self::South),
            "e" | "east" => Ok(Self::East),
            "w" | "west" => Ok(Self::West),
            _ => Err(GeoidError::InvalidHemisphere(s.to_owned())),
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::North => 'N',
            Self::South => 'S',
            Self::East => 'E',
            Self::West => 'W',
        };
        write!(f, "{c}")
    }
}
