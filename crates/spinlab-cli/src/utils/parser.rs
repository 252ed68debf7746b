use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid pulse '{0}'. Expected 'AT:ANGLE' in seconds and degrees (e.g., '0.5:90').")]
    InvalidPulseFormat(String),

    #[error("Invalid time '{0}'. Expected a non-negative number of seconds.")]
    InvalidTime(String),

    #[error("Invalid angle '{0}'. Expected a finite number of degrees.")]
    InvalidAngle(String),
}

/// Parses a non-negative, finite time in seconds.
pub fn parse_time(s: &str) -> Result<f64, ParseError> {
    match s.trim().parse::<f64>() {
        Ok(t) if t.is_finite() && t >= 0.0 => Ok(t),
        _ => Err(ParseError::InvalidTime(s.to_string())),
    }
}

/// Parses `AT:ANGLE` into `(seconds, degrees)`.
pub fn parse_pulse(s: &str) -> Result<(f64, f64), ParseError> {
    let (at, angle) = s
        .split_once(':')
        .ok_or_else(|| ParseError::InvalidPulseFormat(s.to_string()))?;
    let at = parse_time(at)?;
    let angle = match angle.trim().parse::<f64>() {
        Ok(a) if a.is_finite() => a,
        _ => return Err(ParseError::InvalidAngle(angle.to_string())),
    };
    Ok((at, angle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_pulse() {
        assert_eq!(parse_pulse("0.5:90"), Ok((0.5, 90.0)));
        assert_eq!(parse_pulse(" 2 : -45.5 "), Ok((2.0, -45.5)));
    }

    #[test]
    fn pulse_without_separator_is_rejected() {
        assert_eq!(
            parse_pulse("90"),
            Err(ParseError::InvalidPulseFormat("90".to_string()))
        );
    }

    #[test]
    fn pulse_with_bad_components_is_rejected() {
        assert_eq!(
            parse_pulse("-1:90"),
            Err(ParseError::InvalidTime("-1".to_string()))
        );
        assert_eq!(
            parse_pulse("1:inf"),
            Err(ParseError::InvalidAngle("inf".to_string()))
        );
        assert_eq!(
            parse_pulse("1:"),
            Err(ParseError::InvalidAngle("".to_string()))
        );
    }

    #[test]
    fn parses_times() {
        assert_eq!(parse_time("0"), Ok(0.0));
        assert_eq!(parse_time("3.25"), Ok(3.25));
        assert!(parse_time("NaN").is_err());
        assert!(parse_time("soon").is_err());
    }
}
