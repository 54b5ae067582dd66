use std::{fmt::Display, ops::Deref};

use serde::Serialize;

/// Share of a rolling window, in the 0..=100 range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Percentage {
    #[cfg(test)]
    pub(crate) fn new_opt(value: f64) -> Option<Percentage> {
        if (0. ..=100.).contains(&value) {
            Some(Percentage(value))
        } else {
            None
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// `count` out of `whole` as a percentage. An empty whole counts as 0%.
pub fn ratio_percentage(count: usize, whole: usize) -> Percentage {
    if whole == 0 {
        return Percentage(0.);
    }
    Percentage((count.min(whole) as f64 / whole as f64) * 100.)
}

#[cfg(test)]
mod tests {
    use super::{ratio_percentage, Percentage};

    #[test]
    fn test_ratio_percentage() {
        assert_eq!(*ratio_percentage(1, 4), 25.);
        assert_eq!(*ratio_percentage(0, 0), 0.);
        assert_eq!(ratio_percentage(1, 7).to_string(), "14.3%");
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new_opt(-1.).is_none());
        assert!(Percentage::new_opt(100.5).is_none());
        assert!(Percentage::new_opt(42.).is_some());
    }
}
