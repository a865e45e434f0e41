use serde::{Deserialize, Serialize};

/// Progress in thousandths.
///
/// `0` means the operation failed, `1000` that it finished; everything in
/// between is an intermediate stage.
///
/// 进度千分比：0 表示失败，1000 表示完成。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permille(u16);

impl Permille {
    pub const FAILED: Permille = Permille(0);
    pub const DONE: Permille = Permille(1000);

    /// Returns `None` for values above 1000.
    pub fn new(value: u16) -> Option<Self> {
        (value <= 1000).then_some(Self(value))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn percent(self) -> u16 {
        self.0 / 10
    }

    pub fn is_failure(self) -> bool {
        self.0 == 0
    }

    pub fn is_done(self) -> bool {
        self.0 == 1000
    }
}

impl std::fmt::Display for Permille {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}‰", self.0)
    }
}

impl TryFrom<u16> for Permille {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_above_thousand() {
        assert!(Permille::new(1001).is_none());
        assert_eq!(Permille::try_from(1000), Ok(Permille::DONE));
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(Permille::new(999).unwrap().percent(), 99);
        assert_eq!(Permille::new(400).unwrap().percent(), 40);
    }
}
