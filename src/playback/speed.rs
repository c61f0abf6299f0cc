// Selectable playback speeds

/// The four rate multipliers offered next to the Play button, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackSpeed {
    Half,
    Slow,
    #[default]
    Normal,
    Fast,
}

pub const SPEED_OPTIONS: [PlaybackSpeed; 4] = [
    PlaybackSpeed::Half,
    PlaybackSpeed::Slow,
    PlaybackSpeed::Normal,
    PlaybackSpeed::Fast,
];

impl PlaybackSpeed {
    /// Position in the option list: 0 → 0.5x, 1 → 0.8x, 2 → 1.0x, 3 → 1.25x
    pub fn from_index(index: usize) -> Option<Self> {
        SPEED_OPTIONS.get(index).copied()
    }

    /// Resolve the current selection, falling back to 1.0x when nothing is selected
    pub fn resolve(selected: Option<usize>) -> Self {
        selected.and_then(Self::from_index).unwrap_or_default()
    }

    pub fn index(self) -> usize {
        match self {
            PlaybackSpeed::Half => 0,
            PlaybackSpeed::Slow => 1,
            PlaybackSpeed::Normal => 2,
            PlaybackSpeed::Fast => 3,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Slow => 0.8,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Fast => 1.25,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackSpeed::Half => "0.5x",
            PlaybackSpeed::Slow => "0.8x",
            PlaybackSpeed::Normal => "1.0x",
            PlaybackSpeed::Fast => "1.25x",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_maps_to_multiplier() {
        let rates: Vec<f64> = (0..4)
            .map(|i| PlaybackSpeed::from_index(i).unwrap().multiplier())
            .collect();
        assert_eq!(rates, vec![0.5, 0.8, 1.0, 1.25]);
        assert_eq!(PlaybackSpeed::from_index(4), None);
    }

    #[test]
    fn missing_selection_defaults_to_normal() {
        assert_eq!(PlaybackSpeed::resolve(None), PlaybackSpeed::Normal);
        assert_eq!(PlaybackSpeed::resolve(Some(9)), PlaybackSpeed::Normal);
        assert_eq!(PlaybackSpeed::resolve(Some(0)), PlaybackSpeed::Half);
    }

    #[test]
    fn index_round_trips() {
        for speed in SPEED_OPTIONS {
            assert_eq!(PlaybackSpeed::from_index(speed.index()), Some(speed));
        }
    }
}
