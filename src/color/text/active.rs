use crate::color::format::ColorFormat;
use crate::store::{Readable, SettableStore, Unsubscribe, WritableStore};

/// Which format the text input currently shows.
#[derive(Debug, Clone)]
pub struct ActiveTextState {
    mode: WritableStore<ColorFormat>,
}

impl ActiveTextState {
    pub fn new(initial: ColorFormat) -> Self {
        Self {
            mode: WritableStore::new(initial),
        }
    }

    pub fn mode(&self) -> ColorFormat {
        self.mode.get()
    }

    pub fn set_mode(&self, format: ColorFormat) {
        self.mode.set(format);
    }

    /// Cycle forward through [`ColorFormat::ALL`].
    pub fn next(&self) -> ColorFormat {
        self.step(1)
    }

    pub fn previous(&self) -> ColorFormat {
        self.step(ColorFormat::ALL.len() - 1)
    }

    fn step(&self, offset: usize) -> ColorFormat {
        let all = ColorFormat::ALL;
        let current = all.iter().position(|f| *f == self.mode()).unwrap_or(0);
        let next = all[(current + offset) % all.len()];
        self.mode.set(next);
        next
    }
}

impl Readable<ColorFormat> for ActiveTextState {
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&ColorFormat) + Send + Sync + 'static,
    {
        self.mode.subscribe(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_both_ways() {
        let active = ActiveTextState::new(ColorFormat::Hex);
        assert_eq!(active.next(), ColorFormat::Hsl);
        assert_eq!(active.next(), ColorFormat::Hsv);
        assert_eq!(active.next(), ColorFormat::Rgb);
        assert_eq!(active.next(), ColorFormat::Hex);
        assert_eq!(active.previous(), ColorFormat::Rgb);

        active.set_mode(ColorFormat::Hsl);
        assert_eq!(active.mode(), ColorFormat::Hsl);
    }
}
