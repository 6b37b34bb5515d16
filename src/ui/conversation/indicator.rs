/// Animated "thinking" text shown in place of a pending answer
#[derive(Debug, Clone, Default)]
pub struct ThinkingIndicator {
    frame: usize,
}

impl ThinkingIndicator {
    pub const LABEL: &'static str = "Thinking";

    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one animation frame
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }

    pub fn text(&self) -> String {
        let dots = match self.frame % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        };
        format!("{}{}", Self::LABEL, dots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_dots() {
        let mut indicator = ThinkingIndicator::new();
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(indicator.text());
            indicator.tick();
        }
        assert_eq!(seen, ["Thinking.", "Thinking..", "Thinking...", "Thinking   ", "Thinking."]);

        indicator.reset();
        assert_eq!(indicator.text(), "Thinking.");
    }
}
