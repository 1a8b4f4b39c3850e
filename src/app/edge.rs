//! Light-input edge detection.

/// Direction of a light-input transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Remembers the previous light level and reports changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    /// Seed with the level observed at startup so the first tick does not
    /// report a spurious edge.
    pub fn new(initial: bool) -> Self {
        Self { previous: initial }
    }

    /// Compare against the stored level, then store `current`.
    pub fn update(&mut self, current: bool) -> Option<Edge> {
        if current == self.previous {
            return None;
        }
        self.previous = current;
        Some(if current { Edge::Rising } else { Edge::Falling })
    }

    pub fn previous(&self) -> bool {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_transitions_give_two_edges() {
        let mut d = EdgeDetector::new(false);
        let edges: Vec<_> = [false, false, true, true, false]
            .into_iter()
            .filter_map(|level| d.update(level))
            .collect();
        assert_eq!(edges, vec![Edge::Rising, Edge::Falling]);
    }

    #[test]
    fn seeded_level_suppresses_first_edge() {
        let mut d = EdgeDetector::new(true);
        assert_eq!(d.update(true), None);
        assert_eq!(d.update(false), Some(Edge::Falling));
        assert!(!d.previous());
    }
}
