use rand::Rng;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl NetworkStats {
    pub fn record_sent(&mut self, bytes: usize) {
        self.packets_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub fn record_received(&mut self, bytes: usize) {
        self.packets_received += 1;
        self.bytes_received += bytes as u64;
    }

    pub fn record_dropped(&mut self) {
        self.packets_dropped += 1;
    }
}

/// Impairments applied to datagrams crossing an in-memory link.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinkConditions {
    pub enabled: bool,
    pub loss_percent: f32,
    pub duplicate_percent: f32,
}

impl LinkConditions {
    pub fn lossy(loss_percent: f32) -> Self {
        Self {
            enabled: true,
            loss_percent,
            duplicate_percent: 0.0,
        }
    }

    pub fn should_drop(&self) -> bool {
        self.enabled && roll(self.loss_percent)
    }

    pub fn should_duplicate(&self) -> bool {
        self.enabled && roll(self.duplicate_percent)
    }
}

fn roll(percent: f32) -> bool {
    if percent <= 0.0 {
        return false;
    }
    rand::thread_rng().gen_range(0.0..100.0) < percent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_link_is_perfect() {
        let conditions = LinkConditions {
            enabled: false,
            loss_percent: 100.0,
            duplicate_percent: 100.0,
        };
        assert!(!conditions.should_drop());
        assert!(!conditions.should_duplicate());
    }

    #[test]
    fn certain_loss_always_drops() {
        let conditions = LinkConditions::lossy(100.0);
        assert!((0..32).all(|_| conditions.should_drop()));
        assert!(!conditions.should_duplicate());
    }
}
