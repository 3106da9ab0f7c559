use qnet::LinkConditions;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub duration_secs: f64,
    pub bots: usize,
    pub agents: usize,
    pub shot_interval_secs: f64,
    pub downlink: LinkConditions,
    pub uplink: LinkConditions,
    pub seed: u64,
    pub realtime: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            bots: 2,
            agents: 1,
            shot_interval_secs: 0.5,
            downlink: LinkConditions::fixed_latency(50),
            uplink: LinkConditions::fixed_latency(50),
            seed: 1,
            realtime: false,
        }
    }
}
