use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

pub fn http_host() -> IpAddr {
    env::var("SYNC_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn http_port() -> u16 {
    env::var("SYNC_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn tick_interval() -> Duration {
    tick_interval_from(env::var("TICK_RATE_HZ").ok().as_deref())
}

fn tick_interval_from(value: Option<&str>) -> Duration {
    let hz = value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|hz| *hz > 0)
        .unwrap_or(DEFAULT_TICK_RATE_HZ);
    Duration::from_secs(1) / hz
}
